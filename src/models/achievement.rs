// ABOUTME: Achievement catalog definitions and per-user unlock records
// ABOUTME: Unlocks are unique per (user, achievement) and created at most once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A definition in the achievement catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub id: Uuid,
    /// Stable unique code, e.g. `FIRST_WORKOUT`
    pub code: String,
    pub name: String,
    pub description: String,
    /// Icon hint for the display collaborator, e.g. "trophy"
    pub icon: String,
    /// Grouping, e.g. "workout", "xp", "creator"
    pub category: String,
    /// XP granted on unlock; 0 for achievements that must not feed the ledger
    pub xp_reward: i64,
    pub sort_order: i32,
    pub is_active: bool,
}

/// One user's unlock of one achievement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAchievement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub unlocked_at: DateTime<Utc>,
    /// Whether the unlock notification has been surfaced to the user
    pub seen: bool,
}

impl UserAchievement {
    /// Build an unseen unlock record stamped now
    #[must_use]
    pub fn new(user_id: Uuid, achievement_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            achievement_id,
            unlocked_at: Utc::now(),
            seen: false,
        }
    }
}

/// A freshly unlocked achievement, returned to callers for UI surfacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub code: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub xp_reward: i64,
    pub unlocked_at: DateTime<Utc>,
}

/// Catalog entry combined with one user's unlock state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}
