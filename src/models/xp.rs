// ABOUTME: Append-only XP ledger event model and event type taxonomy
// ABOUTME: Events are immutable once created; balances are derived sums
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Why an XP delta was posted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum XpEventType {
    /// A workout session reached full completion
    WorkoutCompleted,
    /// An achievement with a reward was unlocked
    AchievementUnlocked,
    /// A routine was purchased with XP (negative delta)
    RoutinePurchase,
    /// Admin or test adjustment
    ManualAdjustment,
}

impl XpEventType {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WorkoutCompleted => "WORKOUT_COMPLETED",
            Self::AchievementUnlocked => "ACHIEVEMENT_UNLOCKED",
            Self::RoutinePurchase => "ROUTINE_PURCHASE",
            Self::ManualAdjustment => "MANUAL_ADJUSTMENT",
        }
    }
}

impl FromStr for XpEventType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WORKOUT_COMPLETED" => Ok(Self::WorkoutCompleted),
            "ACHIEVEMENT_UNLOCKED" => Ok(Self::AchievementUnlocked),
            "ROUTINE_PURCHASE" => Ok(Self::RoutinePurchase),
            "MANUAL_ADJUSTMENT" => Ok(Self::ManualAdjustment),
            _ => Err(AppError::invalid_argument(format!(
                "Invalid XP event type: {s}"
            ))),
        }
    }
}

/// One immutable entry in a user's XP ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Signed XP delta; positive for grants, negative for spends
    pub delta: i64,
    pub event_type: XpEventType,
    pub description: Option<String>,
    /// Optional reference to the entity that caused the event, e.g. the
    /// purchased template
    pub reference_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl XpEvent {
    /// Build a new ledger entry stamped now
    #[must_use]
    pub fn new(
        user_id: Uuid,
        delta: i64,
        event_type: XpEventType,
        description: Option<String>,
        reference_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            delta,
            event_type,
            description,
            reference_id,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_round_trip() {
        for ty in [
            XpEventType::WorkoutCompleted,
            XpEventType::AchievementUnlocked,
            XpEventType::RoutinePurchase,
            XpEventType::ManualAdjustment,
        ] {
            assert_eq!(ty.as_str().parse::<XpEventType>().unwrap(), ty);
        }
    }
}
