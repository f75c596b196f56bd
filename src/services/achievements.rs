// ABOUTME: Achievement evaluator: threshold checks with one-time unlock side effects
// ABOUTME: Counters are re-derived from source-of-truth aggregates on every trigger
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

use crate::constants::achievements::{
    LIFETIME_XP_THRESHOLDS, ROUTINE_COUNT_THRESHOLDS, WORKOUT_COUNT_THRESHOLDS,
};
use crate::database::{self, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{
    AchievementStatus, SessionStatus, UnlockedAchievement, UserAchievement, XpEventType,
};
use crate::services::xp_ledger;

/// Threshold checks that grant bonus XP on unlock.
///
/// Safe to invoke repeatedly after every qualifying event: counters are
/// re-derived from persisted aggregates and already-unlocked codes are
/// silently skipped, so no external deduplication is needed.
#[derive(Clone)]
pub struct AchievementEvaluator {
    db: Database,
}

impl AchievementEvaluator {
    /// Create a new evaluator over the given database
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Attempt a single unlock by code. Returns the unlock record if it
    /// fired, `None` if the user already had it or the code is unknown.
    ///
    /// # Errors
    ///
    /// Returns a database error if the transaction fails
    pub async fn try_unlock(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> AppResult<Option<UnlockedAchievement>> {
        let mut tx = self.db.pool().begin().await?;
        let unlocked = try_unlock_tx(&mut tx, user_id, code).await?;
        tx.commit().await?;
        Ok(unlocked)
    }

    /// Attempt every workout-count and lifetime-XP threshold currently met.
    /// Hosts call this after a session completes.
    ///
    /// # Errors
    ///
    /// Returns a database error if the transaction fails
    pub async fn evaluate_workout_achievements(
        &self,
        user_id: Uuid,
    ) -> AppResult<Vec<UnlockedAchievement>> {
        let mut tx = self.db.pool().begin().await?;
        let mut unlocked = check_workout_achievements(&mut tx, user_id).await?;
        unlocked.extend(check_xp_achievements(&mut tx, user_id).await?);
        tx.commit().await?;
        Ok(unlocked)
    }

    /// Attempt the routines-created thresholds. The routine collaborator
    /// calls this after an author saves a template.
    ///
    /// # Errors
    ///
    /// Returns a database error if the transaction fails
    pub async fn on_routine_created(&self, user_id: Uuid) -> AppResult<Vec<UnlockedAchievement>> {
        let mut tx = self.db.pool().begin().await?;
        let unlocked = check_routine_achievements(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(unlocked)
    }

    /// Full catalog with this user's unlock state, in display order
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<AchievementStatus>> {
        Ok(self.db.list_achievements_for_user(user_id).await?)
    }

    /// Unlocks not yet surfaced to the user, newest first
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn unseen_for_user(&self, user_id: Uuid) -> AppResult<Vec<UnlockedAchievement>> {
        Ok(self.db.list_unseen_achievements(user_id).await?)
    }

    /// Mark unlock notifications as surfaced
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails
    pub async fn mark_seen(&self, user_id: Uuid, codes: &[String]) -> AppResult<()> {
        Ok(self.db.mark_achievements_seen(user_id, codes).await?)
    }
}

/// Attempt one unlock inside an existing transaction.
///
/// The unique (user, achievement) row is the one-time guard: if it already
/// exists nothing happens, otherwise the record is inserted and any reward
/// XP is granted in the same transaction.
pub(crate) async fn try_unlock_tx(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    code: &str,
) -> AppResult<Option<UnlockedAchievement>> {
    let Some(achievement) = database::achievements::get_achievement_by_code(conn, code).await?
    else {
        return Ok(None);
    };

    if database::achievements::unlock_exists(conn, user_id, achievement.id).await? {
        return Ok(None);
    }

    let unlock = UserAchievement::new(user_id, achievement.id);
    database::achievements::insert_unlock(conn, &unlock).await?;

    if achievement.xp_reward > 0 {
        xp_ledger::grant_xp_tx(
            conn,
            user_id,
            achievement.xp_reward,
            XpEventType::AchievementUnlocked,
            &format!("Achievement unlocked: {}", achievement.name),
        )
        .await?;
    }

    info!(%user_id, code, "achievement unlocked");

    Ok(Some(UnlockedAchievement {
        code: achievement.code,
        name: achievement.name,
        description: achievement.description,
        icon: achievement.icon,
        xp_reward: achievement.xp_reward,
        unlocked_at: unlock.unlocked_at,
    }))
}

/// Attempt every workout-count threshold currently met
pub(crate) async fn check_workout_achievements(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> AppResult<Vec<UnlockedAchievement>> {
    let completed =
        database::workouts::count_sessions_with_status(conn, user_id, SessionStatus::Completed)
            .await?;

    let mut unlocked = Vec::new();
    for (threshold, code) in WORKOUT_COUNT_THRESHOLDS {
        if completed >= *threshold {
            if let Some(achievement) = try_unlock_tx(conn, user_id, code).await? {
                unlocked.push(achievement);
            }
        }
    }
    Ok(unlocked)
}

/// Attempt every routines-created threshold currently met
pub(crate) async fn check_routine_achievements(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> AppResult<Vec<UnlockedAchievement>> {
    let created = database::templates::count_templates_created_by(conn, user_id).await?;

    let mut unlocked = Vec::new();
    for (threshold, code) in ROUTINE_COUNT_THRESHOLDS {
        if created >= *threshold {
            if let Some(achievement) = try_unlock_tx(conn, user_id, code).await? {
                unlocked.push(achievement);
            }
        }
    }
    Ok(unlocked)
}

/// Attempt every lifetime-XP threshold currently met
pub(crate) async fn check_xp_achievements(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> AppResult<Vec<UnlockedAchievement>> {
    let user = database::users::get_user(conn, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let mut unlocked = Vec::new();
    for (threshold, code) in LIFETIME_XP_THRESHOLDS {
        if user.lifetime_xp >= *threshold {
            if let Some(achievement) = try_unlock_tx(conn, user_id, code).await? {
                unlocked.push(achievement);
            }
        }
    }
    Ok(unlocked)
}
