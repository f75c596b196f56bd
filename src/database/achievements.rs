// ABOUTME: Achievement catalog persistence, seeding, and per-user unlock records
// ABOUTME: A unique (user, achievement) constraint backs the at-most-once unlock rule
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use super::Database;
use crate::constants::achievements as codes;
use crate::models::{Achievement, AchievementStatus, UnlockedAchievement, UserAchievement};
use anyhow::Result;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

impl Database {
    /// Create the achievement tables
    pub(super) async fn migrate_achievements(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS achievements (
                id TEXT PRIMARY KEY,
                code TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                icon TEXT NOT NULL,
                category TEXT NOT NULL,
                xp_reward INTEGER NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_achievements (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                achievement_id TEXT NOT NULL REFERENCES achievements(id),
                unlocked_at DATETIME NOT NULL,
                seen INTEGER NOT NULL DEFAULT 0,
                UNIQUE (user_id, achievement_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_user_achievements_user ON user_achievements(user_id, unlocked_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Seed the standard achievement catalog if the table is empty
    ///
    /// # Errors
    ///
    /// Returns an error if the count query or an insert fails
    pub async fn seed_achievements(&self) -> Result<()> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM achievements")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(());
        }

        // (code, name, description, icon, category, xp_reward, sort_order)
        let catalog: &[(&str, &str, &str, &str, &str, i64, i32)] = &[
            (
                codes::FIRST_WORKOUT,
                "First Workout",
                "Complete your first workout",
                "trophy",
                "workout",
                50,
                1,
            ),
            (
                codes::TEN_WORKOUTS,
                "10 Workouts",
                "Complete 10 workouts",
                "medal",
                "workout",
                100,
                2,
            ),
            (
                codes::TWENTY_FIVE_WORKOUTS,
                "25 Workouts",
                "Complete 25 workouts",
                "medal",
                "workout",
                200,
                3,
            ),
            (
                codes::FIFTY_WORKOUTS,
                "50 Workouts",
                "Complete 50 workouts",
                "star",
                "workout",
                500,
                4,
            ),
            (
                codes::HUNDRED_WORKOUTS,
                "100 Workouts",
                "Complete 100 workouts. Unstoppable!",
                "crown",
                "workout",
                1000,
                5,
            ),
            (
                codes::FIRST_ROUTINE_CREATED,
                "Creator",
                "Create your first custom routine",
                "pencil",
                "creator",
                75,
                10,
            ),
            // XP achievements grant no reward so they cannot feed themselves
            (
                codes::XP_1000,
                "1,000 XP",
                "Accumulate 1,000 lifetime XP",
                "bolt",
                "xp",
                0,
                20,
            ),
            (
                codes::XP_5000,
                "5,000 XP",
                "Accumulate 5,000 lifetime XP",
                "bolt",
                "xp",
                0,
                21,
            ),
            (
                codes::XP_10000,
                "10,000 XP",
                "Accumulate 10,000 lifetime XP. Legend!",
                "fire",
                "xp",
                0,
                22,
            ),
        ];

        let mut tx = self.pool.begin().await?;
        for (code, name, description, icon, category, xp_reward, sort_order) in catalog {
            sqlx::query(
                r"
                INSERT INTO achievements (id, code, name, description, icon, category, xp_reward, sort_order, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1)
                ",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(code)
            .bind(name)
            .bind(description)
            .bind(icon)
            .bind(category)
            .bind(xp_reward)
            .bind(sort_order)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!(count = catalog.len(), "seeded achievement catalog");
        Ok(())
    }

    /// Full catalog with one user's unlock state, in display order
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_achievements_for_user(&self, user_id: Uuid) -> Result<Vec<AchievementStatus>> {
        let rows = sqlx::query(
            r"
            SELECT a.id, a.code, a.name, a.description, a.icon, a.category,
                   a.xp_reward, a.sort_order, a.is_active, ua.unlocked_at
            FROM achievements a
            LEFT JOIN user_achievements ua
                   ON ua.achievement_id = a.id AND ua.user_id = $1
            WHERE a.is_active = 1
            ORDER BY a.sort_order ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let unlocked_at: Option<chrono::DateTime<chrono::Utc>> = row.get("unlocked_at");
                Ok(AchievementStatus {
                    achievement: row_to_achievement(row)?,
                    unlocked: unlocked_at.is_some(),
                    unlocked_at,
                })
            })
            .collect()
    }

    /// Unlock records not yet surfaced to the user, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_unseen_achievements(&self, user_id: Uuid) -> Result<Vec<UnlockedAchievement>> {
        let rows = sqlx::query(
            r"
            SELECT a.code, a.name, a.description, a.icon, a.xp_reward, ua.unlocked_at
            FROM user_achievements ua
            JOIN achievements a ON a.id = ua.achievement_id
            WHERE ua.user_id = $1 AND ua.seen = 0
            ORDER BY ua.unlocked_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| UnlockedAchievement {
                code: row.get("code"),
                name: row.get("name"),
                description: row.get("description"),
                icon: row.get("icon"),
                xp_reward: row.get("xp_reward"),
                unlocked_at: row.get("unlocked_at"),
            })
            .collect())
    }

    /// Mark unlock notifications as surfaced
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn mark_achievements_seen(&self, user_id: Uuid, codes: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for code in codes {
            sqlx::query(
                r"
                UPDATE user_achievements SET seen = 1
                WHERE user_id = $1
                  AND achievement_id = (SELECT id FROM achievements WHERE code = $2)
                ",
            )
            .bind(user_id.to_string())
            .bind(code)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

/// Fetch an active achievement definition by code
pub(crate) async fn get_achievement_by_code(
    conn: &mut SqliteConnection,
    code: &str,
) -> Result<Option<Achievement>> {
    let row = sqlx::query(
        r"
        SELECT id, code, name, description, icon, category, xp_reward, sort_order, is_active
        FROM achievements WHERE code = $1 AND is_active = 1
        ",
    )
    .bind(code)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|row| row_to_achievement(&row)).transpose()
}

/// Whether the (user, achievement) unlock record already exists
pub(crate) async fn unlock_exists(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    achievement_id: Uuid,
) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_achievements WHERE user_id = $1 AND achievement_id = $2",
    )
    .bind(user_id.to_string())
    .bind(achievement_id.to_string())
    .fetch_one(&mut *conn)
    .await?;
    Ok(count > 0)
}

/// Insert an unlock record
pub(crate) async fn insert_unlock(
    conn: &mut SqliteConnection,
    unlock: &UserAchievement,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO user_achievements (id, user_id, achievement_id, unlocked_at, seen)
        VALUES ($1, $2, $3, $4, $5)
        ",
    )
    .bind(unlock.id.to_string())
    .bind(unlock.user_id.to_string())
    .bind(unlock.achievement_id.to_string())
    .bind(unlock.unlocked_at)
    .bind(unlock.seen)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn row_to_achievement(row: &sqlx::sqlite::SqliteRow) -> Result<Achievement> {
    let id: String = row.get("id");
    Ok(Achievement {
        id: Uuid::parse_str(&id)?,
        code: row.get("code"),
        name: row.get("name"),
        description: row.get("description"),
        icon: row.get("icon"),
        category: row.get("category"),
        xp_reward: row.get("xp_reward"),
        sort_order: row.get("sort_order"),
        is_active: row.get("is_active"),
    })
}
