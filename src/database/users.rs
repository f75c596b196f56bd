// ABOUTME: User row persistence for the XP-bearing columns the engine owns
// ABOUTME: Identity and auth concerns live in the external user collaborator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use super::Database;
use crate::models::{User, XpRank};
use anyhow::Result;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

impl Database {
    /// Create the users table
    pub(super) async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                display_name TEXT,
                xp_points INTEGER NOT NULL DEFAULT 0,
                lifetime_xp INTEGER NOT NULL DEFAULT 0,
                xp_rank TEXT NOT NULL DEFAULT 'novice_i',
                created_at DATETIME NOT NULL,
                last_active DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a new user row
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already in use or the insert fails
    pub async fn create_user(&self, user: &User) -> Result<Uuid> {
        sqlx::query(
            r"
            INSERT INTO users (id, email, display_name, xp_points, lifetime_xp, xp_rank, created_at, last_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.xp_points)
        .bind(user.lifetime_xp)
        .bind(user.rank.as_str())
        .bind(user.created_at)
        .bind(user.last_active)
        .execute(&self.pool)
        .await?;

        Ok(user.id)
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        get_user(&mut conn, user_id).await
    }
}

/// Fetch a user row through an existing connection or transaction
pub(crate) async fn get_user(conn: &mut SqliteConnection, user_id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query(
        r"
        SELECT id, email, display_name, xp_points, lifetime_xp, xp_rank, created_at, last_active
        FROM users WHERE id = $1
        ",
    )
    .bind(user_id.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|row| row_to_user(&row)).transpose()
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let id: String = row.get("id");
    let rank: String = row.get("xp_rank");

    Ok(User {
        id: Uuid::parse_str(&id)?,
        email: row.get("email"),
        display_name: row.get("display_name"),
        xp_points: row.get("xp_points"),
        lifetime_xp: row.get("lifetime_xp"),
        rank: rank.parse::<XpRank>()?,
        created_at: row.get("created_at"),
        last_active: row.get("last_active"),
    })
}
