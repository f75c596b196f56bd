// ABOUTME: Append-only XP event log persistence and user balance updates
// ABOUTME: Events are immutable; balances and rank are written by the ledger service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use super::Database;
use crate::models::{XpEvent, XpEventType, XpRank};
use anyhow::Result;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

impl Database {
    /// Create the XP event table
    pub(super) async fn migrate_xp(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS xp_events (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                xp_delta INTEGER NOT NULL,
                event_type TEXT NOT NULL,
                description TEXT,
                reference_id TEXT,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_xp_events_user ON xp_events(user_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List a user's XP events, newest first (profile collaborator feed)
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_xp_events(&self, user_id: Uuid) -> Result<Vec<XpEvent>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, xp_delta, event_type, description, reference_id, created_at
            FROM xp_events
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let user_id: String = row.get("user_id");
                let event_type: String = row.get("event_type");
                let reference_id: Option<String> = row.get("reference_id");
                Ok(XpEvent {
                    id: Uuid::parse_str(&id)?,
                    user_id: Uuid::parse_str(&user_id)?,
                    delta: row.get("xp_delta"),
                    event_type: event_type.parse::<XpEventType>()?,
                    description: row.get("description"),
                    reference_id: reference_id.as_deref().map(Uuid::parse_str).transpose()?,
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }
}

/// Append an immutable ledger entry
pub(crate) async fn insert_xp_event(conn: &mut SqliteConnection, event: &XpEvent) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO xp_events (id, user_id, xp_delta, event_type, description, reference_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(event.id.to_string())
    .bind(event.user_id.to_string())
    .bind(event.delta)
    .bind(event.event_type.as_str())
    .bind(&event.description)
    .bind(event.reference_id.map(|id| id.to_string()))
    .bind(event.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Write a user's derived XP state (balance, lifetime credit, rank)
pub(crate) async fn update_user_xp(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    xp_points: i64,
    lifetime_xp: i64,
    rank: XpRank,
) -> Result<()> {
    sqlx::query(
        r"
        UPDATE users SET
            xp_points = $2,
            lifetime_xp = $3,
            xp_rank = $4,
            last_active = CURRENT_TIMESTAMP
        WHERE id = $1
        ",
    )
    .bind(user_id.to_string())
    .bind(xp_points)
    .bind(lifetime_xp)
    .bind(rank.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}
