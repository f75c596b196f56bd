// ABOUTME: Read-model persistence for routine templates (routine collaborator interface)
// ABOUTME: Provides seeding for hosts/tests and the authored-template counter for achievements
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use super::Database;
use crate::models::{CreateTemplateRequest, TemplateExercise, TemplateSession};
use anyhow::Result;
use chrono::Utc;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

impl Database {
    /// Create the template tables
    pub(super) async fn migrate_templates(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS template_sessions (
                id TEXT PRIMARY KEY,
                created_by TEXT NOT NULL REFERENCES users(id),
                title TEXT NOT NULL,
                estimated_xp INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS template_exercises (
                id TEXT PRIMARY KEY,
                template_session_id TEXT NOT NULL REFERENCES template_sessions(id) ON DELETE CASCADE,
                catalog_exercise_id TEXT NOT NULL,
                display_name TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                sets INTEGER NOT NULL,
                reps_min INTEGER NOT NULL,
                reps_max INTEGER NOT NULL,
                rir INTEGER,
                rest_seconds INTEGER
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_template_exercises_session ON template_exercises(template_session_id, order_index)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a template session with its ordered exercises.
    ///
    /// This is the seeding entry point for hosts and tests; authoring
    /// proper lives in the routine collaborator.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails
    pub async fn create_template_session(
        &self,
        created_by: Uuid,
        request: &CreateTemplateRequest,
    ) -> Result<TemplateSession> {
        let template = TemplateSession {
            id: Uuid::new_v4(),
            created_by,
            title: request.title.clone(),
            estimated_xp: request.estimated_xp,
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO template_sessions (id, created_by, title, estimated_xp, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(template.id.to_string())
        .bind(template.created_by.to_string())
        .bind(&template.title)
        .bind(template.estimated_xp)
        .bind(template.created_at)
        .execute(&mut *tx)
        .await?;

        for (index, spec) in request.exercises.iter().enumerate() {
            let order = i32::try_from(index)? + 1;
            sqlx::query(
                r"
                INSERT INTO template_exercises (
                    id, template_session_id, catalog_exercise_id, display_name,
                    order_index, sets, reps_min, reps_max, rir, rest_seconds
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(template.id.to_string())
            .bind(spec.catalog_exercise_id.to_string())
            .bind(&spec.display_name)
            .bind(order)
            .bind(spec.sets)
            .bind(spec.reps_min)
            .bind(spec.reps_max)
            .bind(spec.rir)
            .bind(spec.rest_seconds)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(template)
    }

    /// Update a template's XP estimate (collaborator write; running
    /// sessions keep their snapshot)
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn set_template_estimated_xp(&self, template_id: Uuid, estimated_xp: i64) -> Result<()> {
        sqlx::query("UPDATE template_sessions SET estimated_xp = $1 WHERE id = $2")
            .bind(estimated_xp)
            .bind(template_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Fetch a template session row
pub(crate) async fn get_template_session(
    conn: &mut SqliteConnection,
    template_id: Uuid,
) -> Result<Option<TemplateSession>> {
    let row = sqlx::query(
        r"
        SELECT id, created_by, title, estimated_xp, created_at
        FROM template_sessions WHERE id = $1
        ",
    )
    .bind(template_id.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|row| {
        let id: String = row.get("id");
        let created_by: String = row.get("created_by");
        Ok(TemplateSession {
            id: Uuid::parse_str(&id)?,
            created_by: Uuid::parse_str(&created_by)?,
            title: row.get("title"),
            estimated_xp: row.get("estimated_xp"),
            created_at: row.get("created_at"),
        })
    })
    .transpose()
}

/// Fetch a template's exercises ordered by their order index
pub(crate) async fn list_template_exercises(
    conn: &mut SqliteConnection,
    template_id: Uuid,
) -> Result<Vec<TemplateExercise>> {
    let rows = sqlx::query(
        r"
        SELECT id, template_session_id, catalog_exercise_id, display_name,
               order_index, sets, reps_min, reps_max, rir, rest_seconds
        FROM template_exercises
        WHERE template_session_id = $1
        ORDER BY order_index ASC
        ",
    )
    .bind(template_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| {
            let id: String = row.get("id");
            let template_session_id: String = row.get("template_session_id");
            let catalog_exercise_id: String = row.get("catalog_exercise_id");
            Ok(TemplateExercise {
                id: Uuid::parse_str(&id)?,
                template_session_id: Uuid::parse_str(&template_session_id)?,
                catalog_exercise_id: Uuid::parse_str(&catalog_exercise_id)?,
                display_name: row.get("display_name"),
                order_index: row.get("order_index"),
                sets: row.get("sets"),
                reps_min: row.get("reps_min"),
                reps_max: row.get("reps_max"),
                rir: row.get("rir"),
                rest_seconds: row.get("rest_seconds"),
            })
        })
        .collect()
}

/// Count templates authored by a user (routines-created achievement counter)
pub(crate) async fn count_templates_created_by(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM template_sessions WHERE created_by = $1")
        .bind(user_id.to_string())
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}
