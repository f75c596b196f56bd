// ABOUTME: Progress-query seam consumed by the progression recommendation engine
// ABOUTME: Fetches recent completed instances of a catalog exercise with their sets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use super::{workouts, Database};
use crate::models::WorkoutSet;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

/// One past performance of a catalog exercise: the session date plus every
/// set recorded under the matching workout exercise
#[derive(Debug, Clone)]
pub struct ExerciseHistory {
    /// Completion time of the owning session (start time if never stamped)
    pub performed_at: DateTime<Utc>,
    pub sets: Vec<WorkoutSet>,
}

/// Read-only historical performance lookup.
///
/// The recommendation engine is stateless and consumes history through this
/// seam, so hosts can substitute their own progress store.
#[async_trait]
pub trait ProgressHistory {
    /// Up to `limit` most recent COMPLETED-session instances of a catalog
    /// exercise for one user, most recent first
    async fn recent_completed_exercises(
        &self,
        user_id: Uuid,
        catalog_exercise_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ExerciseHistory>>;
}

#[async_trait]
impl ProgressHistory for Database {
    async fn recent_completed_exercises(
        &self,
        user_id: Uuid,
        catalog_exercise_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ExerciseHistory>> {
        let rows = sqlx::query(
            r"
            SELECT we.id AS exercise_id,
                   COALESCE(s.completed_at, s.started_at) AS performed_at
            FROM workout_exercises we
            JOIN workout_sessions s ON s.id = we.workout_session_id
            WHERE s.user_id = $1
              AND we.catalog_exercise_id = $2
              AND s.status = 'COMPLETED'
            ORDER BY COALESCE(s.completed_at, s.started_at) DESC
            LIMIT $3
            ",
        )
        .bind(user_id.to_string())
        .bind(catalog_exercise_id.to_string())
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        let mut history = Vec::with_capacity(rows.len());
        let mut conn = self.pool().acquire().await?;
        for row in &rows {
            let exercise_id: String = row.get("exercise_id");
            let performed_at: DateTime<Utc> = row.get("performed_at");
            let sets = workouts::list_sets(&mut conn, Uuid::parse_str(&exercise_id)?).await?;
            history.push(ExerciseHistory { performed_at, sets });
        }

        Ok(history)
    }
}
