// ABOUTME: Persistence for workout sessions, exercise snapshots, and recorded sets
// ABOUTME: Write helpers take a connection so service transactions stay atomic
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use super::Database;
use crate::models::{ExerciseStatus, SessionStatus, WorkoutExercise, WorkoutSession, WorkoutSet};
use anyhow::Result;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

impl Database {
    /// Create the workout tables
    pub(super) async fn migrate_workouts(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS workout_sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                template_session_id TEXT REFERENCES template_sessions(id),
                title TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'ACTIVE' CHECK (status IN ('ACTIVE', 'COMPLETED', 'CANCELLED')),
                started_at DATETIME NOT NULL,
                completed_at DATETIME,
                total_exercises INTEGER NOT NULL DEFAULT 0,
                completed_exercises INTEGER NOT NULL DEFAULT 0,
                progress_pct REAL NOT NULL DEFAULT 0,
                xp_earned INTEGER NOT NULL DEFAULT 0,
                estimated_xp INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS workout_exercises (
                id TEXT PRIMARY KEY,
                workout_session_id TEXT NOT NULL REFERENCES workout_sessions(id) ON DELETE CASCADE,
                catalog_exercise_id TEXT,
                exercise_name TEXT NOT NULL,
                exercise_order INTEGER NOT NULL,
                planned_sets INTEGER NOT NULL,
                planned_reps_min INTEGER NOT NULL,
                planned_reps_max INTEGER NOT NULL,
                planned_rir INTEGER,
                planned_rest_seconds INTEGER,
                status TEXT NOT NULL DEFAULT 'PENDING' CHECK (status IN ('PENDING', 'IN_PROGRESS', 'COMPLETED')),
                completed_sets INTEGER NOT NULL DEFAULT 0,
                notes TEXT,
                started_at DATETIME,
                finished_at DATETIME,
                created_at DATETIME NOT NULL,
                updated_at DATETIME
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS workout_sets (
                id TEXT PRIMARY KEY,
                workout_exercise_id TEXT NOT NULL REFERENCES workout_exercises(id) ON DELETE CASCADE,
                set_number INTEGER NOT NULL,
                reps INTEGER,
                weight_kg REAL,
                completed INTEGER NOT NULL DEFAULT 0,
                notes TEXT,
                created_at DATETIME NOT NULL,
                updated_at DATETIME,
                UNIQUE (workout_exercise_id, set_number)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_workout_sessions_user ON workout_sessions(user_id, status)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_workout_exercises_session ON workout_exercises(workout_session_id, exercise_order)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_workout_sets_exercise ON workout_sets(workout_exercise_id, set_number)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a workout session by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_workout_session(&self, session_id: Uuid) -> Result<Option<WorkoutSession>> {
        let mut conn = self.pool.acquire().await?;
        get_session(&mut conn, session_id).await
    }

    /// Get a session's exercises ordered by their order index
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_session_exercises(&self, session_id: Uuid) -> Result<Vec<WorkoutExercise>> {
        let mut conn = self.pool.acquire().await?;
        list_exercises(&mut conn, session_id).await
    }

    /// Get an exercise's recorded sets ordered by set number
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_exercise_sets(&self, exercise_id: Uuid) -> Result<Vec<WorkoutSet>> {
        let mut conn = self.pool.acquire().await?;
        list_sets(&mut conn, exercise_id).await
    }
}

/// Insert a new session row
pub(crate) async fn insert_session(
    conn: &mut SqliteConnection,
    session: &WorkoutSession,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO workout_sessions (
            id, user_id, template_session_id, title, status, started_at, completed_at,
            total_exercises, completed_exercises, progress_pct, xp_earned, estimated_xp,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        ",
    )
    .bind(session.id.to_string())
    .bind(session.user_id.to_string())
    .bind(session.template_session_id.map(|id| id.to_string()))
    .bind(&session.title)
    .bind(session.status.as_str())
    .bind(session.started_at)
    .bind(session.completed_at)
    .bind(session.total_exercises)
    .bind(session.completed_exercises)
    .bind(session.progress_pct)
    .bind(session.xp_earned)
    .bind(session.estimated_xp)
    .bind(session.created_at)
    .bind(session.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Insert a new exercise snapshot row
pub(crate) async fn insert_exercise(
    conn: &mut SqliteConnection,
    exercise: &WorkoutExercise,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO workout_exercises (
            id, workout_session_id, catalog_exercise_id, exercise_name, exercise_order,
            planned_sets, planned_reps_min, planned_reps_max, planned_rir, planned_rest_seconds,
            status, completed_sets, notes, started_at, finished_at, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        ",
    )
    .bind(exercise.id.to_string())
    .bind(exercise.session_id.to_string())
    .bind(exercise.catalog_exercise_id.map(|id| id.to_string()))
    .bind(&exercise.name)
    .bind(exercise.order_index)
    .bind(exercise.planned_sets)
    .bind(exercise.planned_reps_min)
    .bind(exercise.planned_reps_max)
    .bind(exercise.planned_rir)
    .bind(exercise.planned_rest_seconds)
    .bind(exercise.status.as_str())
    .bind(exercise.completed_sets)
    .bind(&exercise.notes)
    .bind(exercise.started_at)
    .bind(exercise.finished_at)
    .bind(exercise.created_at)
    .bind(exercise.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Fetch a session row
pub(crate) async fn get_session(
    conn: &mut SqliteConnection,
    session_id: Uuid,
) -> Result<Option<WorkoutSession>> {
    let row = sqlx::query(
        r"
        SELECT id, user_id, template_session_id, title, status, started_at, completed_at,
               total_exercises, completed_exercises, progress_pct, xp_earned, estimated_xp,
               created_at, updated_at
        FROM workout_sessions WHERE id = $1
        ",
    )
    .bind(session_id.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|row| row_to_session(&row)).transpose()
}

/// Fetch an exercise row
pub(crate) async fn get_exercise(
    conn: &mut SqliteConnection,
    exercise_id: Uuid,
) -> Result<Option<WorkoutExercise>> {
    let row = sqlx::query(
        r"
        SELECT id, workout_session_id, catalog_exercise_id, exercise_name, exercise_order,
               planned_sets, planned_reps_min, planned_reps_max, planned_rir, planned_rest_seconds,
               status, completed_sets, notes, started_at, finished_at, created_at, updated_at
        FROM workout_exercises WHERE id = $1
        ",
    )
    .bind(exercise_id.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|row| row_to_exercise(&row)).transpose()
}

/// Fetch a session's exercises ordered by order index
pub(crate) async fn list_exercises(
    conn: &mut SqliteConnection,
    session_id: Uuid,
) -> Result<Vec<WorkoutExercise>> {
    let rows = sqlx::query(
        r"
        SELECT id, workout_session_id, catalog_exercise_id, exercise_name, exercise_order,
               planned_sets, planned_reps_min, planned_reps_max, planned_rir, planned_rest_seconds,
               status, completed_sets, notes, started_at, finished_at, created_at, updated_at
        FROM workout_exercises
        WHERE workout_session_id = $1
        ORDER BY exercise_order ASC
        ",
    )
    .bind(session_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(row_to_exercise).collect()
}

/// Fetch an exercise's sets ordered by set number
pub(crate) async fn list_sets(
    conn: &mut SqliteConnection,
    exercise_id: Uuid,
) -> Result<Vec<WorkoutSet>> {
    let rows = sqlx::query(
        r"
        SELECT id, workout_exercise_id, set_number, reps, weight_kg, completed, notes,
               created_at, updated_at
        FROM workout_sets
        WHERE workout_exercise_id = $1
        ORDER BY set_number ASC
        ",
    )
    .bind(exercise_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(row_to_set).collect()
}

/// Upsert a set row keyed by (exercise, set number).
///
/// A later write for the same set number overwrites reps/weight/completed/
/// notes, which is what makes repeated saves converge.
pub(crate) async fn upsert_set(conn: &mut SqliteConnection, set: &WorkoutSet) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO workout_sets (
            id, workout_exercise_id, set_number, reps, weight_kg, completed, notes,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT(workout_exercise_id, set_number) DO UPDATE SET
            reps = $4,
            weight_kg = $5,
            completed = $6,
            notes = $7,
            updated_at = $9
        ",
    )
    .bind(set.id.to_string())
    .bind(set.exercise_id.to_string())
    .bind(set.set_number)
    .bind(set.reps)
    .bind(set.weight_kg)
    .bind(set.completed)
    .bind(&set.notes)
    .bind(set.created_at)
    .bind(set.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Count an exercise's completed sets
pub(crate) async fn count_completed_sets(
    conn: &mut SqliteConnection,
    exercise_id: Uuid,
) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM workout_sets WHERE workout_exercise_id = $1 AND completed = 1",
    )
    .bind(exercise_id.to_string())
    .fetch_one(&mut *conn)
    .await?;
    Ok(count)
}

/// Write an exercise's mutable execution state
pub(crate) async fn update_exercise_state(
    conn: &mut SqliteConnection,
    exercise: &WorkoutExercise,
) -> Result<()> {
    sqlx::query(
        r"
        UPDATE workout_exercises SET
            status = $2,
            completed_sets = $3,
            notes = $4,
            started_at = $5,
            finished_at = $6,
            updated_at = $7
        WHERE id = $1
        ",
    )
    .bind(exercise.id.to_string())
    .bind(exercise.status.as_str())
    .bind(exercise.completed_sets)
    .bind(&exercise.notes)
    .bind(exercise.started_at)
    .bind(exercise.finished_at)
    .bind(exercise.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Reassign an exercise's order index (reorder operation)
pub(crate) async fn update_exercise_order(
    conn: &mut SqliteConnection,
    exercise_id: Uuid,
    order_index: i32,
) -> Result<()> {
    sqlx::query("UPDATE workout_exercises SET exercise_order = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(order_index)
        .bind(exercise_id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Write a session's mutable aggregate state
pub(crate) async fn update_session_state(
    conn: &mut SqliteConnection,
    session: &WorkoutSession,
) -> Result<()> {
    sqlx::query(
        r"
        UPDATE workout_sessions SET
            status = $2,
            completed_at = $3,
            completed_exercises = $4,
            progress_pct = $5,
            xp_earned = $6,
            updated_at = $7
        WHERE id = $1
        ",
    )
    .bind(session.id.to_string())
    .bind(session.status.as_str())
    .bind(session.completed_at)
    .bind(session.completed_exercises)
    .bind(session.progress_pct)
    .bind(session.xp_earned)
    .bind(session.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Delete every recorded set under one exercise (discard operation)
pub(crate) async fn delete_sets_for_exercise(
    conn: &mut SqliteConnection,
    exercise_id: Uuid,
) -> Result<()> {
    sqlx::query("DELETE FROM workout_sets WHERE workout_exercise_id = $1")
        .bind(exercise_id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Count a user's sessions in a given status (workout-count achievement
/// counter; skipped sessions share the COMPLETED status and are counted)
pub(crate) async fn count_sessions_with_status(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    status: SessionStatus,
) -> Result<i64> {
    let count =
        sqlx::query_scalar("SELECT COUNT(*) FROM workout_sessions WHERE user_id = $1 AND status = $2")
            .bind(user_id.to_string())
            .bind(status.as_str())
            .fetch_one(&mut *conn)
            .await?;
    Ok(count)
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<WorkoutSession> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let template_session_id: Option<String> = row.get("template_session_id");
    let status: String = row.get("status");

    Ok(WorkoutSession {
        id: Uuid::parse_str(&id)?,
        user_id: Uuid::parse_str(&user_id)?,
        template_session_id: template_session_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()?,
        title: row.get("title"),
        status: status.parse::<SessionStatus>()?,
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
        total_exercises: row.get("total_exercises"),
        completed_exercises: row.get("completed_exercises"),
        progress_pct: row.get("progress_pct"),
        xp_earned: row.get("xp_earned"),
        estimated_xp: row.get("estimated_xp"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_exercise(row: &sqlx::sqlite::SqliteRow) -> Result<WorkoutExercise> {
    let id: String = row.get("id");
    let session_id: String = row.get("workout_session_id");
    let catalog_exercise_id: Option<String> = row.get("catalog_exercise_id");
    let status: String = row.get("status");

    Ok(WorkoutExercise {
        id: Uuid::parse_str(&id)?,
        session_id: Uuid::parse_str(&session_id)?,
        catalog_exercise_id: catalog_exercise_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()?,
        name: row.get("exercise_name"),
        order_index: row.get("exercise_order"),
        planned_sets: row.get("planned_sets"),
        planned_reps_min: row.get("planned_reps_min"),
        planned_reps_max: row.get("planned_reps_max"),
        planned_rir: row.get("planned_rir"),
        planned_rest_seconds: row.get("planned_rest_seconds"),
        status: status.parse::<ExerciseStatus>()?,
        completed_sets: row.get("completed_sets"),
        notes: row.get("notes"),
        started_at: row.get("started_at"),
        finished_at: row.get("finished_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

pub(super) fn row_to_set(row: &sqlx::sqlite::SqliteRow) -> Result<WorkoutSet> {
    let id: String = row.get("id");
    let exercise_id: String = row.get("workout_exercise_id");

    Ok(WorkoutSet {
        id: Uuid::parse_str(&id)?,
        exercise_id: Uuid::parse_str(&exercise_id)?,
        set_number: row.get("set_number"),
        reps: row.get("reps"),
        weight_kg: row.get("weight_kg"),
        completed: row.get("completed"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
