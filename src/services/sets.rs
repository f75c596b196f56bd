// ABOUTME: Set recorder: idempotent per-set upsert with derived aggregate recompute
// ABOUTME: Full completion posts the one-time XP grant and runs the achievement checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::{self, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{
    ExerciseStatus, SessionStatus, SetInput, WorkoutSession, WorkoutSet, XpEventType,
};
use crate::services::sessions::{clamp_completed_sets, progress_pct, session_for_user_tx};
use crate::services::{achievements, xp_ledger};

/// Records sets and keeps the exercise/session aggregates consistent.
///
/// Saving is idempotent and order-independent: sets are keyed by number and
/// later writes overwrite, so any call sequence converging to the same final
/// per-set values produces identical aggregates.
#[derive(Clone)]
pub struct SetRecorder {
    db: Database,
}

impl SetRecorder {
    /// Create a new set recorder over the given database
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Save or update the sets of one exercise within a session.
    ///
    /// Inputs with non-positive set numbers are skipped. The first save
    /// moves a PENDING exercise to IN_PROGRESS; reaching the planned set
    /// count completes the exercise; and the save that completes the last
    /// exercise of a still-ACTIVE session completes the session and posts
    /// the one-time XP grant. Subsequent saves on an already-COMPLETED
    /// session recompute aggregates but never re-post XP.
    ///
    /// Returns the session with its recomputed aggregates.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the session is missing/foreign or the
    /// exercise does not belong to it, or a database error
    pub async fn save_sets_for_exercise(
        &self,
        session_id: Uuid,
        exercise_id: Uuid,
        user_id: Uuid,
        inputs: &[SetInput],
        exercise_notes: Option<&str>,
    ) -> AppResult<WorkoutSession> {
        let mut tx = self.db.pool().begin().await?;

        let mut session = session_for_user_tx(&mut tx, session_id, user_id).await?;
        let mut exercise = database::workouts::get_exercise(&mut tx, exercise_id)
            .await?
            .filter(|e| e.session_id == session_id)
            .ok_or_else(|| AppError::not_found("Workout exercise"))?;

        let now = Utc::now();

        // First touch moves the exercise out of PENDING
        if exercise.status == ExerciseStatus::Pending {
            exercise.status = ExerciseStatus::InProgress;
            exercise.started_at = Some(now);
        }
        if let Some(notes) = exercise_notes {
            exercise.notes = Some(notes.to_owned());
        }

        for input in inputs {
            if input.set_number <= 0 {
                continue;
            }
            let set = WorkoutSet {
                id: Uuid::new_v4(),
                exercise_id: exercise.id,
                set_number: input.set_number,
                reps: input.reps,
                weight_kg: input.weight_kg,
                completed: input.completed,
                notes: input.notes.clone(),
                created_at: now,
                updated_at: Some(now),
            };
            database::workouts::upsert_set(&mut tx, &set).await?;
        }

        let done = database::workouts::count_completed_sets(&mut tx, exercise.id).await?;
        exercise.completed_sets = clamp_completed_sets(done, exercise.planned_sets);
        if exercise.planned_sets > 0 && done >= i64::from(exercise.planned_sets) {
            exercise.status = ExerciseStatus::Completed;
            exercise.finished_at = Some(now);
        }
        exercise.updated_at = Some(now);
        database::workouts::update_exercise_state(&mut tx, &exercise).await?;

        recalculate_session(&mut tx, &mut session).await?;

        tx.commit().await?;

        debug!(%session_id, %exercise_id, sets = inputs.len(), "saved exercise sets");
        Ok(session)
    }
}

/// Recompute the session aggregates from its exercises and, when this is
/// the save that brings completed == total on a still-ACTIVE session,
/// perform the guarded one-time completion: status flip, XP grant, and
/// achievement checks.
async fn recalculate_session(
    conn: &mut sqlx::SqliteConnection,
    session: &mut WorkoutSession,
) -> AppResult<()> {
    let exercises = database::workouts::list_exercises(conn, session.id).await?;

    let total = if session.total_exercises > 0 {
        session.total_exercises
    } else {
        i32::try_from(exercises.len()).unwrap_or(0)
    };
    let completed = i32::try_from(
        exercises
            .iter()
            .filter(|e| e.status == ExerciseStatus::Completed)
            .count(),
    )
    .unwrap_or(0);

    session.completed_exercises = completed;
    session.progress_pct = progress_pct(completed, total);

    // XP accrues proportionally to progress, not only at 100%
    #[allow(clippy::cast_possible_truncation)]
    let xp_to_grant = (session.estimated_xp as f64 * session.progress_pct / 100.0).round() as i64;
    session.xp_earned = xp_to_grant;

    // Guarded one-time transition: only an ACTIVE session can complete, so
    // repeat saves on a COMPLETED session never re-post the grant
    let was_active = session.status == SessionStatus::Active;
    if total > 0 && completed >= total && was_active {
        session.status = SessionStatus::Completed;
        session.completed_at = Some(Utc::now());

        if xp_to_grant > 0 {
            xp_ledger::grant_xp_tx(
                conn,
                session.user_id,
                xp_to_grant,
                XpEventType::WorkoutCompleted,
                &format!("Workout completed: {}", session.title),
            )
            .await?;
        }

        info!(session_id = %session.id, xp = xp_to_grant, "workout session auto-completed");
    }

    session.updated_at = Some(Utc::now());
    database::workouts::update_session_state(conn, session).await?;

    // Achievement counters read the persisted session row, so evaluate
    // after the status flip is written
    if total > 0 && completed >= total && was_active {
        achievements::check_workout_achievements(conn, session.user_id).await?;
        achievements::check_xp_achievements(conn, session.user_id).await?;
    }

    Ok(())
}
