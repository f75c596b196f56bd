// ABOUTME: Session lifecycle manager: start, skip, discard, finish, reorder
// ABOUTME: Sessions snapshot template rows at creation and never re-read them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::{self, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{
    CustomWorkoutRequest, ExerciseStatus, SessionStatus, WorkoutExercise, WorkoutSession,
    WorkoutSet,
};
use crate::services::achievements;

/// Planned-value fallbacks for ad hoc exercises that arrive without them
const DEFAULT_PLANNED_SETS: i32 = 3;
const DEFAULT_REPS_MIN: i32 = 8;
const DEFAULT_REPS_MAX: i32 = 12;

/// Creates and transitions workout sessions.
///
/// State machine: ACTIVE → COMPLETED (finish, or full auto-completion via
/// the set recorder); ACTIVE → CANCELLED (discard); skip bypasses ACTIVE
/// and produces a zero-credit COMPLETED directly. Terminal states are never
/// left.
#[derive(Clone)]
pub struct SessionService {
    db: Database,
}

/// One exercise of a session detail with its recorded sets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseDetail {
    pub exercise: WorkoutExercise,
    pub sets: Vec<WorkoutSet>,
}

/// Full session graph plus derived aggregates for the profile/history
/// collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetail {
    pub session: WorkoutSession,
    pub exercises: Vec<ExerciseDetail>,
    pub duration_minutes: i64,
    pub total_sets: usize,
    /// Σ weight×reps over every recorded set
    pub total_volume_kg: f64,
}

impl SessionService {
    /// Create a new session service over the given database
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Start a live session from a routine template.
    ///
    /// The template's ordered exercise list and XP estimate are deep-copied
    /// into the session so later template edits cannot affect it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user or template is missing
    pub async fn start_session(
        &self,
        user_id: Uuid,
        template_session_id: Uuid,
    ) -> AppResult<WorkoutSession> {
        let mut tx = self.db.pool().begin().await?;
        let session = create_from_template(&mut tx, user_id, template_session_id).await?;
        tx.commit().await?;

        info!(session_id = %session.id, %user_id, "started workout session");
        Ok(session)
    }

    /// Start a live session from an ad hoc exercise list.
    ///
    /// Order indices default to 1..N in list order; planned values fall
    /// back to standard defaults when absent. There is no template
    /// reference, so the session carries no XP estimate.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user is missing and `InvalidArgument` for
    /// an empty exercise list
    pub async fn start_custom_session(
        &self,
        user_id: Uuid,
        request: &CustomWorkoutRequest,
    ) -> AppResult<WorkoutSession> {
        if request.exercises.is_empty() {
            return Err(AppError::invalid_argument(
                "custom workout needs at least one exercise",
            ));
        }

        let mut tx = self.db.pool().begin().await?;

        database::users::get_user(&mut tx, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let now = Utc::now();
        let total = i32::try_from(request.exercises.len())
            .map_err(|_| AppError::invalid_argument("too many exercises"))?;
        let session = WorkoutSession {
            id: Uuid::new_v4(),
            user_id,
            template_session_id: None,
            title: request.title.clone().unwrap_or_else(|| "Workout".into()),
            status: SessionStatus::Active,
            started_at: request.started_at.unwrap_or(now),
            completed_at: None,
            total_exercises: total,
            completed_exercises: 0,
            progress_pct: 0.0,
            xp_earned: 0,
            estimated_xp: 0,
            created_at: now,
            updated_at: None,
        };
        database::workouts::insert_session(&mut tx, &session).await?;

        for (index, item) in request.exercises.iter().enumerate() {
            let fallback_order = i32::try_from(index)
                .map_err(|_| AppError::invalid_argument("too many exercises"))?
                + 1;
            let exercise = WorkoutExercise {
                id: Uuid::new_v4(),
                session_id: session.id,
                catalog_exercise_id: Some(item.catalog_exercise_id),
                name: item.display_name.clone(),
                order_index: item.order_index.unwrap_or(fallback_order),
                planned_sets: item.planned_sets.unwrap_or(DEFAULT_PLANNED_SETS),
                planned_reps_min: item.planned_reps_min.unwrap_or(DEFAULT_REPS_MIN),
                planned_reps_max: item.planned_reps_max.unwrap_or(DEFAULT_REPS_MAX),
                planned_rir: item.planned_rir,
                planned_rest_seconds: item.planned_rest_seconds,
                status: ExerciseStatus::Pending,
                completed_sets: 0,
                notes: None,
                started_at: None,
                finished_at: None,
                created_at: now,
                updated_at: None,
            };
            database::workouts::insert_exercise(&mut tx, &exercise).await?;
        }

        tx.commit().await?;

        info!(session_id = %session.id, %user_id, "started custom workout session");
        Ok(session)
    }

    /// Record a skipped template session: a zero-credit, auditable
    /// completion. Never posts an XP grant.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user or template is missing
    pub async fn skip_session(
        &self,
        user_id: Uuid,
        template_session_id: Uuid,
    ) -> AppResult<WorkoutSession> {
        let mut tx = self.db.pool().begin().await?;
        let mut session = create_from_template(&mut tx, user_id, template_session_id).await?;

        session.status = SessionStatus::Completed;
        session.completed_at = Some(Utc::now());
        session.progress_pct = 0.0;
        session.xp_earned = 0;
        session.updated_at = Some(Utc::now());
        database::workouts::update_session_state(&mut tx, &session).await?;

        tx.commit().await?;

        info!(session_id = %session.id, %user_id, "skipped workout session");
        Ok(session)
    }

    /// Look up a session, verifying ownership. A session that belongs to a
    /// different user is reported identically to one that does not exist.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session is absent or owned by someone else
    pub async fn get_session_for_user(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<WorkoutSession> {
        let session = self.db.get_workout_session(session_id).await?;
        session
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| AppError::not_found("Workout session"))
    }

    /// Discard an ACTIVE session without keeping progress: deletes every
    /// recorded set and marks the session CANCELLED.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing/foreign session and `InvalidState`
    /// when the session is not ACTIVE
    pub async fn discard_session(&self, session_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.pool().begin().await?;
        let mut session = session_for_user_tx(&mut tx, session_id, user_id).await?;

        if session.status != SessionStatus::Active {
            return Err(AppError::invalid_state(
                "only active sessions can be discarded",
            ));
        }

        let exercises = database::workouts::list_exercises(&mut tx, session_id).await?;
        for exercise in &exercises {
            database::workouts::delete_sets_for_exercise(&mut tx, exercise.id).await?;
        }

        session.status = SessionStatus::Cancelled;
        session.completed_at = Some(Utc::now());
        session.progress_pct = 0.0;
        session.xp_earned = 0;
        session.updated_at = Some(Utc::now());
        database::workouts::update_session_state(&mut tx, &session).await?;

        tx.commit().await?;

        info!(%session_id, %user_id, "discarded workout session");
        Ok(())
    }

    /// Finish an ACTIVE session early, keeping recorded progress.
    ///
    /// Progress is recomputed from persisted set data — an exercise with at
    /// least one completed set counts as completed; client-reported
    /// progress is never trusted. Triggers the achievement evaluator when
    /// at least one exercise reached completion. Does not grant XP: only a
    /// full auto-completion through the set recorder posts the grant.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing/foreign session and `InvalidState`
    /// when the session is not ACTIVE
    pub async fn finish_session(&self, session_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.pool().begin().await?;
        let mut session = session_for_user_tx(&mut tx, session_id, user_id).await?;

        if session.status != SessionStatus::Active {
            return Err(AppError::invalid_state(
                "only active sessions can be finished",
            ));
        }

        let exercises = database::workouts::list_exercises(&mut tx, session_id).await?;
        let mut completed = 0;
        for exercise in exercises {
            let done = database::workouts::count_completed_sets(&mut tx, exercise.id).await?;
            if done > 0 {
                completed += 1;
                let mut exercise = exercise;
                exercise.completed_sets = clamp_completed_sets(done, exercise.planned_sets);
                exercise.status = ExerciseStatus::Completed;
                exercise.updated_at = Some(Utc::now());
                database::workouts::update_exercise_state(&mut tx, &exercise).await?;
            }
        }

        session.completed_exercises = completed;
        session.progress_pct = progress_pct(completed, session.total_exercises);
        session.status = SessionStatus::Completed;
        session.completed_at = Some(Utc::now());
        session.updated_at = Some(Utc::now());
        database::workouts::update_session_state(&mut tx, &session).await?;

        if completed > 0 {
            achievements::check_workout_achievements(&mut tx, user_id).await?;
            achievements::check_xp_achievements(&mut tx, user_id).await?;
        }

        tx.commit().await?;

        info!(%session_id, %user_id, completed, "finished workout session");
        Ok(())
    }

    /// Reorder the not-yet-reached exercises of a session.
    ///
    /// The "current" position is the minimum existing order index. Only
    /// exercises ordered after it are eligible, and `ordered_ids` must be
    /// exactly a permutation of that eligible set; indices are reassigned
    /// starting at current+1 atomically.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing/foreign session or a session
    /// without exercises, and `InvalidArgument` when `ordered_ids` is not a
    /// permutation of the eligible exercises
    pub async fn reorder_next_exercises(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        ordered_ids: &[Uuid],
    ) -> AppResult<()> {
        let mut tx = self.db.pool().begin().await?;
        session_for_user_tx(&mut tx, session_id, user_id).await?;

        let exercises = database::workouts::list_exercises(&mut tx, session_id).await?;
        if exercises.is_empty() {
            return Err(AppError::not_found("Session exercises"));
        }

        let current_order = exercises
            .iter()
            .map(|e| e.order_index)
            .min()
            .unwrap_or_default();

        let eligible: Vec<Uuid> = exercises
            .iter()
            .filter(|e| e.order_index > current_order)
            .map(|e| e.id)
            .collect();

        for id in ordered_ids {
            if !eligible.contains(id) {
                return Err(AppError::invalid_argument(format!(
                    "exercise {id} is not eligible for reordering"
                )));
            }
        }
        let mut distinct = ordered_ids.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() != ordered_ids.len() || ordered_ids.len() != eligible.len() {
            return Err(AppError::invalid_argument(
                "ordered ids must be a permutation of the upcoming exercises",
            ));
        }

        let mut next_order = current_order + 1;
        for id in ordered_ids {
            database::workouts::update_exercise_order(&mut tx, *id, next_order).await?;
            next_order += 1;
        }

        tx.commit().await?;

        debug!(%session_id, moved = ordered_ids.len(), "reordered upcoming exercises");
        Ok(())
    }

    /// Full session graph plus derived aggregates (duration, set count,
    /// total volume) for the profile/history collaborator
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing/foreign session
    pub async fn get_session_detail(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<SessionDetail> {
        let session = self.get_session_for_user(session_id, user_id).await?;

        let exercises = self.db.list_session_exercises(session_id).await?;
        let mut details = Vec::with_capacity(exercises.len());
        let mut total_sets = 0;
        let mut total_volume_kg = 0.0;

        for exercise in exercises {
            let sets = self.db.list_exercise_sets(exercise.id).await?;
            total_sets += sets.len();
            for set in &sets {
                let reps = f64::from(set.reps.unwrap_or(0));
                total_volume_kg += set.weight_kg.unwrap_or(0.0) * reps;
            }
            details.push(ExerciseDetail { exercise, sets });
        }

        let end = session.completed_at.unwrap_or_else(Utc::now);
        let duration_minutes = (end - session.started_at).num_minutes();

        Ok(SessionDetail {
            session,
            exercises: details,
            duration_minutes,
            total_sets,
            total_volume_kg,
        })
    }
}

/// Fetch a session inside a transaction, verifying ownership. Foreign
/// sessions are indistinguishable from missing ones.
pub(crate) async fn session_for_user_tx(
    conn: &mut SqliteConnection,
    session_id: Uuid,
    user_id: Uuid,
) -> AppResult<WorkoutSession> {
    database::workouts::get_session(conn, session_id)
        .await?
        .filter(|s| s.user_id == user_id)
        .ok_or_else(|| AppError::not_found("Workout session"))
}

/// Snapshot a template into a new ACTIVE session with PENDING exercises
async fn create_from_template(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    template_session_id: Uuid,
) -> AppResult<WorkoutSession> {
    database::users::get_user(conn, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let template = database::templates::get_template_session(conn, template_session_id)
        .await?
        .ok_or_else(|| AppError::not_found("Routine template"))?;

    let template_exercises =
        database::templates::list_template_exercises(conn, template_session_id).await?;

    let now = Utc::now();
    let total = i32::try_from(template_exercises.len())
        .map_err(|_| AppError::internal("template exercise count overflow"))?;
    let session = WorkoutSession {
        id: Uuid::new_v4(),
        user_id,
        template_session_id: Some(template.id),
        title: template.title.clone(),
        status: SessionStatus::Active,
        started_at: now,
        completed_at: None,
        total_exercises: total,
        completed_exercises: 0,
        progress_pct: 0.0,
        xp_earned: 0,
        estimated_xp: template.estimated_xp,
        created_at: now,
        updated_at: None,
    };
    database::workouts::insert_session(conn, &session).await?;

    for te in &template_exercises {
        let exercise = WorkoutExercise {
            id: Uuid::new_v4(),
            session_id: session.id,
            catalog_exercise_id: Some(te.catalog_exercise_id),
            name: te.display_name.clone(),
            order_index: te.order_index,
            planned_sets: te.sets,
            planned_reps_min: te.reps_min,
            planned_reps_max: te.reps_max,
            planned_rir: te.rir,
            planned_rest_seconds: te.rest_seconds,
            status: ExerciseStatus::Pending,
            completed_sets: 0,
            notes: None,
            started_at: None,
            finished_at: None,
            created_at: now,
            updated_at: None,
        };
        database::workouts::insert_exercise(conn, &exercise).await?;
    }

    Ok(session)
}

/// Progress percentage, 0 when the session has no exercises
pub(crate) fn progress_pct(completed: i32, total: i32) -> f64 {
    if total > 0 {
        f64::from(completed) * 100.0 / f64::from(total)
    } else {
        0.0
    }
}

/// Completed-set count capped at the plan so the aggregate invariant holds
/// even when extra sets were recorded
pub(crate) fn clamp_completed_sets(done: i64, planned_sets: i32) -> i32 {
    let done = i32::try_from(done).unwrap_or(i32::MAX);
    if planned_sets > 0 {
        done.min(planned_sets)
    } else {
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_pct() {
        assert!((progress_pct(0, 0) - 0.0).abs() < f64::EPSILON);
        assert!((progress_pct(1, 4) - 25.0).abs() < f64::EPSILON);
        assert!((progress_pct(4, 4) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_completed_sets() {
        assert_eq!(clamp_completed_sets(2, 4), 2);
        assert_eq!(clamp_completed_sets(6, 4), 4);
        assert_eq!(clamp_completed_sets(3, 0), 3);
    }
}
