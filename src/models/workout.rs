// ABOUTME: Workout session, exercise, and set models with their status machines
// ABOUTME: Exercises are deep snapshots of template rows taken at session creation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Workout session status.
///
/// ACTIVE → COMPLETED via finish or full auto-completion; ACTIVE → CANCELLED
/// via discard. Skip produces COMPLETED directly with zero credit. No
/// transition leaves a terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

impl SessionStatus {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether the session can still be mutated
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl FromStr for SessionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(AppError::invalid_argument(format!(
                "Invalid session status: {s}"
            ))),
        }
    }
}

/// Workout exercise status within a session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseStatus {
    Pending,
    InProgress,
    Completed,
}

impl ExerciseStatus {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }
}

impl FromStr for ExerciseStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(AppError::invalid_argument(format!(
                "Invalid exercise status: {s}"
            ))),
        }
    }
}

/// One user's attempt at a workout, derived from a template or an ad hoc
/// exercise list.
///
/// `estimated_xp` is snapshotted from the template at creation time so
/// later template edits cannot change the credit of a running session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Source template session, absent for ad hoc workouts
    pub template_session_id: Option<Uuid>,
    pub title: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_exercises: i32,
    pub completed_exercises: i32,
    /// 0–100, derived from completed exercises
    pub progress_pct: f64,
    pub xp_earned: i64,
    /// Template XP estimate snapshot; 0 for ad hoc sessions
    pub estimated_xp: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// An exercise inside a live session: an immutable snapshot of the planned
/// parameters plus mutable execution state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub id: Uuid,
    pub session_id: Uuid,
    /// Linked catalog exercise, used to match history across sessions
    pub catalog_exercise_id: Option<Uuid>,
    pub name: String,
    pub order_index: i32,
    pub planned_sets: i32,
    pub planned_reps_min: i32,
    pub planned_reps_max: i32,
    pub planned_rir: Option<i32>,
    pub planned_rest_seconds: Option<i32>,
    pub status: ExerciseStatus,
    pub completed_sets: i32,
    pub notes: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One recorded attempt (reps + weight) at an exercise within a session.
/// Unique per (exercise, set number); upserts overwrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub id: Uuid,
    pub exercise_id: Uuid,
    pub set_number: i32,
    pub reps: Option<i32>,
    pub weight_kg: Option<f64>,
    pub completed: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Caller input for one set, keyed by set number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetInput {
    pub set_number: i32,
    pub reps: Option<i32>,
    pub weight_kg: Option<f64>,
    pub completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request to start an ad hoc workout without a routine template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomWorkoutRequest {
    /// Optional display title; defaults to "Workout"
    pub title: Option<String>,
    /// Optional start timestamp; defaults to now
    pub started_at: Option<DateTime<Utc>>,
    pub exercises: Vec<CustomExerciseItem>,
}

/// One exercise of an ad hoc workout with caller-supplied planned values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomExerciseItem {
    pub catalog_exercise_id: Uuid,
    pub display_name: String,
    /// Assigned 1..N in list order when absent
    #[serde(default)]
    pub order_index: Option<i32>,
    #[serde(default)]
    pub planned_sets: Option<i32>,
    #[serde(default)]
    pub planned_reps_min: Option<i32>,
    #[serde(default)]
    pub planned_reps_max: Option<i32>,
    #[serde(default)]
    pub planned_rir: Option<i32>,
    #[serde(default)]
    pub planned_rest_seconds: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_round_trip() {
        for status in [
            SessionStatus::Active,
            SessionStatus::Completed,
            SessionStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<SessionStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SessionStatus::Active.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_exercise_status_round_trip() {
        assert_eq!(
            "IN_PROGRESS".parse::<ExerciseStatus>().unwrap(),
            ExerciseStatus::InProgress
        );
        assert!("RUNNING".parse::<ExerciseStatus>().is_err());
    }
}
