// ABOUTME: Read model of the routine/catalog collaborator consumed at session start
// ABOUTME: Template rows are copied into session snapshots, never referenced live
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A routine template session ("Push day", "Legs", ...) authored in the
/// routine collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSession {
    pub id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    /// XP credit a full completion of this template is worth
    pub estimated_xp: i64,
    pub created_at: DateTime<Utc>,
}

/// One ordered exercise definition inside a template session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateExercise {
    pub id: Uuid,
    pub template_session_id: Uuid,
    pub catalog_exercise_id: Uuid,
    pub display_name: String,
    pub order_index: i32,
    pub sets: i32,
    pub reps_min: i32,
    pub reps_max: i32,
    pub rir: Option<i32>,
    pub rest_seconds: Option<i32>,
}

/// Seed input for a template session (used by hosts and tests)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    pub title: String,
    pub estimated_xp: i64,
    pub exercises: Vec<TemplateExerciseSpec>,
}

/// Seed input for one template exercise; order is assigned 1..N in list order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateExerciseSpec {
    pub catalog_exercise_id: Uuid,
    pub display_name: String,
    pub sets: i32,
    pub reps_min: i32,
    pub reps_max: i32,
    #[serde(default)]
    pub rir: Option<i32>,
    #[serde(default)]
    pub rest_seconds: Option<i32>,
}
