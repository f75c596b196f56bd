// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides database, user, and template seeding helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

#![allow(dead_code, clippy::missing_panics_doc, clippy::must_use_candidate)]

//! Shared test utilities for `repforge` integration tests

use std::sync::Once;

use repforge::database::Database;
use repforge::models::{
    CreateTemplateRequest, SetInput, TemplateSession, TemplateExerciseSpec, User,
};
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard test database setup: isolated in-memory SQLite
pub async fn create_test_database() -> Database {
    init_test_logging();
    Database::new("sqlite::memory:").await.unwrap()
}

/// Create and persist a user with zeroed XP state
pub async fn create_test_user(db: &Database) -> User {
    let user = User::new(format!("{}@example.com", Uuid::new_v4()), Some("Tester".into()));
    db.create_user(&user).await.unwrap();
    user
}

/// Seed a template session with `exercise_count` identical exercises
/// (3 planned sets, 8-10 reps) and return it with the catalog exercise ids
pub async fn create_test_template(
    db: &Database,
    created_by: Uuid,
    estimated_xp: i64,
    exercise_count: usize,
) -> (TemplateSession, Vec<Uuid>) {
    let catalog_ids: Vec<Uuid> = (0..exercise_count).map(|_| Uuid::new_v4()).collect();
    let request = CreateTemplateRequest {
        title: "Push Day".into(),
        estimated_xp,
        exercises: catalog_ids
            .iter()
            .enumerate()
            .map(|(i, id)| TemplateExerciseSpec {
                catalog_exercise_id: *id,
                display_name: format!("Exercise {}", i + 1),
                sets: 3,
                reps_min: 8,
                reps_max: 10,
                rir: Some(2),
                rest_seconds: Some(90),
            })
            .collect(),
    };
    let template = db.create_template_session(created_by, &request).await.unwrap();
    (template, catalog_ids)
}

/// A completed set input at the given number
pub fn completed_set(set_number: i32, reps: i32, weight_kg: f64) -> SetInput {
    SetInput {
        set_number,
        reps: Some(reps),
        weight_kg: Some(weight_kg),
        completed: true,
        notes: None,
    }
}

/// An uncompleted set input at the given number
pub fn pending_set(set_number: i32, reps: i32, weight_kg: f64) -> SetInput {
    SetInput {
        set_number,
        reps: Some(reps),
        weight_kg: Some(weight_kg),
        completed: false,
        notes: None,
    }
}

/// Three completed sets at the planned 8-10 rep range
pub fn full_exercise_inputs(reps: i32, weight_kg: f64) -> Vec<SetInput> {
    (1..=3).map(|n| completed_set(n, reps, weight_kg)).collect()
}
