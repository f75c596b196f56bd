// ABOUTME: Integration tests for the progression recommendation engine
// ABOUTME: Covers the rule ladder end-to-end against real session history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::{completed_set, create_test_database, create_test_template, create_test_user};
use repforge::database::{Database, ExerciseHistory, ProgressHistory};
use repforge::models::{SetInput, WorkoutSet};
use repforge::services::{estimate_one_rep_max, ProgressionEngine, RecommendationType, SetRecorder, SessionService};
use uuid::Uuid;

/// Complete one full session of the template's single exercise with the
/// given per-set reps
async fn complete_session(db: &Database, user_id: Uuid, template_id: Uuid, reps: &[i32], weight: f64) {
    let session = SessionService::new(db.clone())
        .start_session(user_id, template_id)
        .await
        .unwrap();
    let exercise_id = db.list_session_exercises(session.id).await.unwrap()[0].id;

    let inputs: Vec<SetInput> = reps
        .iter()
        .enumerate()
        .map(|(i, r)| completed_set(i32::try_from(i).unwrap() + 1, *r, weight))
        .collect();
    SetRecorder::new(db.clone())
        .save_sets_for_exercise(session.id, exercise_id, user_id, &inputs, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_one_rep_max_spec_values() {
    assert!((estimate_one_rep_max(100.0, 1).unwrap() - 100.0).abs() < f64::EPSILON);
    assert!((estimate_one_rep_max(100.0, 10).unwrap() - 133.33).abs() < 0.01);
    assert!(estimate_one_rep_max(100.0, 0).is_none());
    assert!(estimate_one_rep_max(0.0, 5).is_none());
}

#[tokio::test]
async fn test_first_time_without_history() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;

    let recommendation = ProgressionEngine::new()
        .recommend(&db, user.id, Uuid::new_v4(), 3, 8, 12)
        .await
        .unwrap();

    assert_eq!(recommendation.recommendation, RecommendationType::FirstTime);
    assert!(recommendation.suggested_weight_kg.is_none());
    assert_eq!(recommendation.suggested_reps, 10);
    assert!(recommendation.recent_performance.is_empty());
}

#[tokio::test]
async fn test_decrease_weight_overrides_increase_end_to_end() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    // Template with one exercise planned 3x8-10
    let (template, catalog_ids) = create_test_template(&db, user.id, 100, 1).await;

    // Two instances hit 10 reps on every set; one has a single set at 7
    complete_session(&db, user.id, template.id, &[10, 10, 10], 80.0).await;
    complete_session(&db, user.id, template.id, &[10, 10, 10], 80.0).await;
    complete_session(&db, user.id, template.id, &[7, 10, 10], 80.0).await;

    let recommendation = ProgressionEngine::new()
        .recommend(&db, user.id, catalog_ids[0], 3, 8, 10)
        .await
        .unwrap();

    assert_eq!(
        recommendation.recommendation,
        RecommendationType::DecreaseWeight
    );
    assert!((recommendation.suggested_weight_kg.unwrap() - 77.5).abs() < f64::EPSILON);
    assert_eq!(recommendation.suggested_reps, 8);
    assert_eq!(recommendation.recent_performance.len(), 3);
}

#[tokio::test]
async fn test_increase_weight_end_to_end() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let (template, catalog_ids) = create_test_template(&db, user.id, 100, 1).await;

    complete_session(&db, user.id, template.id, &[8, 9, 9], 80.0).await;
    complete_session(&db, user.id, template.id, &[10, 10, 10], 80.0).await;
    complete_session(&db, user.id, template.id, &[10, 10, 10], 80.0).await;

    let recommendation = ProgressionEngine::new()
        .recommend(&db, user.id, catalog_ids[0], 3, 8, 10)
        .await
        .unwrap();

    assert_eq!(
        recommendation.recommendation,
        RecommendationType::IncreaseWeight
    );
    assert!((recommendation.suggested_weight_kg.unwrap() - 82.5).abs() < f64::EPSILON);
    assert_eq!(recommendation.suggested_reps, 8);
}

#[tokio::test]
async fn test_only_the_three_most_recent_instances_count() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let (template, catalog_ids) = create_test_template(&db, user.id, 100, 1).await;

    // The oldest session missed the minimum, but three newer ones are in
    // range, so rule 1 must not fire
    complete_session(&db, user.id, template.id, &[5, 6, 6], 80.0).await;
    complete_session(&db, user.id, template.id, &[8, 8, 8], 80.0).await;
    complete_session(&db, user.id, template.id, &[8, 9, 8], 80.0).await;
    complete_session(&db, user.id, template.id, &[9, 8, 8], 80.0).await;

    let recommendation = ProgressionEngine::new()
        .recommend(&db, user.id, catalog_ids[0], 3, 8, 10)
        .await
        .unwrap();

    assert_eq!(recommendation.recent_performance.len(), 3);
    assert_eq!(
        recommendation.recommendation,
        RecommendationType::IncreaseReps
    );
    assert_eq!(recommendation.suggested_reps, 9);
}

/// A canned history source, standing in for a host's own progress store
struct FixedHistory(Vec<ExerciseHistory>);

#[async_trait]
impl ProgressHistory for FixedHistory {
    async fn recent_completed_exercises(
        &self,
        _user_id: Uuid,
        _catalog_exercise_id: Uuid,
        limit: i64,
    ) -> anyhow::Result<Vec<ExerciseHistory>> {
        Ok(self
            .0
            .iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

fn history_set(set_number: i32, reps: i32, weight_kg: f64) -> WorkoutSet {
    WorkoutSet {
        id: Uuid::new_v4(),
        exercise_id: Uuid::new_v4(),
        set_number,
        reps: Some(reps),
        weight_kg: Some(weight_kg),
        completed: true,
        notes: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

#[tokio::test]
async fn test_recommendation_through_custom_history_seam() {
    let history = FixedHistory(vec![
        ExerciseHistory {
            performed_at: Utc::now(),
            sets: vec![history_set(1, 10, 100.0), history_set(2, 10, 100.0)],
        },
        ExerciseHistory {
            performed_at: Utc::now() - Duration::days(3),
            sets: vec![history_set(1, 10, 100.0), history_set(2, 10, 100.0)],
        },
    ]);

    let recommendation = ProgressionEngine::with_increment(5.0)
        .recommend(&history, Uuid::new_v4(), Uuid::new_v4(), 3, 8, 10)
        .await
        .unwrap();

    assert_eq!(
        recommendation.recommendation,
        RecommendationType::IncreaseWeight
    );
    assert!((recommendation.suggested_weight_kg.unwrap() - 105.0).abs() < f64::EPSILON);
}
