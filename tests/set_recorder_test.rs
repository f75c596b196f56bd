// ABOUTME: Integration tests for the set recorder
// ABOUTME: Covers idempotent upserts, aggregate invariants, and the one-time XP grant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use common::{
    completed_set, create_test_database, create_test_template, create_test_user, pending_set,
};
use repforge::database::Database;
use repforge::errors::ErrorCode;
use repforge::models::{ExerciseStatus, SessionStatus, SetInput, XpEventType};
use repforge::services::{SessionService, SetRecorder, XpLedger};
use uuid::Uuid;

async fn assert_aggregates_consistent(db: &Database, session_id: Uuid) {
    let session = db.get_workout_session(session_id).await.unwrap().unwrap();
    let exercises = db.list_session_exercises(session_id).await.unwrap();

    let completed = i32::try_from(
        exercises
            .iter()
            .filter(|e| e.status == ExerciseStatus::Completed)
            .count(),
    )
    .unwrap();
    assert_eq!(session.completed_exercises, completed);

    let expected_pct = if session.total_exercises > 0 {
        f64::from(completed) * 100.0 / f64::from(session.total_exercises)
    } else {
        0.0
    };
    assert!((session.progress_pct - expected_pct).abs() < 1e-9);

    for exercise in &exercises {
        assert!(exercise.completed_sets <= exercise.planned_sets);
    }
}

#[tokio::test]
async fn test_first_save_starts_the_exercise() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let (template, _) = create_test_template(&db, user.id, 100, 1).await;
    let session = SessionService::new(db.clone())
        .start_session(user.id, template.id)
        .await
        .unwrap();
    let exercises = db.list_session_exercises(session.id).await.unwrap();

    SetRecorder::new(db.clone())
        .save_sets_for_exercise(
            session.id,
            exercises[0].id,
            user.id,
            &[pending_set(1, 8, 40.0)],
            Some("felt heavy today"),
        )
        .await
        .unwrap();

    let refreshed = db.list_session_exercises(session.id).await.unwrap();
    assert_eq!(refreshed[0].status, ExerciseStatus::InProgress);
    assert!(refreshed[0].started_at.is_some());
    assert_eq!(refreshed[0].notes.as_deref(), Some("felt heavy today"));
}

#[tokio::test]
async fn test_upsert_overwrites_by_set_number() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let (template, _) = create_test_template(&db, user.id, 100, 1).await;
    let session = SessionService::new(db.clone())
        .start_session(user.id, template.id)
        .await
        .unwrap();
    let exercise_id = db.list_session_exercises(session.id).await.unwrap()[0].id;
    let recorder = SetRecorder::new(db.clone());

    recorder
        .save_sets_for_exercise(session.id, exercise_id, user.id, &[pending_set(1, 8, 40.0)], None)
        .await
        .unwrap();
    recorder
        .save_sets_for_exercise(
            session.id,
            exercise_id,
            user.id,
            &[completed_set(1, 10, 42.5)],
            None,
        )
        .await
        .unwrap();

    let sets = db.list_exercise_sets(exercise_id).await.unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].set_number, 1);
    assert_eq!(sets[0].reps, Some(10));
    assert!((sets[0].weight_kg.unwrap() - 42.5).abs() < f64::EPSILON);
    assert!(sets[0].completed);
}

#[tokio::test]
async fn test_save_order_does_not_matter() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let (template, _) = create_test_template(&db, user.id, 100, 1).await;
    let service = SessionService::new(db.clone());
    let recorder = SetRecorder::new(db.clone());

    // Two sessions converge to the same final per-set values through
    // different call orders
    let session_a = service.start_session(user.id, template.id).await.unwrap();
    let exercise_a = db.list_session_exercises(session_a.id).await.unwrap()[0].id;
    recorder
        .save_sets_for_exercise(
            session_a.id,
            exercise_a,
            user.id,
            &[completed_set(1, 10, 50.0), completed_set(2, 9, 50.0)],
            None,
        )
        .await
        .unwrap();
    recorder
        .save_sets_for_exercise(session_a.id, exercise_a, user.id, &[completed_set(3, 8, 50.0)], None)
        .await
        .unwrap();

    let session_b = service.start_session(user.id, template.id).await.unwrap();
    let exercise_b = db.list_session_exercises(session_b.id).await.unwrap()[0].id;
    recorder
        .save_sets_for_exercise(session_b.id, exercise_b, user.id, &[completed_set(3, 8, 50.0)], None)
        .await
        .unwrap();
    recorder
        .save_sets_for_exercise(
            session_b.id,
            exercise_b,
            user.id,
            &[completed_set(2, 9, 50.0), completed_set(1, 10, 50.0)],
            None,
        )
        .await
        .unwrap();

    let a = db.get_workout_session(session_a.id).await.unwrap().unwrap();
    let b = db.get_workout_session(session_b.id).await.unwrap().unwrap();
    assert_eq!(a.completed_exercises, b.completed_exercises);
    assert!((a.progress_pct - b.progress_pct).abs() < f64::EPSILON);
    assert_eq!(a.xp_earned, b.xp_earned);
    assert_eq!(a.status, b.status);

    let sets_a = db.list_exercise_sets(exercise_a).await.unwrap();
    let sets_b = db.list_exercise_sets(exercise_b).await.unwrap();
    assert_eq!(sets_a.len(), sets_b.len());
    for (sa, sb) in sets_a.iter().zip(&sets_b) {
        assert_eq!(sa.set_number, sb.set_number);
        assert_eq!(sa.reps, sb.reps);
        assert_eq!(sa.completed, sb.completed);
    }
}

#[tokio::test]
async fn test_xp_accrues_proportionally_before_completion() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let (template, _) = create_test_template(&db, user.id, 100, 2).await;
    let session = SessionService::new(db.clone())
        .start_session(user.id, template.id)
        .await
        .unwrap();
    let exercises = db.list_session_exercises(session.id).await.unwrap();
    let recorder = SetRecorder::new(db.clone());
    let ledger = XpLedger::new(db.clone());

    let updated = recorder
        .save_sets_for_exercise(
            session.id,
            exercises[0].id,
            user.id,
            &common::full_exercise_inputs(9, 60.0),
            None,
        )
        .await
        .unwrap();

    // Half the exercises done: half the estimate accrued, no grant yet
    assert_eq!(updated.status, SessionStatus::Active);
    assert!((updated.progress_pct - 50.0).abs() < f64::EPSILON);
    assert_eq!(updated.xp_earned, 50);
    assert!(ledger.events(user.id).await.unwrap().is_empty());

    assert_aggregates_consistent(&db, session.id).await;
}

#[tokio::test]
async fn test_auto_completion_grants_xp_exactly_once() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let (template, _) = create_test_template(&db, user.id, 100, 2).await;
    let session = SessionService::new(db.clone())
        .start_session(user.id, template.id)
        .await
        .unwrap();
    let exercises = db.list_session_exercises(session.id).await.unwrap();
    let recorder = SetRecorder::new(db.clone());
    let ledger = XpLedger::new(db.clone());

    recorder
        .save_sets_for_exercise(
            session.id,
            exercises[0].id,
            user.id,
            &common::full_exercise_inputs(9, 60.0),
            None,
        )
        .await
        .unwrap();
    let completed = recorder
        .save_sets_for_exercise(
            session.id,
            exercises[1].id,
            user.id,
            &common::full_exercise_inputs(9, 60.0),
            None,
        )
        .await
        .unwrap();

    assert_eq!(completed.status, SessionStatus::Completed);
    assert!(completed.completed_at.is_some());
    assert_eq!(completed.xp_earned, 100);

    // The grant plus the FIRST_WORKOUT reward
    let stored = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.lifetime_xp, 150);

    // A repeat save on the already-COMPLETED session must not re-post XP
    recorder
        .save_sets_for_exercise(
            session.id,
            exercises[1].id,
            user.id,
            &common::full_exercise_inputs(10, 62.5),
            None,
        )
        .await
        .unwrap();

    let events = ledger.events(user.id).await.unwrap();
    let workout_grants = events
        .iter()
        .filter(|e| e.event_type == XpEventType::WorkoutCompleted)
        .count();
    assert_eq!(workout_grants, 1);
    let stored = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.lifetime_xp, 150);
}

#[tokio::test]
async fn test_completed_sets_capped_at_plan() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let (template, _) = create_test_template(&db, user.id, 100, 1).await;
    let session = SessionService::new(db.clone())
        .start_session(user.id, template.id)
        .await
        .unwrap();
    let exercise_id = db.list_session_exercises(session.id).await.unwrap()[0].id;

    // Four completed sets against a plan of three
    let inputs: Vec<SetInput> = (1..=4).map(|n| completed_set(n, 8, 40.0)).collect();
    SetRecorder::new(db.clone())
        .save_sets_for_exercise(session.id, exercise_id, user.id, &inputs, None)
        .await
        .unwrap();

    let exercise = &db.list_session_exercises(session.id).await.unwrap()[0];
    assert_eq!(exercise.status, ExerciseStatus::Completed);
    assert_eq!(exercise.completed_sets, 3);
    assert_eq!(db.list_exercise_sets(exercise_id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_non_positive_set_numbers_are_skipped() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let (template, _) = create_test_template(&db, user.id, 100, 1).await;
    let session = SessionService::new(db.clone())
        .start_session(user.id, template.id)
        .await
        .unwrap();
    let exercise_id = db.list_session_exercises(session.id).await.unwrap()[0].id;

    SetRecorder::new(db.clone())
        .save_sets_for_exercise(
            session.id,
            exercise_id,
            user.id,
            &[completed_set(0, 8, 40.0), completed_set(-1, 8, 40.0), completed_set(1, 8, 40.0)],
            None,
        )
        .await
        .unwrap();

    assert_eq!(db.list_exercise_sets(exercise_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_membership_checks_report_not_found() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let stranger = create_test_user(&db).await;
    let (template, _) = create_test_template(&db, user.id, 100, 1).await;
    let service = SessionService::new(db.clone());
    let recorder = SetRecorder::new(db.clone());

    let session = service.start_session(user.id, template.id).await.unwrap();
    let other_session = service.start_session(user.id, template.id).await.unwrap();
    let exercise_id = db.list_session_exercises(session.id).await.unwrap()[0].id;

    // Foreign user
    let err = recorder
        .save_sets_for_exercise(session.id, exercise_id, stranger.id, &[completed_set(1, 8, 40.0)], None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    // Exercise belongs to a different session
    let err = recorder
        .save_sets_for_exercise(other_session.id, exercise_id, user.id, &[completed_set(1, 8, 40.0)], None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}
