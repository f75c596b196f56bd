// ABOUTME: Integration tests for the XP ledger and the achievement evaluator
// ABOUTME: Covers balance invariants, rank derivation, and one-time unlock semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use common::{create_test_database, create_test_template, create_test_user, full_exercise_inputs};
use repforge::constants::achievements as codes;
use repforge::errors::ErrorCode;
use repforge::models::{XpEventType, XpRank};
use repforge::services::{AchievementEvaluator, SessionService, SetRecorder, XpLedger};
use uuid::Uuid;

#[tokio::test]
async fn test_balances_are_event_sums() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let ledger = XpLedger::new(db.clone());

    ledger
        .grant_xp(user.id, 100, XpEventType::ManualAdjustment, "seed")
        .await
        .unwrap();
    ledger
        .grant_xp(user.id, 50, XpEventType::ManualAdjustment, "seed")
        .await
        .unwrap();
    ledger.spend_xp(user.id, 30, None, "unlock").await.unwrap();

    let stored = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.xp_points, 120);
    assert_eq!(stored.lifetime_xp, 150);

    let events = ledger.events(user.id).await.unwrap();
    let delta_sum: i64 = events.iter().map(|e| e.delta).sum();
    let positive_sum: i64 = events.iter().map(|e| e.delta.max(0)).sum();
    assert_eq!(delta_sum, stored.xp_points);
    assert_eq!(positive_sum, stored.lifetime_xp);
}

#[tokio::test]
async fn test_non_positive_grant_is_a_noop() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let ledger = XpLedger::new(db.clone());

    ledger
        .grant_xp(user.id, 0, XpEventType::ManualAdjustment, "nothing")
        .await
        .unwrap();
    ledger
        .grant_xp(user.id, -25, XpEventType::ManualAdjustment, "nothing")
        .await
        .unwrap();

    assert!(ledger.events(user.id).await.unwrap().is_empty());
    let stored = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.xp_points, 0);
    assert_eq!(stored.lifetime_xp, 0);
}

#[tokio::test]
async fn test_overspending_fails_and_appends_nothing() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let ledger = XpLedger::new(db.clone());

    ledger
        .grant_xp(user.id, 40, XpEventType::ManualAdjustment, "seed")
        .await
        .unwrap();

    let err = ledger.spend_xp(user.id, 100, None, "too much").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientBalance);

    let err = ledger.spend_xp(user.id, 0, None, "zero").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidArgument);

    let stored = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.xp_points, 40);
    assert_eq!(ledger.events(user.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rank_never_regresses_from_spending() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let ledger = XpLedger::new(db.clone());

    ledger
        .grant_xp(user.id, 1_200, XpEventType::ManualAdjustment, "seed")
        .await
        .unwrap();
    let stored = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.rank, XpRank::NoviceII);

    ledger.spend_xp(user.id, 1_000, None, "big spend").await.unwrap();

    let stored = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.xp_points, 200);
    assert_eq!(stored.lifetime_xp, 1_200);
    assert_eq!(stored.rank, XpRank::NoviceII);
}

#[tokio::test]
async fn test_try_unlock_fires_at_most_once() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let evaluator = AchievementEvaluator::new(db.clone());

    let first = evaluator
        .try_unlock(user.id, codes::FIRST_WORKOUT)
        .await
        .unwrap();
    assert!(first.is_some());
    assert_eq!(first.unwrap().xp_reward, 50);

    let second = evaluator
        .try_unlock(user.id, codes::FIRST_WORKOUT)
        .await
        .unwrap();
    assert!(second.is_none());

    // Reward XP granted exactly once
    let stored = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.xp_points, 50);

    let unlocked: Vec<_> = evaluator
        .list_for_user(user.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.unlocked)
        .collect();
    assert_eq!(unlocked.len(), 1);
}

#[tokio::test]
async fn test_unknown_code_is_a_noop() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let evaluator = AchievementEvaluator::new(db.clone());

    let unlocked = evaluator.try_unlock(user.id, "NO_SUCH_CODE").await.unwrap();
    assert!(unlocked.is_none());
}

#[tokio::test]
async fn test_workout_completion_unlocks_and_surfaces() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let (template, _) = create_test_template(&db, user.id, 100, 1).await;
    let evaluator = AchievementEvaluator::new(db.clone());

    let session = SessionService::new(db.clone())
        .start_session(user.id, template.id)
        .await
        .unwrap();
    let exercise_id = db.list_session_exercises(session.id).await.unwrap()[0].id;
    SetRecorder::new(db.clone())
        .save_sets_for_exercise(session.id, exercise_id, user.id, &full_exercise_inputs(9, 50.0), None)
        .await
        .unwrap();

    let unseen = evaluator.unseen_for_user(user.id).await.unwrap();
    assert!(unseen.iter().any(|a| a.code == codes::FIRST_WORKOUT));

    evaluator
        .mark_seen(user.id, &[codes::FIRST_WORKOUT.to_owned()])
        .await
        .unwrap();
    let unseen = evaluator.unseen_for_user(user.id).await.unwrap();
    assert!(unseen.iter().all(|a| a.code != codes::FIRST_WORKOUT));
}

#[tokio::test]
async fn test_lifetime_xp_thresholds_unlock_without_feeding_themselves() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let ledger = XpLedger::new(db.clone());
    let evaluator = AchievementEvaluator::new(db.clone());

    ledger
        .grant_xp(user.id, 1_500, XpEventType::ManualAdjustment, "seed")
        .await
        .unwrap();

    let unlocked = evaluator
        .evaluate_workout_achievements(user.id)
        .await
        .unwrap();
    assert!(unlocked.iter().any(|a| a.code == codes::XP_1000));
    assert!(unlocked.iter().all(|a| a.code != codes::XP_5000));

    // XP achievements carry no reward, so the balance is untouched
    let stored = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.lifetime_xp, 1_500);

    // Re-running the evaluation is safe and unlocks nothing new
    let again = evaluator
        .evaluate_workout_achievements(user.id)
        .await
        .unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_routine_creation_threshold() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let evaluator = AchievementEvaluator::new(db.clone());

    // No routines yet: nothing fires
    let unlocked = evaluator.on_routine_created(user.id).await.unwrap();
    assert!(unlocked.is_empty());

    create_test_template(&db, user.id, 100, 1).await;
    let unlocked = evaluator.on_routine_created(user.id).await.unwrap();
    assert!(unlocked.iter().any(|a| a.code == codes::FIRST_ROUTINE_CREATED));

    let stored = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.xp_points, 75);
}

#[tokio::test]
async fn test_skipped_sessions_count_toward_workout_thresholds() {
    let db = create_test_database().await;
    let user = create_test_user(&db).await;
    let (template, _) = create_test_template(&db, user.id, 100, 1).await;
    let evaluator = AchievementEvaluator::new(db.clone());

    // A skip produces a zero-credit COMPLETED session, which the
    // workout-count aggregate includes
    SessionService::new(db.clone())
        .skip_session(user.id, template.id)
        .await
        .unwrap();

    let unlocked = evaluator
        .evaluate_workout_achievements(user.id)
        .await
        .unwrap();
    assert!(unlocked.iter().any(|a| a.code == codes::FIRST_WORKOUT));
}

#[tokio::test]
async fn test_grant_for_missing_user_is_not_found() {
    let db = create_test_database().await;
    let ledger = XpLedger::new(db.clone());

    let err = ledger
        .grant_xp(Uuid::new_v4(), 10, XpEventType::ManualAdjustment, "ghost")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}
