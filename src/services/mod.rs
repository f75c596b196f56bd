// ABOUTME: Domain service layer hosting the five engine components
// ABOUTME: Session lifecycle, set recorder, XP ledger, achievements, progression
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

//! # Service Layer
//!
//! Protocol-agnostic business logic. Every mutating operation here is a
//! single atomic unit of work: it opens one database transaction, reads the
//! current aggregate state, writes the derived update, and commits — so a
//! failure aborts the whole operation and racing requests cannot produce
//! lost updates.

/// Achievement evaluator: threshold checks and one-time unlocks
pub mod achievements;

/// Progression recommendation engine (stateless)
pub mod progression;

/// Session lifecycle manager: start/skip/discard/finish/reorder
pub mod sessions;

/// Set recorder: idempotent per-set upsert with aggregate recompute
pub mod sets;

/// XP ledger: append-only events over a mutable balance
pub mod xp_ledger;

pub use achievements::AchievementEvaluator;
pub use progression::{
    estimate_one_rep_max, ProgressionEngine, ProgressionRecommendation, RecentPerformance,
    RecommendationType,
};
pub use sessions::{ExerciseDetail, SessionDetail, SessionService};
pub use sets::SetRecorder;
pub use xp_ledger::XpLedger;
