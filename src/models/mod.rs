// ABOUTME: Core data models for the workout execution and progression engine
// ABOUTME: Re-exports session, set, XP, achievement, and user structures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

//! # Data Models
//!
//! Flat data structures used throughout the engine. Parent/child graphs
//! (session → exercises → sets) are modeled as separate tables keyed by
//! surrogate id with child rows holding a back-reference field, never as
//! embedded mutual object pointers.

/// Achievement catalog and per-user unlock records
pub mod achievement;

/// Routine template read model (routine/catalog collaborator interface)
pub mod template;

/// User XP state and rank tiers
pub mod user;

/// Workout session, exercise, and set structures
pub mod workout;

/// XP ledger events
pub mod xp;

pub use achievement::{Achievement, AchievementStatus, UnlockedAchievement, UserAchievement};
pub use template::{CreateTemplateRequest, TemplateExercise, TemplateExerciseSpec, TemplateSession};
pub use user::{User, XpRank};
pub use workout::{
    CustomExerciseItem, CustomWorkoutRequest, ExerciseStatus, SessionStatus, SetInput,
    WorkoutExercise, WorkoutSession, WorkoutSet,
};
pub use xp::{XpEvent, XpEventType};
