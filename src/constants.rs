// ABOUTME: System-wide constants and configuration values for the workout engine
// ABOUTME: Contains achievement thresholds, progression defaults, and env-var configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

//! # Constants Module
//!
//! Application constants and environment-based configuration values.
//! Threshold tables are ordered arrays scanned for the last satisfied
//! entry; no dynamic dispatch is involved.

/// Achievement codes and the threshold tables that award them
pub mod achievements {
    /// Unlocked after the first completed workout
    pub const FIRST_WORKOUT: &str = "FIRST_WORKOUT";
    /// Unlocked after 10 completed workouts
    pub const TEN_WORKOUTS: &str = "TEN_WORKOUTS";
    /// Unlocked after 25 completed workouts
    pub const TWENTY_FIVE_WORKOUTS: &str = "TWENTY_FIVE_WORKOUTS";
    /// Unlocked after 50 completed workouts
    pub const FIFTY_WORKOUTS: &str = "FIFTY_WORKOUTS";
    /// Unlocked after 100 completed workouts
    pub const HUNDRED_WORKOUTS: &str = "HUNDRED_WORKOUTS";
    /// Unlocked after authoring the first routine template
    pub const FIRST_ROUTINE_CREATED: &str = "FIRST_ROUTINE_CREATED";
    /// Unlocked at 1,000 lifetime XP
    pub const XP_1000: &str = "XP_1000";
    /// Unlocked at 5,000 lifetime XP
    pub const XP_5000: &str = "XP_5000";
    /// Unlocked at 10,000 lifetime XP
    pub const XP_10000: &str = "XP_10000";

    /// Completed-workout count thresholds, ascending
    pub const WORKOUT_COUNT_THRESHOLDS: &[(i64, &str)] = &[
        (1, FIRST_WORKOUT),
        (10, TEN_WORKOUTS),
        (25, TWENTY_FIVE_WORKOUTS),
        (50, FIFTY_WORKOUTS),
        (100, HUNDRED_WORKOUTS),
    ];

    /// Routines-created thresholds, ascending
    pub const ROUTINE_COUNT_THRESHOLDS: &[(i64, &str)] = &[(1, FIRST_ROUTINE_CREATED)];

    /// Lifetime-XP thresholds, ascending. The XP achievements carry no
    /// reward of their own so they cannot feed themselves.
    pub const LIFETIME_XP_THRESHOLDS: &[(i64, &str)] =
        &[(1000, XP_1000), (5000, XP_5000), (10_000, XP_10000)];
}

/// Progression recommendation defaults
pub mod progression {
    /// Standard weight increment between sessions, in kilograms
    pub const DEFAULT_WEIGHT_INCREMENT_KG: f64 = 2.5;

    /// How many recent completed instances the algorithm inspects
    pub const RECENT_HISTORY_LIMIT: i64 = 3;

    /// Divisor in the Epley one-rep-max estimate `w * (1 + reps / 30)`
    pub const EPLEY_DIVISOR: f64 = 30.0;
}

/// Environment-based configuration
pub mod env_config {
    use std::env;

    /// Get database `URL` from environment or default
    #[must_use]
    pub fn database_url() -> String {
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./data/repforge.db".into())
    }

    /// Get log level from environment or default
    #[must_use]
    pub fn log_level() -> String {
        env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
    }

    /// Get deployment environment from environment variable or default
    #[must_use]
    pub fn environment() -> String {
        env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
    }

    /// Get the progression weight increment from environment or default
    #[must_use]
    pub fn weight_increment_kg() -> f64 {
        env::var("WEIGHT_INCREMENT_KG")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(super::progression::DEFAULT_WEIGHT_INCREMENT_KG)
    }
}
