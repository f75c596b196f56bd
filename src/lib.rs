// ABOUTME: Main library entry point for the RepForge workout execution engine
// ABOUTME: Exposes session lifecycle, set recording, XP ledger, achievements, and progression
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

#![deny(unsafe_code)]

//! # RepForge
//!
//! The workout execution and progression engine of a fitness-routine
//! tracking backend. It turns a static routine template into a live,
//! mutable session, records set-by-set performance, derives progress and
//! experience-point (XP) credit, triggers threshold-based achievement
//! unlocks, and computes data-driven progression recommendations from
//! recent history.
//!
//! ## Architecture
//!
//! The engine is a library with no wire protocol of its own; it is invoked
//! through whatever request layer the host system exposes:
//! - **Models**: flat, surrogate-id data structures for sessions,
//!   exercises, sets, XP events, and achievements
//! - **Database**: `SQLite` persistence with idempotent migrations and
//!   transactional write helpers
//! - **Services**: the five engine components (session lifecycle, set
//!   recorder, XP ledger, achievement evaluator, progression engine)
//! - **Config**: environment-based runtime configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use repforge::config::environment::ServerConfig;
//! use repforge::database::Database;
//! use repforge::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     let database = Database::new(&config.database_url).await?;
//!     println!("repforge ready on {}", config.database_url);
//!     Ok(())
//! }
//! ```

/// Environment-based configuration management
pub mod config;

/// Application constants: rank tiers, achievement thresholds, defaults
pub mod constants;

/// `SQLite` persistence layer with migrations and transactional helpers
pub mod database;

/// Unified error handling system with standard error codes
pub mod errors;

/// Structured logging setup built on `tracing`
pub mod logging;

/// Core data models for sessions, sets, XP, and achievements
pub mod models;

/// Domain service layer: the five engine components
pub mod services;
