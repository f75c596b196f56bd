// ABOUTME: Database management for the workout engine on SQLite via sqlx
// ABOUTME: Owns the connection pool, idempotent migrations, and catalog seeding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

//! # Database Management
//!
//! `SQLite` persistence for the workout engine. Tables are created by
//! idempotent migrations at startup; the achievement catalog is seeded when
//! empty. Mutating service operations run inside a transaction obtained
//! from [`Database::pool`], and the per-table write helpers in this module
//! take a `&mut SqliteConnection` so they compose into that transaction.

pub(crate) mod achievements;
mod progress;
pub(crate) mod templates;
pub(crate) mod users;
pub(crate) mod workouts;
pub(crate) mod xp;

pub use progress::{ExerciseHistory, ProgressHistory};

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};

/// Database manager for the engine's persistent state
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection, run migrations, and seed the
    /// achievement catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, a migration, or the seed fails
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_string()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;
        db.seed_achievements().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for transactions and advanced
    /// operations
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_templates().await?;
        self.migrate_workouts().await?;
        self.migrate_xp().await?;
        self.migrate_achievements().await?;
        Ok(())
    }
}
