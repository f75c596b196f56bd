// ABOUTME: XP ledger service: grants, spends, and the event history feed
// ABOUTME: Balances are derived sums; lifetime XP only ever grows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::database::{self, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{XpEvent, XpEventType, XpRank};

/// Append-only event log plus mutable balance and rank lookup
#[derive(Clone)]
pub struct XpLedger {
    db: Database,
}

impl XpLedger {
    /// Create a new XP ledger over the given database
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Grant XP to a user. No-op for non-positive amounts.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist, or a database error
    pub async fn grant_xp(
        &self,
        user_id: Uuid,
        amount: i64,
        event_type: XpEventType,
        description: &str,
    ) -> AppResult<()> {
        let mut tx = self.db.pool().begin().await?;
        grant_xp_tx(&mut tx, user_id, amount, event_type, description).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Spend XP from a user's balance (e.g. a routine purchase).
    ///
    /// Lifetime XP is untouched, so the rank never regresses from spending.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for non-positive amounts, `NotFound` if the
    /// user does not exist, and `InsufficientBalance` if the balance does
    /// not cover the spend
    pub async fn spend_xp(
        &self,
        user_id: Uuid,
        amount: i64,
        reference_id: Option<Uuid>,
        description: &str,
    ) -> AppResult<()> {
        let mut tx = self.db.pool().begin().await?;
        spend_xp_tx(&mut tx, user_id, amount, reference_id, description).await?;
        tx.commit().await?;
        Ok(())
    }

    /// A user's XP event history, newest first
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn events(&self, user_id: Uuid) -> AppResult<Vec<XpEvent>> {
        Ok(self.db.list_xp_events(user_id).await?)
    }
}

/// Grant XP within an existing transaction.
///
/// Updates the balance, lifetime credit, and rank, then appends the
/// immutable positive-delta event. Callers compose this into larger atomic
/// operations (workout completion, achievement unlock).
pub(crate) async fn grant_xp_tx(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    amount: i64,
    event_type: XpEventType,
    description: &str,
) -> AppResult<()> {
    if amount <= 0 {
        return Ok(());
    }

    let user = database::users::get_user(conn, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let xp_points = user.xp_points + amount;
    let lifetime_xp = user.lifetime_xp + amount;
    let rank = XpRank::from_lifetime_xp(lifetime_xp);

    database::xp::update_user_xp(conn, user_id, xp_points, lifetime_xp, rank).await?;

    let event = XpEvent::new(user_id, amount, event_type, Some(description.to_owned()), None);
    database::xp::insert_xp_event(conn, &event).await?;

    debug!(%user_id, amount, ?event_type, lifetime_xp, "granted xp");
    Ok(())
}

/// Spend XP within an existing transaction.
pub(crate) async fn spend_xp_tx(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    amount: i64,
    reference_id: Option<Uuid>,
    description: &str,
) -> AppResult<()> {
    if amount <= 0 {
        return Err(AppError::invalid_argument(format!(
            "XP spend amount must be positive, got {amount}"
        )));
    }

    let user = database::users::get_user(conn, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if user.xp_points < amount {
        return Err(AppError::insufficient_balance(format!(
            "spend of {amount} XP exceeds balance of {}",
            user.xp_points
        )));
    }

    // Lifetime XP stays put: rank is derived from it and must not regress
    database::xp::update_user_xp(conn, user_id, user.xp_points - amount, user.lifetime_xp, user.rank)
        .await?;

    let event = XpEvent::new(
        user_id,
        -amount,
        XpEventType::RoutinePurchase,
        Some(description.to_owned()),
        reference_id,
    );
    database::xp::insert_xp_event(conn, &event).await?;

    debug!(%user_id, amount, "spent xp");
    Ok(())
}
