// ABOUTME: User XP state owned by the engine and the derived rank tiers
// ABOUTME: Identity and auth fields belong to the external user collaborator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Rank tier derived from lifetime XP.
///
/// The tier table is scanned for the highest threshold that does not exceed
/// the user's lifetime XP; the first tier is the floor. Spending XP never
/// lowers lifetime XP, so a rank can never regress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum XpRank {
    NoviceI,
    NoviceII,
    NoviceIII,
    IntermediateI,
    IntermediateII,
    IntermediateIII,
    AdvancedI,
    AdvancedII,
    AdvancedIII,
    Elite,
    Master,
    Legend,
}

impl XpRank {
    /// Ordered tier table, ascending by threshold
    pub const TIERS: &'static [Self] = &[
        Self::NoviceI,
        Self::NoviceII,
        Self::NoviceIII,
        Self::IntermediateI,
        Self::IntermediateII,
        Self::IntermediateIII,
        Self::AdvancedI,
        Self::AdvancedII,
        Self::AdvancedIII,
        Self::Elite,
        Self::Master,
        Self::Legend,
    ];

    /// Minimum lifetime XP required for this tier
    #[must_use]
    pub const fn min_xp(&self) -> i64 {
        match self {
            Self::NoviceI => 0,
            Self::NoviceII => 1_000,
            Self::NoviceIII => 2_500,
            Self::IntermediateI => 5_000,
            Self::IntermediateII => 10_000,
            Self::IntermediateIII => 20_000,
            Self::AdvancedI => 35_000,
            Self::AdvancedII => 55_000,
            Self::AdvancedIII => 80_000,
            Self::Elite => 110_000,
            Self::Master => 150_000,
            Self::Legend => 200_000,
        }
    }

    /// Get display name for this rank
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::NoviceI => "Novice I",
            Self::NoviceII => "Novice II",
            Self::NoviceIII => "Novice III",
            Self::IntermediateI => "Intermediate I",
            Self::IntermediateII => "Intermediate II",
            Self::IntermediateIII => "Intermediate III",
            Self::AdvancedI => "Advanced I",
            Self::AdvancedII => "Advanced II",
            Self::AdvancedIII => "Advanced III",
            Self::Elite => "Elite",
            Self::Master => "Master",
            Self::Legend => "Legend",
        }
    }

    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoviceI => "novice_i",
            Self::NoviceII => "novice_ii",
            Self::NoviceIII => "novice_iii",
            Self::IntermediateI => "intermediate_i",
            Self::IntermediateII => "intermediate_ii",
            Self::IntermediateIII => "intermediate_iii",
            Self::AdvancedI => "advanced_i",
            Self::AdvancedII => "advanced_ii",
            Self::AdvancedIII => "advanced_iii",
            Self::Elite => "elite",
            Self::Master => "master",
            Self::Legend => "legend",
        }
    }

    /// Rank corresponding to an accumulated lifetime XP amount
    #[must_use]
    pub fn from_lifetime_xp(lifetime_xp: i64) -> Self {
        let mut result = Self::NoviceI;
        for rank in Self::TIERS {
            if lifetime_xp >= rank.min_xp() {
                result = *rank;
            } else {
                break;
            }
        }
        result
    }
}

impl Display for XpRank {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for XpRank {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::TIERS
            .iter()
            .find(|rank| rank.as_str() == s)
            .copied()
            .ok_or_else(|| AppError::invalid_argument(format!("Invalid XP rank: {s}")))
    }
}

/// A user's XP-bearing row.
///
/// `xp_points` is the spendable balance (sum of all event deltas);
/// `lifetime_xp` accumulates positive credit only and is monotonic
/// non-decreasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub xp_points: i64,
    pub lifetime_xp: i64,
    pub rank: XpRank,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl User {
    /// Create a new user with zeroed XP state
    #[must_use]
    pub fn new(email: String, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            display_name,
            xp_points: 0,
            lifetime_xp: 0,
            rank: XpRank::NoviceI,
            created_at: now,
            last_active: now,
        }
    }
}
