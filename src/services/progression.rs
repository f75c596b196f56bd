// ABOUTME: Progression recommendation engine: deterministic weight/rep suggestions
// ABOUTME: Pure rules over recent history fetched through the progress-query seam
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

//! Data-driven progression recommendations.
//!
//! The engine inspects up to the three most recent completed instances of a
//! catalog exercise and applies a fixed rule ladder with strict priority:
//! decrease weight beats increase weight, which beats increase reps, which
//! beats maintain. The engine is stateless and persists nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::progression::{
    DEFAULT_WEIGHT_INCREMENT_KG, EPLEY_DIVISOR, RECENT_HISTORY_LIMIT,
};
use crate::database::{ExerciseHistory, ProgressHistory};
use crate::errors::AppResult;

/// Estimated one-repetition maximum via the Epley formula.
///
/// `weight * (1 + reps/30)` for more than one rep; the weight itself for a
/// single rep; no value for non-positive inputs.
#[must_use]
pub fn estimate_one_rep_max(weight_kg: f64, reps: i32) -> Option<f64> {
    if reps <= 0 || weight_kg <= 0.0 {
        return None;
    }
    if reps == 1 {
        return Some(weight_kg);
    }
    Some(weight_kg * (1.0 + f64::from(reps) / EPLEY_DIVISOR))
}

/// What the engine suggests doing next
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    /// No history for this exercise yet
    FirstTime,
    /// Hit the top of the rep range consistently: add weight
    IncreaseWeight,
    /// Inside the rep range with room to grow: add reps at the same weight
    IncreaseReps,
    /// Missed the bottom of the rep range: back off
    DecreaseWeight,
    /// Keep working at the current prescription
    Maintain,
}

/// Aggregates derived from one past instance of the exercise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentPerformance {
    pub performed_at: DateTime<Utc>,
    /// Mean weight over completed sets; absent when no weight was logged
    pub avg_weight_kg: Option<f64>,
    /// Mean reps over completed sets, rounded
    pub avg_reps: i32,
    pub completed_sets: i32,
    /// Any completed set reached the top of the rep range
    pub hit_max_reps: bool,
    /// Every completed set reached at least the bottom of the rep range
    pub hit_min_reps: bool,
    /// Σ weight×reps over completed sets
    pub volume_kg: f64,
}

/// The engine's suggestion for the next session of one exercise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionRecommendation {
    pub exercise_id: Uuid,
    pub planned_sets: i32,
    pub reps_min: i32,
    pub reps_max: i32,
    pub recent_performance: Vec<RecentPerformance>,
    pub recommendation: RecommendationType,
    pub message: String,
    pub suggested_weight_kg: Option<f64>,
    pub suggested_reps: i32,
}

/// Stateless recommendation engine with a configurable weight increment
#[derive(Debug, Clone, Copy)]
pub struct ProgressionEngine {
    weight_increment_kg: f64,
}

impl Default for ProgressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressionEngine {
    /// Create an engine with the standard 2.5 kg increment
    #[must_use]
    pub const fn new() -> Self {
        Self {
            weight_increment_kg: DEFAULT_WEIGHT_INCREMENT_KG,
        }
    }

    /// Create an engine with a custom weight increment
    #[must_use]
    pub const fn with_increment(weight_increment_kg: f64) -> Self {
        Self {
            weight_increment_kg,
        }
    }

    /// Recommend the next weight/rep target for one exercise.
    ///
    /// Reads the user's recent history through the progress-query seam and
    /// applies the rule ladder; nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns a database error if the history fetch fails
    pub async fn recommend<P>(
        &self,
        history: &P,
        user_id: Uuid,
        exercise_id: Uuid,
        planned_sets: i32,
        reps_min: i32,
        reps_max: i32,
    ) -> AppResult<ProgressionRecommendation>
    where
        P: ProgressHistory + Sync + ?Sized,
    {
        let instances = history
            .recent_completed_exercises(user_id, exercise_id, RECENT_HISTORY_LIMIT)
            .await?;

        if instances.is_empty() {
            let midpoint = (reps_min + reps_max) / 2;
            return Ok(ProgressionRecommendation {
                exercise_id,
                planned_sets,
                reps_min,
                reps_max,
                recent_performance: Vec::new(),
                recommendation: RecommendationType::FirstTime,
                message: format!(
                    "First time doing this exercise. Start with a weight that lets you do \
                     {reps_min}-{reps_max} reps with good form."
                ),
                suggested_weight_kg: None,
                suggested_reps: midpoint,
            });
        }

        let recent = build_recent_performance(&instances, reps_min, reps_max);
        Ok(self.decide(exercise_id, planned_sets, reps_min, reps_max, recent))
    }

    /// Apply the rule ladder to the derived per-instance aggregates.
    ///
    /// Rule 1 (decrease) has strict priority over rule 2 (increase) even
    /// when both conditions hold.
    fn decide(
        &self,
        exercise_id: Uuid,
        planned_sets: i32,
        reps_min: i32,
        reps_max: i32,
        recent: Vec<RecentPerformance>,
    ) -> ProgressionRecommendation {
        let hit_max_count = recent.iter().filter(|p| p.hit_max_reps).count();
        let missed_min = recent.iter().any(|p| !p.hit_min_reps);
        // Most recent instance's average weight; history is newest first
        let last_weight = recent.iter().find_map(|p| p.avg_weight_kg);

        let avg_reps = if recent.is_empty() {
            0
        } else {
            let total: i32 = recent.iter().map(|p| p.avg_reps).sum();
            total / i32::try_from(recent.len()).unwrap_or(1)
        };

        let (recommendation, suggested_weight_kg, suggested_reps, message) = if missed_min {
            let weight = last_weight.map(|w| (w - self.weight_increment_kg).max(0.0));
            let message = format!(
                "You missed {reps_min} reps on some sets. Drop to {:.1} kg and focus on form.",
                weight.unwrap_or(0.0)
            );
            (RecommendationType::DecreaseWeight, weight, reps_min, message)
        } else if hit_max_count >= 2 && recent.len() >= 2 {
            let weight = last_weight.map(|w| w + self.weight_increment_kg);
            let message = format!(
                "Great progress! You have hit {reps_max} reps consistently. Move up to {:.1} kg.",
                weight.unwrap_or(0.0)
            );
            (RecommendationType::IncreaseWeight, weight, reps_min, message)
        } else if avg_reps >= reps_min && avg_reps < reps_max {
            let target = (avg_reps + 1).min(reps_max);
            let message = format!(
                "Good work. Keep {:.1} kg and aim for {target} reps on every set.",
                last_weight.unwrap_or(0.0)
            );
            (
                RecommendationType::IncreaseReps,
                last_weight,
                target,
                message,
            )
        } else {
            let target = if avg_reps > 0 {
                avg_reps
            } else {
                (reps_min + reps_max) / 2
            };
            let message = format!(
                "Stay with {:.1} kg x {reps_min}-{reps_max} reps and focus on rep quality.",
                last_weight.unwrap_or(0.0)
            );
            (RecommendationType::Maintain, last_weight, target, message)
        };

        ProgressionRecommendation {
            exercise_id,
            planned_sets,
            reps_min,
            reps_max,
            recent_performance: recent,
            recommendation,
            message,
            suggested_weight_kg,
            suggested_reps,
        }
    }
}

/// Derive per-instance aggregates from raw history.
///
/// Only completed sets with recorded reps count; instances without any are
/// dropped entirely.
fn build_recent_performance(
    instances: &[ExerciseHistory],
    reps_min: i32,
    reps_max: i32,
) -> Vec<RecentPerformance> {
    let mut result = Vec::with_capacity(instances.len());

    for instance in instances {
        let completed: Vec<_> = instance
            .sets
            .iter()
            .filter(|s| s.completed && s.reps.is_some())
            .collect();
        if completed.is_empty() {
            continue;
        }

        let weights: Vec<f64> = completed.iter().filter_map(|s| s.weight_kg).collect();
        let avg_weight = if weights.is_empty() {
            0.0
        } else {
            weights.iter().sum::<f64>() / precision_len(weights.len())
        };

        let reps: Vec<i32> = completed.iter().filter_map(|s| s.reps).collect();
        let avg_reps_f = f64::from(reps.iter().sum::<i32>()) / precision_len(reps.len());
        #[allow(clippy::cast_possible_truncation)]
        let avg_reps = avg_reps_f.round() as i32;

        let hit_max_reps = reps.iter().any(|r| *r >= reps_max);
        let hit_min_reps = reps.iter().all(|r| *r >= reps_min);

        let volume_kg = completed
            .iter()
            .filter_map(|s| {
                s.weight_kg
                    .map(|w| w * f64::from(s.reps.unwrap_or_default()))
            })
            .sum();

        result.push(RecentPerformance {
            performed_at: instance.performed_at,
            avg_weight_kg: (avg_weight > 0.0).then_some(avg_weight),
            avg_reps,
            completed_sets: i32::try_from(completed.len()).unwrap_or(i32::MAX),
            hit_max_reps,
            hit_min_reps,
            volume_kg,
        });
    }

    result
}

#[allow(clippy::cast_precision_loss)]
fn precision_len(len: usize) -> f64 {
    len as f64
}
