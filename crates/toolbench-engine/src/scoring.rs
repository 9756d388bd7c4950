//! Scoring and winner selection
//!
//! Composite score out of 100: reliability 50, accuracy 30, speed up to 15,
//! cost up to 5. Speed and cost are capped so a fast or cheap but unreliable
//! model cannot outrank a reliable one. Only viable models are scored.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::results::{BenchmarkResults, ModelResults};

pub const RELIABILITY_WEIGHT: f64 = 50.0;
pub const ACCURACY_WEIGHT: f64 = 30.0;
pub const MAX_SPEED_SCORE: f64 = 15.0;
/// Average time (ms) worth one speed point
pub const SPEED_REFERENCE_MS: f64 = 15_000.0;
pub const MAX_COST_SCORE: f64 = 5.0;
/// Average cost ($) worth one cost point
pub const COST_REFERENCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub reliability: f64,
    pub accuracy: f64,
    pub speed: f64,
    pub cost: f64,
}

impl ScoreBreakdown {
    pub fn from_stats(
        success_rate: f64,
        average_accuracy: f64,
        average_time_ms: f64,
        average_cost: f64,
    ) -> Self {
        let speed = if average_time_ms > 0.0 {
            MAX_SPEED_SCORE.min(SPEED_REFERENCE_MS / average_time_ms)
        } else {
            0.0
        };
        let cost = if average_cost > 0.0 {
            MAX_COST_SCORE.min(COST_REFERENCE / average_cost)
        } else {
            MAX_COST_SCORE
        };

        Self {
            reliability: success_rate * RELIABILITY_WEIGHT,
            accuracy: average_accuracy * ACCURACY_WEIGHT,
            speed,
            cost,
        }
    }

    pub fn for_results(results: &ModelResults) -> Self {
        Self::from_stats(
            results.success_rate(),
            results.average_accuracy(),
            results.average_time(),
            results.average_cost(),
        )
    }

    pub fn total(&self) -> f64 {
        self.reliability + self.accuracy + self.speed + self.cost
    }
}

impl fmt::Display for ScoreBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reliability={:.1}, accuracy={:.1}, speed={:.1}, cost={:.1}",
            self.reliability, self.accuracy, self.speed, self.cost
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub model_name: String,
    pub breakdown: ScoreBreakdown,
}

impl ModelScore {
    pub fn total(&self) -> f64 {
        self.breakdown.total()
    }
}

/// Scores for one scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Viable models, insertion order
    scores: Vec<ModelScore>,
    /// Models with zero success rate, insertion order
    disqualified: Vec<String>,
}

impl Ranking {
    pub fn rank(results: &BenchmarkResults) -> Self {
        let mut ranking = Self::default();
        for model in results.iter() {
            if model.is_viable() {
                ranking.scores.push(ModelScore {
                    model_name: model.model_name().to_string(),
                    breakdown: ScoreBreakdown::for_results(model),
                });
            } else {
                ranking.disqualified.push(model.model_name().to_string());
            }
        }
        ranking
    }

    pub fn scores(&self) -> &[ModelScore] {
        &self.scores
    }

    pub fn disqualified(&self) -> &[String] {
        &self.disqualified
    }

    pub fn score_of(&self, model_name: &str) -> Option<&ModelScore> {
        self.scores.iter().find(|s| s.model_name == model_name)
    }

    /// Highest total; on a tie the first-seen model wins
    pub fn winner(&self) -> Option<&ModelScore> {
        first_max(&self.scores, ModelScore::total)
    }

    /// Scores by total, descending. Equal totals keep insertion order.
    pub fn sorted(&self) -> Vec<&ModelScore> {
        let mut sorted: Vec<_> = self.scores.iter().collect();
        sorted.sort_by(|a, b| descending(a.total(), b.total()));
        sorted
    }
}

/// First element with the strictly greatest key
pub(crate) fn first_max<T, F>(items: &[T], key: F) -> Option<&T>
where
    F: Fn(&T) -> f64,
{
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let value = key(item);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((item, value)),
        }
    }
    best.map(|(item, _)| item)
}

pub(crate) fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// One line of the "no winner" breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureSummary {
    pub model_name: String,
    /// Distinct error messages seen
    pub error_count: usize,
    pub average_time_ms: f64,
}

/// Every model's failure profile, fastest first
pub fn failure_breakdown(results: &BenchmarkResults) -> Vec<FailureSummary> {
    let mut breakdown: Vec<_> = results
        .iter()
        .map(|m| FailureSummary {
            model_name: m.model_name().to_string(),
            error_count: m.errors().len(),
            average_time_ms: m.average_time(),
        })
        .collect();
    breakdown.sort_by(|a, b| {
        a.average_time_ms
            .partial_cmp(&b.average_time_ms)
            .unwrap_or(Ordering::Equal)
    });
    breakdown
}
