//! Cross-scenario ranking
//!
//! Per-scenario totals of the same model are summed, not averaged, so a
//! model that is viable in more scenarios ranks higher.

use serde::{Deserialize, Serialize};

use crate::results::BenchmarkResults;
use crate::scoring::{descending, first_max, Ranking};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallScore {
    pub model_name: String,
    /// Sum of per-scenario totals
    pub total: f64,
    /// Scenarios in which the model was viable
    pub scenarios_scored: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterResults {
    scenarios: Vec<BenchmarkResults>,
    /// First-seen order
    totals: Vec<OverallScore>,
}

impl MasterResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scenario(&mut self, results: BenchmarkResults) {
        let ranking = Ranking::rank(&results);
        for score in ranking.scores() {
            match self
                .totals
                .iter_mut()
                .find(|t| t.model_name == score.model_name)
            {
                Some(existing) => {
                    existing.total += score.total();
                    existing.scenarios_scored += 1;
                }
                None => self.totals.push(OverallScore {
                    model_name: score.model_name.clone(),
                    total: score.total(),
                    scenarios_scored: 1,
                }),
            }
        }
        self.scenarios.push(results);
    }

    pub fn scenarios(&self) -> &[BenchmarkResults] {
        &self.scenarios
    }

    pub fn totals(&self) -> &[OverallScore] {
        &self.totals
    }

    pub fn total_of(&self, model_name: &str) -> Option<f64> {
        self.totals
            .iter()
            .find(|t| t.model_name == model_name)
            .map(|t| t.total)
    }

    /// Summed scores, best first. Equal totals keep first-seen order.
    pub fn overall_ranking(&self) -> Vec<&OverallScore> {
        let mut ranking: Vec<_> = self.totals.iter().collect();
        ranking.sort_by(|a, b| descending(a.total, b.total));
        ranking
    }

    pub fn overall_winner(&self) -> Option<&OverallScore> {
        first_max(&self.totals, |t| t.total)
    }

    /// Models benchmarked somewhere but never viable anywhere
    pub fn disqualified(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for model in self.scenarios.iter().flat_map(|s| s.iter()) {
            let name = model.model_name();
            if self.total_of(name).is_none() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn interrupted(&self) -> bool {
        self.scenarios.iter().any(BenchmarkResults::interrupted)
    }
}
