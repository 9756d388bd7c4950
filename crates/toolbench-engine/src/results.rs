//! Result aggregation
//!
//! [`ModelResults`] keeps the raw run sequence for one model and derives every
//! statistic from it on demand. [`BenchmarkResults`] collects one scenario's
//! models in the order they were benchmarked.

use serde::{Deserialize, Serialize};

use toolbench_core::RunOutcome;

/// Every run of one model in one scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResults {
    model_name: String,
    runs: Vec<RunOutcome>,
    /// Distinct error messages, first-seen order
    errors: Vec<String>,
}

impl ModelResults {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            runs: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn add_run(&mut self, run: RunOutcome) {
        if let Some(error) = &run.error {
            if !self.errors.contains(error) {
                self.errors.push(error.clone());
            }
        }
        self.runs.push(run);
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn runs(&self) -> &[RunOutcome] {
        &self.runs
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub fn success_count(&self) -> usize {
        self.runs.iter().filter(|r| r.success).count()
    }

    pub fn success_rate(&self) -> f64 {
        if self.runs.is_empty() {
            return 0.0;
        }
        self.success_count() as f64 / self.runs.len() as f64
    }

    /// Mean accuracy over successful runs only
    pub fn average_accuracy(&self) -> f64 {
        mean(self.runs.iter().filter(|r| r.success).map(|r| r.accuracy_score))
    }

    pub fn average_time(&self) -> f64 {
        mean(self.runs.iter().map(|r| r.execution_time_ms as f64))
    }

    pub fn average_cost(&self) -> f64 {
        mean(self.runs.iter().map(|r| r.cost))
    }

    /// Mean of prompt plus completion tokens
    pub fn average_tokens(&self) -> f64 {
        mean(self.runs.iter().map(|r| r.total_tokens() as f64))
    }

    pub fn average_tool_calls(&self) -> f64 {
        mean(self.runs.iter().map(|r| r.tool_calls_made as f64))
    }

    /// At least one run succeeded
    pub fn is_viable(&self) -> bool {
        self.success_rate() > 0.0
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            model_name: self.model_name.clone(),
            runs: self.run_count(),
            success_rate: self.success_rate(),
            average_accuracy: self.average_accuracy(),
            average_time_ms: self.average_time(),
            average_cost: self.average_cost(),
            average_tokens: self.average_tokens(),
            average_tool_calls: self.average_tool_calls(),
            errors: self.errors.clone(),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Derived statistics for one model, as persisted in snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model_name: String,
    pub runs: usize,
    pub success_rate: f64,
    pub average_accuracy: f64,
    pub average_time_ms: f64,
    pub average_cost: f64,
    pub average_tokens: f64,
    pub average_tool_calls: f64,
    pub errors: Vec<String>,
}

/// Why a provider or model produced no runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Missing credentials or runtime not reachable
    ProviderUnavailable { api_key_env_var: Option<String> },
    NoPricing,
    NoToolCalling,
    /// Session creation failed with a configuration error
    Configuration { message: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProviderUnavailable {
                api_key_env_var: Some(var),
            } => write!(f, "API key not configured (Set {})", var),
            Self::ProviderUnavailable { api_key_env_var: None } => write!(f, "not available"),
            Self::NoPricing => write!(f, "pricing not configured"),
            Self::NoToolCalling => write!(f, "does not support tool calling"),
            Self::Configuration { message } => write!(f, "{}", message),
        }
    }
}

/// A provider (by name) or model (by full name) that was skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skipped {
    pub name: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

impl Skipped {
    pub fn new(name: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            name: name.into(),
            reason,
        }
    }
}

/// All models benchmarked against one scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResults {
    scenario_name: String,
    models: Vec<ModelResults>,
    skipped: Vec<Skipped>,
    interrupted: bool,
}

impl BenchmarkResults {
    pub fn new(scenario_name: impl Into<String>) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            ..Default::default()
        }
    }

    /// Add a model's results. A model already present is replaced in place.
    pub fn add_result(&mut self, results: ModelResults) {
        match self
            .models
            .iter_mut()
            .find(|m| m.model_name == results.model_name)
        {
            Some(existing) => *existing = results,
            None => self.models.push(results),
        }
    }

    pub fn add_skipped(&mut self, skipped: Skipped) {
        self.skipped.push(skipped);
    }

    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    pub fn get(&self, model_name: &str) -> Option<&ModelResults> {
        self.models.iter().find(|m| m.model_name == model_name)
    }

    /// Models in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ModelResults> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }

    /// The run was cut short by cancellation
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// Whether any model achieved a non-zero success rate
    pub fn any_success(&self) -> bool {
        self.models.iter().any(ModelResults::is_viable)
    }
}
