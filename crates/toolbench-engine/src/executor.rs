//! Single-run executor
//!
//! Runs one trial (a scenario's prompts against one model) on its own task
//! under a hard deadline. When the deadline wins the task is aborted and
//! joined before the timeout outcome is returned.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, Instrument};

use toolbench_core::{BenchConfig, Provider, ProviderError, RunOutcome, Scenario, TokenUsage};

/// Characters of each prompt shown in logs
const PROMPT_LOG_CHARS: usize = 50;

#[derive(Debug, Clone)]
pub struct SingleRunExecutor {
    timeout: Duration,
}

impl SingleRunExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &BenchConfig) -> Self {
        Self::new(config.timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute one trial.
    ///
    /// Runtime failures, including the deadline, come back as failed
    /// outcomes. Only configuration errors from session creation are
    /// returned as `Err`, so callers can skip the model instead of counting
    /// a failed run.
    pub async fn execute(
        &self,
        provider: &Arc<dyn Provider>,
        model: &str,
        scenario: &Arc<Scenario>,
    ) -> Result<RunOutcome, ProviderError> {
        let full_model_name = provider.full_model_name(model);
        let span = tracing::info_span!("trial", model = %full_model_name);

        let trial = {
            let provider = Arc::clone(provider);
            let scenario = Arc::clone(scenario);
            let model = model.to_string();
            async move { run_trial(provider.as_ref(), &model, &scenario).await }.instrument(span)
        };
        let mut handle = tokio::spawn(trial);

        match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(Ok(Ok(outcome))) => Ok(outcome),
            Ok(Ok(Err(e))) if e.is_configuration() => Err(e),
            Ok(Ok(Err(e))) => {
                error!(model = %full_model_name, error = %e, "Error in test run");
                Ok(RunOutcome::failure(e.to_string()))
            }
            Ok(Err(join_error)) => {
                error!(model = %full_model_name, error = %join_error, "Trial task failed");
                Ok(RunOutcome::failure(format!("Trial task failed: {}", join_error)))
            }
            Err(_) => {
                handle.abort();
                // Join so the worker is gone before we report.
                let _ = handle.await;
                error!(
                    model = %full_model_name,
                    timeout_secs = self.timeout.as_secs(),
                    "Test run timed out"
                );
                Ok(RunOutcome::timeout(self.timeout.as_secs()))
            }
        }
    }
}

async fn run_trial(
    provider: &dyn Provider,
    model: &str,
    scenario: &Scenario,
) -> Result<RunOutcome, ProviderError> {
    let mut session = provider.create_session(model, scenario).await?;
    let tools = scenario.tool_service();
    let prompts = scenario.prompts();

    let start = Instant::now();
    let mut last_usage: Option<TokenUsage> = None;

    for (index, prompt) in prompts.iter().enumerate() {
        info!(
            "Sending prompt {}/{}: {}",
            index + 1,
            prompts.len(),
            truncate(prompt, PROMPT_LOG_CHARS)
        );

        let response = session.send(prompt).await.map_err(|e| {
            error!(prompt = index + 1, error = %e, "Error on prompt");
            e
        })?;

        // Usage is taken from the final response only.
        last_usage = response.usage;
        debug!(
            prompt = index + 1,
            tool_calls = tools.total_call_count(),
            "Received response"
        );
    }

    let execution_time_ms = start.elapsed().as_millis() as u64;

    let usage = last_usage.unwrap_or_default();
    let cost = match (last_usage, provider.pricing(model)) {
        (Some(usage), Some(pricing)) => {
            pricing.calculate_cost(usage.prompt_tokens, usage.completion_tokens)
        }
        _ => 0.0,
    };

    let accuracy_score = scenario.validate();
    let tool_calls_made = tools.total_call_count();

    Ok(RunOutcome::completed(
        execution_time_ms,
        usage,
        cost,
        tool_calls_made,
        accuracy_score,
    ))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
