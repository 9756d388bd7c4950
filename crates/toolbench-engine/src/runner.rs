//! Benchmark runner
//!
//! Drives every provider and model against a scenario, strictly one trial at
//! a time. Each model gets `iterations` sequential iterations; each iteration
//! goes through the retry controller, then the tool service is reset and the
//! runner pauses before the next one.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use toolbench_core::{BenchConfig, Provider, ProviderError, Resettable, RunOutcome, Scenario};

use crate::executor::SingleRunExecutor;
use crate::master::MasterResults;
use crate::pacing;
use crate::results::{BenchmarkResults, ModelResults, SkipReason, Skipped};
use crate::retry::{RetryController, RetryPolicy};

pub struct BenchmarkRunner {
    providers: Vec<Arc<dyn Provider>>,
    iterations: u32,
    iteration_delay: Duration,
    executor: SingleRunExecutor,
    retry: RetryController,
    cancel: CancellationToken,
}

impl BenchmarkRunner {
    pub fn new(providers: Vec<Arc<dyn Provider>>, config: &BenchConfig) -> Self {
        let cancel = CancellationToken::new();
        Self {
            providers,
            iterations: config.iterations,
            iteration_delay: config.iteration_delay(),
            executor: SingleRunExecutor::from_config(config),
            retry: RetryController::new(RetryPolicy::from_settings(&config.retry), cancel.clone()),
            cancel,
        }
    }

    /// Replace the retry policy, keeping the runner's cancellation token
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = RetryController::new(policy, self.cancel.clone());
        self
    }

    /// Use an externally owned token, e.g. one cancelled on Ctrl-C
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.retry = RetryController::new(self.retry.policy().clone(), token.clone());
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop after the current trial; pending pauses end immediately
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Benchmark every available provider's models against one scenario
    #[instrument(skip_all, fields(scenario = %scenario.name()))]
    pub async fn run_benchmark(&self, scenario: &Scenario) -> BenchmarkResults {
        info!("=== BENCHMARK: {} ===", scenario.name());

        let scenario = Arc::new(scenario.clone());
        let mut results = BenchmarkResults::new(scenario.name());

        'providers: for provider in &self.providers {
            if !provider.is_available() {
                let reason = SkipReason::ProviderUnavailable {
                    api_key_env_var: provider.api_key_env_var().map(String::from),
                };
                warn!("Skipping {} - {}", provider.name(), reason);
                results.add_skipped(Skipped::new(provider.name(), reason));
                continue;
            }

            for model in provider.supported_models() {
                if self.cancel.is_cancelled() {
                    break 'providers;
                }

                let full_model_name = provider.full_model_name(model);
                match provider.pricing(model) {
                    None => {
                        warn!("Skipping {} - pricing not configured", full_model_name);
                        results.add_skipped(Skipped::new(full_model_name, SkipReason::NoPricing));
                        continue;
                    }
                    Some(pricing) if !pricing.supports_tool_calling => {
                        info!("Skipping {} - does not support tool calling", full_model_name);
                        results.add_skipped(Skipped::new(full_model_name, SkipReason::NoToolCalling));
                        continue;
                    }
                    Some(_) => {}
                }

                match self.run_iterations(provider, model, &scenario).await {
                    Ok(model_results) => results.add_result(model_results),
                    Err(e) => {
                        warn!("Skipping {} - {}", full_model_name, e);
                        results.add_skipped(Skipped::new(
                            full_model_name,
                            SkipReason::Configuration {
                                message: e.to_string(),
                            },
                        ));
                    }
                }
            }
        }

        if self.cancel.is_cancelled() {
            warn!("Benchmark interrupted, results are partial");
            results.mark_interrupted();
        }

        results
    }

    /// Run all iterations for one model.
    ///
    /// Every iteration's outcome is recorded, failures included. A
    /// configuration error from session creation before any run is recorded
    /// abandons the model and is returned instead; a later one is recorded as
    /// a failed run and ends the model's iterations.
    #[instrument(skip_all, fields(model = %provider.full_model_name(model)))]
    pub async fn run_iterations(
        &self,
        provider: &Arc<dyn Provider>,
        model: &str,
        scenario: &Arc<Scenario>,
    ) -> Result<ModelResults, ProviderError> {
        let full_model_name = provider.full_model_name(model);
        info!("Testing: {}", full_model_name);
        let mut results = ModelResults::new(&full_model_name);

        for iteration in 1..=self.iterations {
            if self.cancel.is_cancelled() {
                break;
            }
            info!("Iteration {}/{}", iteration, self.iterations);

            let report = self
                .retry
                .run(|_| self.executor.execute(provider, model, scenario))
                .await;
            scenario.tool_service().reset();
            let report = match report {
                Ok(report) => report,
                Err(e) if results.run_count() == 0 => return Err(e),
                Err(e) => {
                    // Later configuration failures keep what already ran.
                    warn!(
                        "Stopping {} after {} runs - {}",
                        full_model_name,
                        results.run_count(),
                        e
                    );
                    results.add_run(RunOutcome::failure(e.to_string()));
                    break;
                }
            };

            results.add_run(report.outcome);
            if report.interrupted {
                break;
            }

            if iteration < self.iterations {
                info!(
                    "Waiting {} seconds before next iteration...",
                    self.iteration_delay.as_secs_f64()
                );
                if pacing::pause(&self.cancel, self.iteration_delay).await.is_err() {
                    warn!("Pause interrupted, skipping remaining iterations");
                    break;
                }
            }
        }

        Ok(results)
    }

    /// Run several scenarios and sum each model's scores across them
    pub async fn run_master(&self, scenarios: &[Scenario]) -> MasterResults {
        info!("MASTER BENCHMARK: {} scenarios", scenarios.len());
        let mut master = MasterResults::new();

        for scenario in scenarios {
            if self.cancel.is_cancelled() {
                break;
            }
            master.add_scenario(self.run_benchmark(scenario).await);
        }

        master
    }
}
