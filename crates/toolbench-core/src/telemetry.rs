//! Tracing setup
//!
//! Console logging for benchmark runs. `RUST_LOG` overrides the configured
//! level when set.

use serde::Deserialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{BenchError, Result};

/// Tracing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TracingConfig {
    /// Name attached to the startup event
    pub service_name: String,
    /// Default filter directive, e.g. "info" or "toolbench_engine=debug"
    pub log_level: String,
    /// Emit one JSON object per event instead of human-readable lines
    pub json_logs: bool,
    /// ANSI colors in human-readable output
    pub colored_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "toolbench".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            colored_output: true,
        }
    }
}

impl TracingConfig {
    pub fn with_log_level(mut self, level: &str) -> Self {
        self.log_level = level.to_string();
        self
    }

    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    pub fn with_colored_output(mut self, colored: bool) -> Self {
        self.colored_output = colored;
        self
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        let layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        subscriber
            .with(layer)
            .try_init()
            .map_err(|e| BenchError::TracingInit(e.to_string()))?;
    } else {
        let layer = fmt::layer()
            .with_target(false)
            .with_ansi(config.colored_output);
        subscriber
            .with(layer)
            .try_init()
            .map_err(|e| BenchError::TracingInit(e.to_string()))?;
    }

    tracing::info!(service = %config.service_name, level = %config.log_level, "Tracing initialized");

    Ok(())
}
