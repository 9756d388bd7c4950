use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{BenchError, Result};
use crate::pricing::PricingTable;

pub const ENV_PREFIX: &str = "TOOLBENCH";

/// Benchmark configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BenchConfig {
    /// Trials per model
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Hard deadline for one trial
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Pause between iterations of the same model
    #[serde(default = "default_iteration_delay_ms")]
    pub iteration_delay_ms: u64,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub output: OutputSettings,
    /// Optional TOML file overlaid on the built-in pricing table
    #[serde(default)]
    pub pricing_file: Option<String>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            timeout_seconds: default_timeout_seconds(),
            iteration_delay_ms: default_iteration_delay_ms(),
            retry: RetrySettings::default(),
            output: OutputSettings::default(),
            pricing_file: None,
        }
    }
}

impl BenchConfig {
    /// Load configuration from `TOOLBENCH__*` environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_env(ENV_PREFIX)
    }

    /// Load configuration from environment with custom prefix
    pub fn load_from_env(prefix: &str) -> Result<Self> {
        let builder = Self::defaults(Config::builder())?.add_source(
            Environment::with_prefix(prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let builder = Self::defaults(Config::builder())?
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(builder
            .set_default("iterations", default_iterations() as i64)?
            .set_default("timeout_seconds", default_timeout_seconds() as i64)?
            .set_default("iteration_delay_ms", default_iteration_delay_ms() as i64)?
            .set_default("retry.max_attempts", default_max_attempts() as i64)?
            .set_default("retry.initial_backoff_ms", default_initial_backoff_ms() as i64)?
            .set_default("retry.multiplier", default_multiplier())?
            .set_default("retry.max_backoff_ms", default_max_backoff_ms() as i64)?
            .set_default("output.write_results", false)?
            .set_default("output.dir", default_output_dir())?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(BenchError::invalid_config("iterations must be at least 1"));
        }
        if self.timeout_seconds == 0 {
            return Err(BenchError::invalid_config("timeout_seconds must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(BenchError::invalid_config("retry.max_attempts must be at least 1"));
        }
        if self.retry.multiplier.is_nan() || self.retry.multiplier < 1.0 {
            return Err(BenchError::invalid_config("retry.multiplier must be >= 1.0"));
        }
        Ok(())
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_iteration_delay(mut self, delay: Duration) -> Self {
        self.iteration_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_output(mut self, output: OutputSettings) -> Self {
        self.output = output;
        self
    }

    /// Built-in pricing with the optional pricing file overlaid
    pub fn pricing_table(&self) -> Result<PricingTable> {
        let table = PricingTable::builtin();
        match &self.pricing_file {
            Some(path) => Ok(table.merged_with(PricingTable::load_from_file(path)?)),
            None => Ok(table),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn iteration_delay(&self) -> Duration {
        Duration::from_millis(self.iteration_delay_ms)
    }
}

fn default_iterations() -> u32 {
    5
}

fn default_timeout_seconds() -> u64 {
    180
}

fn default_iteration_delay_ms() -> u64 {
    10_000
}

/// Backoff for rate-limited trials
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per iteration, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            multiplier: default_multiplier(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetrySettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

/// Where and whether results are written
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub write_results: bool,
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            write_results: false,
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "benchmarks/output".to_string()
}
