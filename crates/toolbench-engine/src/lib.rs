//! Benchmark execution engine
//!
//! Runs scenarios against provider models and ranks the models on
//! reliability, accuracy, speed and cost.
//!
//! ```text
//! BenchmarkRunner      providers × models, sequential
//! └── iterations       reset tool service, pause between iterations
//!     └── RetryController    backoff on rate limits only
//!         └── SingleRunExecutor   one trial on its own task, hard deadline
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use toolbench_engine::{run_scenarios, BenchmarkRunner};
//!
//! let runner = BenchmarkRunner::new(providers, &config);
//! let master = run_scenarios(&runner, &scenarios, &config.output).await;
//! println!("{:?}", master.overall_winner());
//! ```

pub mod classify;
pub mod executor;
pub mod io;
pub mod master;
pub mod pacing;
pub mod report;
pub mod results;
pub mod retry;
pub mod runner;
pub mod scoring;

pub use classify::{is_rate_limit_error, is_rate_limited};
pub use executor::SingleRunExecutor;
pub use io::{IoError, IoResult, MasterSnapshot, ResultsIo, ScenarioSnapshot};
pub use master::{MasterResults, OverallScore};
pub use pacing::Interrupted;
pub use results::{BenchmarkResults, ModelResults, ModelSummary, SkipReason, Skipped};
pub use retry::{RetryController, RetryPolicy, RetryReport};
pub use runner::BenchmarkRunner;
pub use scoring::{failure_breakdown, FailureSummary, ModelScore, Ranking, ScoreBreakdown};

use tracing::warn;
use toolbench_core::{OutputSettings, Scenario};

/// Run every scenario, log each report and the overall ranking, and write
/// results to disk when `output.write_results` is set.
///
/// Write failures are logged and do not affect the returned results.
pub async fn run_scenarios(
    runner: &BenchmarkRunner,
    scenarios: &[Scenario],
    output: &OutputSettings,
) -> MasterResults {
    let master = runner.run_master(scenarios).await;

    for results in master.scenarios() {
        report::log_report(&report::render_scenario(results));
    }
    let master_report = report::render_master(&master);
    report::log_report(&master_report);

    if output.write_results {
        if let Err(e) = write_results(&master, &master_report, output) {
            warn!(dir = %output.dir, error = %e, "Failed to write benchmark results");
        }
    }

    master
}

fn write_results(master: &MasterResults, master_report: &str, output: &OutputSettings) -> IoResult<()> {
    let io = ResultsIo::from_settings(output);
    for results in master.scenarios() {
        io.write_snapshot(&ScenarioSnapshot::capture(results))?;
        io.write_report(results.scenario_name(), &report::render_scenario(results))?;
    }
    io.write_master(&MasterSnapshot::capture(master), master_report)?;
    Ok(())
}
