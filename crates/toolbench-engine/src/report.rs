//! Text reports

use std::fmt::Write;
use tracing::info;

use crate::master::MasterResults;
use crate::results::BenchmarkResults;
use crate::scoring::{failure_breakdown, Ranking};

const BANNER_WIDTH: usize = 40;
const TABLE_WIDTH: usize = 100;
const MASTER_BANNER_WIDTH: usize = 60;

/// Per-model statistics table with a distinct-errors line under each model
/// that had errors
pub fn render_table(results: &BenchmarkResults) -> String {
    let mut out = String::new();
    let banner = "=".repeat(BANNER_WIDTH);

    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out, "BENCHMARK REPORT: {}", results.scenario_name());
    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<35} {:>10} {:>10} {:>10} {:>12} {:>10} {:>10}",
        "Provider/Model", "Avg Time", "Success", "Accuracy", "Avg Cost", "Tokens", "Calls"
    );
    let _ = writeln!(out, "{}", "-".repeat(TABLE_WIDTH));

    for model in results.iter() {
        let _ = writeln!(
            out,
            "{:<35} {:>9.0}ms {:>9.0}% {:>9.0}% ${:>11.6} {:>10.0} {:>10.0}",
            model.model_name(),
            model.average_time(),
            model.success_rate() * 100.0,
            model.average_accuracy() * 100.0,
            model.average_cost(),
            model.average_tokens(),
            model.average_tool_calls()
        );
        if !model.errors().is_empty() {
            let _ = writeln!(out, "    Errors: {}", model.errors().join(", "));
        }
    }

    if !results.skipped().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Skipped:");
        for skipped in results.skipped() {
            let _ = writeln!(out, "  {} - {}", skipped.name, skipped.reason);
        }
    }

    if results.interrupted() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Run interrupted; results are partial");
    }

    out
}

/// Winner, ranked score breakdown and disqualified models. Without a viable
/// model, a failure breakdown sorted by average time instead.
pub fn render_winner(results: &BenchmarkResults, ranking: &Ranking) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== WINNER DETERMINATION ===");

    let Some(winner) = ranking.winner() else {
        let _ = writeln!(out, "NO WINNER: All models failed completely");
        let breakdown = failure_breakdown(results);
        if !breakdown.is_empty() {
            let _ = writeln!(out, "Failure analysis:");
            for failure in breakdown {
                let _ = writeln!(
                    out,
                    "  {}: 0% success, {} errors, avg time: {:.0}ms",
                    failure.model_name, failure.error_count, failure.average_time_ms
                );
            }
        }
        return out;
    };

    let _ = writeln!(out, "WINNER: {}", winner.model_name);
    let _ = writeln!(out);
    let _ = writeln!(out, "Final Scores (max 100):");
    for score in ranking.sorted() {
        let marker = if score.model_name == winner.model_name { "*" } else { " " };
        let _ = writeln!(
            out,
            "{} {}: {:.2} ({})",
            marker,
            score.model_name,
            score.total(),
            score.breakdown
        );
    }

    if !ranking.disqualified().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Disqualified (0% success): {}",
            ranking.disqualified().join(", ")
        );
    }

    out
}

/// Table plus winner section for one scenario
pub fn render_scenario(results: &BenchmarkResults) -> String {
    let ranking = Ranking::rank(results);
    format!("{}\n{}", render_table(results), render_winner(results, &ranking))
}

/// Overall ranking across scenarios
pub fn render_master(master: &MasterResults) -> String {
    let mut out = String::new();
    let banner = "=".repeat(MASTER_BANNER_WIDTH);

    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out, "OVERALL WINNER ACROSS ALL SCENARIOS");
    let _ = writeln!(out, "{}", banner);

    for score in master.overall_ranking() {
        let _ = writeln!(
            out,
            "{}: {:.2} ({} of {} scenarios)",
            score.model_name,
            score.total,
            score.scenarios_scored,
            master.scenarios().len()
        );
    }

    let disqualified = master.disqualified();
    if !disqualified.is_empty() {
        let _ = writeln!(out, "Disqualified everywhere: {}", disqualified.join(", "));
    }

    let _ = writeln!(out);
    match master.overall_winner() {
        Some(winner) => {
            let _ = writeln!(out, "OVERALL CHEAPEST RELIABLE LLM: {}", winner.model_name);
        }
        None => {
            let _ = writeln!(out, "NO OVERALL WINNER");
        }
    }

    out
}

/// Emit a rendered report through tracing, one event per line
pub fn log_report(report: &str) {
    for line in report.lines() {
        info!("{}", line);
    }
}
