#![allow(dead_code)]

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use toolbench_adapters::{ModelScript, ProviderProfile, SimulatedProvider, TrialPlan, Turn};
use toolbench_core::tools::SET_PARAMETER;
use toolbench_core::{ApiCall, BenchConfig, ParameterStore, Provider, Scenario, ToolService};

pub const KICK: (&str, &str) = ("ch.0.cfg.name", "Kick");
pub const SNARE: (&str, &str) = ("ch.1.cfg.name", "Snare");

/// Two-prompt renaming scenario scored on the two expected writes
pub fn rename_scenario(store: &Arc<ParameterStore>) -> Scenario {
    let recorded = Arc::clone(store);
    let tools: Arc<dyn ToolService> = store.clone();

    Scenario::builder()
        .name("Channel Renaming")
        .system_prompt("Channels are 0-indexed in the API.")
        .prompts(["rename channel 1 to Kick", "rename channel 2 to Snare"])
        .tool_service(tools)
        .validator(move || {
            let mut score = 0.0;
            if recorded.contains(&ApiCall::new(KICK.0, KICK.1)) {
                score += 0.5;
            }
            if recorded.contains(&ApiCall::new(SNARE.0, SNARE.1)) {
                score += 0.5;
            }
            score
        })
        .build()
        .unwrap()
}

/// Both renames, one per prompt, with usage reported on each turn
pub fn correct_plan() -> TrialPlan {
    TrialPlan::turns([
        Turn::new()
            .call(SET_PARAMETER, json!({ "path": KICK.0, "value": KICK.1 }))
            .with_usage(5_000, 1_000),
        Turn::new()
            .call(SET_PARAMETER, json!({ "path": SNARE.0, "value": SNARE.1 }))
            .with_usage(1_000_000, 1_000_000),
    ])
}

/// Replies without calling any tool
pub fn chatty_plan() -> TrialPlan {
    TrialPlan::turns([Turn::new().reply("Sure, done!"), Turn::new().reply("Done too!")])
}

pub fn local_provider(name: &str, scripts: Vec<(&str, ModelScript)>) -> SimulatedProvider {
    let models = scripts.iter().map(|(m, _)| m.to_string()).collect();
    scripts
        .into_iter()
        .fold(
            SimulatedProvider::new(ProviderProfile::local(name, models)),
            |provider, (model, script)| provider.with_script(model, script),
        )
}

pub fn shared(provider: SimulatedProvider) -> Arc<dyn Provider> {
    Arc::new(provider)
}

/// Fast settings for tests: no pause between iterations
pub fn test_config(iterations: u32) -> BenchConfig {
    BenchConfig::default()
        .with_iterations(iterations)
        .with_timeout_seconds(5)
        .with_iteration_delay(Duration::ZERO)
}
