mod common;

use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::*;
use toolbench_adapters::{ModelScript, SimulationMode, TrialPlan, Turn};
use toolbench_core::tools::SET_PARAMETER;
use toolbench_core::{ParameterStore, ProviderError, ToolService};
use toolbench_engine::SingleRunExecutor;

#[tokio::test]
async fn test_deadline_wins_over_slow_provider() {
    let store = Arc::new(ParameterStore::new("console"));
    let scenario = Arc::new(rename_scenario(&store));
    let provider = shared(local_provider(
        "Sim",
        vec![(
            "slow:70b",
            ModelScript::always(correct_plan()).with_mode(SimulationMode::fixed_latency(5_000)),
        )],
    ));

    let executor = SingleRunExecutor::new(Duration::from_secs(1));
    let start = Instant::now();
    let outcome = executor.execute(&provider, "slow:70b", &scenario).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(!outcome.success);
    assert!(outcome.error.as_deref().unwrap().contains("Timeout after 1 seconds"));
    assert_eq!(outcome.total_tokens(), 0);
    assert_eq!(outcome.cost, 0.0);
}

#[tokio::test]
async fn test_timed_out_trial_is_aborted() {
    let store = Arc::new(ParameterStore::new("console"));
    let scenario = Arc::new(rename_scenario(&store));
    // Would write a parameter 1.5 s in, after the deadline.
    let late_writer = TrialPlan::turns([
        Turn::new().call(SET_PARAMETER, json!({ "path": "ch.0.cfg.name", "value": "Kick" })),
    ]);
    let provider = shared(local_provider(
        "Sim",
        vec![(
            "slow:70b",
            ModelScript::always(late_writer).with_mode(SimulationMode::fixed_latency(1_500)),
        )],
    ));

    let executor = SingleRunExecutor::new(Duration::from_secs(1));
    let outcome = executor.execute(&provider, "slow:70b", &scenario).await.unwrap();
    assert_eq!(outcome.error.as_deref(), Some("Timeout after 1 seconds"));

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(store.total_call_count(), 0);
}

#[tokio::test]
async fn test_hanging_session_times_out() {
    let store = Arc::new(ParameterStore::new("console"));
    let scenario = Arc::new(rename_scenario(&store));
    let provider = shared(local_provider(
        "Sim",
        vec![("stuck:8b", ModelScript::always(TrialPlan::hang()))],
    ));

    let executor = SingleRunExecutor::new(Duration::from_secs(1));
    let start = Instant::now();
    let outcome = executor.execute(&provider, "stuck:8b", &scenario).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(outcome.error.as_deref(), Some("Timeout after 1 seconds"));
}

#[tokio::test]
async fn test_completed_trial_outcome() {
    let store = Arc::new(ParameterStore::new("console"));
    let scenario = Arc::new(rename_scenario(&store));
    let provider = shared(local_provider(
        "Sim",
        vec![("good:8b", ModelScript::always(correct_plan()))],
    ));

    let executor = SingleRunExecutor::new(Duration::from_secs(5));
    let outcome = executor.execute(&provider, "good:8b", &scenario).await.unwrap();

    assert!(outcome.success);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.accuracy_score, 1.0);
    assert_eq!(outcome.tool_calls_made, 2);
    // The executor leaves the tool service as the trial left it.
    assert_eq!(store.total_call_count(), 2);
}

#[tokio::test]
async fn test_partial_trial_is_scored_zero_on_error() {
    let store = Arc::new(ParameterStore::new("console"));
    let scenario = Arc::new(rename_scenario(&store));
    let plan = TrialPlan::turns([
        Turn::new().call(SET_PARAMETER, json!({ "path": "ch.0.cfg.name", "value": "Kick" })),
        Turn::new().fail(ProviderError::invalid_response("empty choices")),
    ]);
    let provider = shared(local_provider("Sim", vec![("half:8b", ModelScript::always(plan))]));

    let executor = SingleRunExecutor::new(Duration::from_secs(5));
    let outcome = executor.execute(&provider, "half:8b", &scenario).await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.accuracy_score, 0.0);
    assert_eq!(outcome.error.as_deref(), Some("Invalid response: empty choices"));
    assert_eq!(outcome.execution_time_ms, 0);
}

#[tokio::test]
async fn test_configuration_error_is_returned() {
    let store = Arc::new(ParameterStore::new("console"));
    let scenario = Arc::new(rename_scenario(&store));
    let provider = shared(local_provider(
        "Sim",
        vec![(
            "gone:8b",
            ModelScript::always(TrialPlan::RejectSession(ProviderError::configuration(
                "API key not found",
            ))),
        )],
    ));

    let executor = SingleRunExecutor::new(Duration::from_secs(5));
    let err = executor.execute(&provider, "gone:8b", &scenario).await.unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_runtime_session_failure_is_an_outcome() {
    let store = Arc::new(ParameterStore::new("console"));
    let scenario = Arc::new(rename_scenario(&store));
    let provider = shared(local_provider(
        "Sim",
        vec![(
            "down:8b",
            ModelScript::always(TrialPlan::RejectSession(ProviderError::request(
                "connection refused",
            ))),
        )],
    ));

    let executor = SingleRunExecutor::new(Duration::from_secs(5));
    let outcome = tokio_test::assert_ok!(executor.execute(&provider, "down:8b", &scenario).await);
    assert_eq!(outcome.error.as_deref(), Some("Request failed: connection refused"));
}
