//! Simulated provider
//!
//! Offline stand-in for a model backend. Each model gets a script of trial
//! plans; every session consumes the next plan, so a script can say "rate
//! limited twice, then succeed" or "hang forever". Tool calls in a plan are
//! executed against the scenario's real tool service, which is what the
//! validators inspect.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use toolbench_core::{
    BoxedChatSession, ChatResponse, ChatSession, ModelPricing, Provider, ProviderError, Scenario,
    TokenUsage, ToolService,
};

use crate::profile::ProviderProfile;

const DEFAULT_REPLY: &str = "Done.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationMode {
    /// Reply immediately
    Deterministic,
    /// Sleep a uniformly random duration before every reply
    LatencyInjection { min_ms: u64, max_ms: u64 },
}

impl SimulationMode {
    pub fn fixed_latency(ms: u64) -> Self {
        Self::LatencyInjection { min_ms: ms, max_ms: ms }
    }

    fn delay(&self) -> Duration {
        match *self {
            Self::Deterministic => Duration::ZERO,
            Self::LatencyInjection { min_ms, max_ms } if max_ms <= min_ms => {
                Duration::from_millis(min_ms)
            }
            Self::LatencyInjection { min_ms, max_ms } => {
                Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
            }
        }
    }
}

/// A tool call the simulated model makes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub arguments: Value,
}

impl ToolInvocation {
    pub fn new(tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool: tool.into(),
            arguments,
        }
    }
}

/// How a turn ends once its tool calls have run
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Reply(String),
    Error(ProviderError),
    /// Never answer
    Hang,
}

/// Scripted answer to one prompt
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub tool_calls: Vec<ToolInvocation>,
    pub usage: Option<TokenUsage>,
    pub outcome: TurnOutcome,
}

impl Default for Turn {
    fn default() -> Self {
        Self {
            tool_calls: Vec::new(),
            usage: None,
            outcome: TurnOutcome::Reply(DEFAULT_REPLY.to_string()),
        }
    }
}

impl Turn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call(mut self, tool: impl Into<String>, arguments: Value) -> Self {
        self.tool_calls.push(ToolInvocation::new(tool, arguments));
        self
    }

    pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.usage = Some(TokenUsage::new(prompt_tokens, completion_tokens));
        self
    }

    pub fn reply(mut self, content: impl Into<String>) -> Self {
        self.outcome = TurnOutcome::Reply(content.into());
        self
    }

    pub fn fail(mut self, error: ProviderError) -> Self {
        self.outcome = TurnOutcome::Error(error);
        self
    }

    pub fn hang(mut self) -> Self {
        self.outcome = TurnOutcome::Hang;
        self
    }
}

/// What one session (one trial attempt) does
#[derive(Debug, Clone, PartialEq)]
pub enum TrialPlan {
    /// Turn `i` answers prompt `i`; prompts past the end get a bare reply
    Turns(Vec<Turn>),
    /// Session creation itself fails
    RejectSession(ProviderError),
}

impl TrialPlan {
    pub fn turns(turns: impl IntoIterator<Item = Turn>) -> Self {
        Self::Turns(turns.into_iter().collect())
    }

    /// First prompt fails with `error`
    pub fn fail(error: ProviderError) -> Self {
        Self::Turns(vec![Turn::new().fail(error)])
    }

    /// First prompt never returns
    pub fn hang() -> Self {
        Self::Turns(vec![Turn::new().hang()])
    }
}

impl Default for TrialPlan {
    fn default() -> Self {
        Self::Turns(Vec::new())
    }
}

/// Ordered trial plans for one model
#[derive(Debug, Clone)]
pub struct ModelScript {
    plans: VecDeque<TrialPlan>,
    /// Used once `plans` is exhausted
    fallback: TrialPlan,
    mode: SimulationMode,
}

impl Default for ModelScript {
    fn default() -> Self {
        Self {
            plans: VecDeque::new(),
            fallback: TrialPlan::default(),
            mode: SimulationMode::Deterministic,
        }
    }
}

impl ModelScript {
    /// Every session follows `plan`
    pub fn always(plan: TrialPlan) -> Self {
        Self {
            fallback: plan,
            ..Default::default()
        }
    }

    /// Queue a plan for the next unscripted session
    pub fn then(mut self, plan: TrialPlan) -> Self {
        self.plans.push_back(plan);
        self
    }

    /// Queue the same plan `times` times
    pub fn repeat(mut self, plan: TrialPlan, times: usize) -> Self {
        for _ in 0..times {
            self.plans.push_back(plan.clone());
        }
        self
    }

    pub fn otherwise(mut self, plan: TrialPlan) -> Self {
        self.fallback = plan;
        self
    }

    pub fn with_mode(mut self, mode: SimulationMode) -> Self {
        self.mode = mode;
        self
    }

    fn next_plan(&mut self) -> TrialPlan {
        self.plans.pop_front().unwrap_or_else(|| self.fallback.clone())
    }
}

/// Provider whose models follow scripts instead of calling a network API
pub struct SimulatedProvider {
    profile: ProviderProfile,
    scripts: HashMap<String, Mutex<ModelScript>>,
    available: Option<bool>,
    sessions_created: AtomicUsize,
}

impl SimulatedProvider {
    pub fn new(profile: ProviderProfile) -> Self {
        Self {
            profile,
            scripts: HashMap::new(),
            available: None,
            sessions_created: AtomicUsize::new(0),
        }
    }

    pub fn with_script(mut self, model: impl Into<String>, script: ModelScript) -> Self {
        self.scripts.insert(model.into(), Mutex::new(script));
        self
    }

    /// Force availability regardless of credentials, e.g. a local runtime
    /// that is not running
    pub fn with_availability(mut self, available: bool) -> Self {
        self.available = Some(available);
        self
    }

    pub fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    /// Sessions opened so far, one per trial attempt
    pub fn sessions_created(&self) -> usize {
        self.sessions_created.load(Ordering::SeqCst)
    }

    fn next_plan(&self, model: &str) -> (TrialPlan, SimulationMode) {
        match self.scripts.get(model) {
            Some(script) => {
                let mut script = script.lock();
                let mode = script.mode;
                (script.next_plan(), mode)
            }
            None => (TrialPlan::default(), SimulationMode::Deterministic),
        }
    }
}

#[async_trait]
impl Provider for SimulatedProvider {
    fn name(&self) -> &str {
        self.profile.name()
    }

    fn api_key_env_var(&self) -> Option<&str> {
        self.profile.api_key_env_var()
    }

    fn is_available(&self) -> bool {
        self.available.unwrap_or_else(|| self.profile.has_credentials())
    }

    fn supported_models(&self) -> &[String] {
        self.profile.models()
    }

    fn full_model_name(&self, model: &str) -> String {
        self.profile.full_model_name(model)
    }

    fn pricing(&self, model: &str) -> Option<ModelPricing> {
        self.profile.pricing(model)
    }

    async fn create_session(
        &self,
        model: &str,
        scenario: &Scenario,
    ) -> Result<BoxedChatSession, ProviderError> {
        self.profile.require_api_key()?;

        if !self.profile.models().iter().any(|m| m == model) {
            return Err(ProviderError::configuration(format!(
                "Model {} is not supported by {}",
                model,
                self.profile.name()
            )));
        }

        self.sessions_created.fetch_add(1, Ordering::SeqCst);
        let (plan, mode) = self.next_plan(model);
        info!(
            "Simulating session for model: {}",
            self.profile.full_model_name(model)
        );

        match plan {
            TrialPlan::RejectSession(error) => Err(error),
            TrialPlan::Turns(turns) => Ok(Box::new(SimulatedSession {
                model: model.to_string(),
                tools: Arc::clone(scenario.tool_service()),
                turns,
                next_turn: 0,
                mode,
            })),
        }
    }
}

/// One scripted conversation
pub struct SimulatedSession {
    model: String,
    tools: Arc<dyn ToolService>,
    turns: Vec<Turn>,
    next_turn: usize,
    mode: SimulationMode,
}

#[async_trait]
impl ChatSession for SimulatedSession {
    async fn send(&mut self, prompt: &str) -> Result<ChatResponse, ProviderError> {
        let turn = self.turns.get(self.next_turn).cloned().unwrap_or_default();
        self.next_turn += 1;
        debug!(model = %self.model, turn = self.next_turn, prompt_len = prompt.len(), "Simulated turn");

        let delay = self.mode.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        for call in &turn.tool_calls {
            // Tool failures go back to the model as text; they do not end the turn.
            if let Err(e) = self.tools.invoke(&call.tool, &call.arguments) {
                warn!(model = %self.model, tool = %call.tool, error = %e, "Tool call rejected");
            }
        }

        match turn.outcome {
            TurnOutcome::Reply(content) => {
                let response = ChatResponse::new(content);
                Ok(match turn.usage {
                    Some(usage) => response.with_usage(usage),
                    None => response,
                })
            }
            TurnOutcome::Error(error) => Err(error),
            TurnOutcome::Hang => std::future::pending().await,
        }
    }
}
