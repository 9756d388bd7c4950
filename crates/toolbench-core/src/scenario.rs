//! Benchmark scenarios
//!
//! A scenario bundles the prompts sent to a model, the tool service the model
//! is allowed to call, and a validator that scores what the service recorded.

use std::fmt;
use std::sync::Arc;

use crate::error::{BenchError, Result};
use crate::tools::ToolService;

/// Scores the tool service's recorded state, in [0, 1]
pub type Validator = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Immutable description of one benchmark case
#[derive(Clone)]
pub struct Scenario {
    name: String,
    prompts: Vec<String>,
    system_prompt: String,
    tool_service: Arc<dyn ToolService>,
    validator: Validator,
}

impl Scenario {
    pub fn builder() -> ScenarioBuilder {
        ScenarioBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn tool_service(&self) -> &Arc<dyn ToolService> {
        &self.tool_service
    }

    /// Run the validator. Out-of-range or NaN scores are clamped into [0, 1].
    pub fn validate(&self) -> f64 {
        let score = (self.validator)();
        if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        }
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("prompts", &self.prompts)
            .field("system_prompt", &self.system_prompt)
            .field("tool_service", &self.tool_service.name())
            .finish()
    }
}

/// Builder for [`Scenario`]
#[derive(Default)]
pub struct ScenarioBuilder {
    name: Option<String>,
    prompts: Vec<String>,
    system_prompt: String,
    tool_service: Option<Arc<dyn ToolService>>,
    validator: Option<Validator>,
}

impl ScenarioBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompts.push(prompt.into());
        self
    }

    pub fn prompts<I, S>(mut self, prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prompts.extend(prompts.into_iter().map(Into::into));
        self
    }

    pub fn system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn tool_service(mut self, tool_service: Arc<dyn ToolService>) -> Self {
        self.tool_service = Some(tool_service);
        self
    }

    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn build(self) -> Result<Scenario> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| BenchError::scenario("scenario name is required"))?;

        if self.prompts.is_empty() {
            return Err(BenchError::scenario(format!(
                "scenario '{}' needs at least one prompt",
                name
            )));
        }

        let tool_service = self
            .tool_service
            .ok_or_else(|| BenchError::scenario(format!("scenario '{}' has no tool service", name)))?;
        let validator = self
            .validator
            .ok_or_else(|| BenchError::scenario(format!("scenario '{}' has no validator", name)))?;

        Ok(Scenario {
            name,
            prompts: self.prompts,
            system_prompt: self.system_prompt,
            tool_service,
            validator,
        })
    }
}
