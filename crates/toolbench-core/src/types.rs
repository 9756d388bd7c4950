use serde::{Deserialize, Serialize};

/// Token usage reported by a provider for one response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        u64::from(self.prompt_tokens) + u64::from(self.completion_tokens)
    }
}

/// One model reply within a chat session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    /// Absent when the backend does not report usage
    pub usage: Option<TokenUsage>,
}

impl ChatResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Result of one trial: a scenario's full prompt sequence against one model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub execution_time_ms: u64,
    /// True exactly when the validator scored the trial above zero
    pub success: bool,
    pub error: Option<String>,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub cost: f64,
    pub tool_calls_made: u32,
    pub accuracy_score: f64,
    /// Cut off by the trial deadline; never retried whatever the message says
    #[serde(default)]
    pub timed_out: bool,
}

impl RunOutcome {
    /// A trial that ran to completion and was scored by the validator
    pub fn completed(
        execution_time_ms: u64,
        usage: TokenUsage,
        cost: f64,
        tool_calls_made: u32,
        accuracy_score: f64,
    ) -> Self {
        Self {
            execution_time_ms,
            success: accuracy_score > 0.0,
            error: None,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            cost,
            tool_calls_made,
            accuracy_score,
            timed_out: false,
        }
    }

    /// A trial that failed before it could be scored
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// A trial cut off by the deadline; carries no usage or cost
    pub fn timeout(timeout_seconds: u64) -> Self {
        Self {
            timed_out: true,
            ..Self::failure(format!("Timeout after {} seconds", timeout_seconds))
        }
    }

    pub fn total_tokens(&self) -> u64 {
        u64::from(self.prompt_tokens) + u64::from(self.completion_tokens)
    }
}
