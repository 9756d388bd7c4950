//! Error types shared across the benchmark crates

use thiserror::Error;

/// Top-level error type for benchmark setup and support code
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Pricing table error: {0}")]
    Pricing(String),

    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),
}

impl BenchError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn pricing(msg: impl Into<String>) -> Self {
        Self::Pricing(msg.into())
    }

    pub fn scenario(msg: impl Into<String>) -> Self {
        Self::Scenario(msg.into())
    }
}

/// Errors raised by provider adapters and chat sessions.
///
/// `Configuration` failures happen before any prompt is sent (missing API
/// key, unsupported model). Everything else is a runtime failure of a trial.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("{0}")]
    Configuration(String),

    #[error("429 Too Many Requests: {0}")]
    RateLimited(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Tool invocation failed: {0}")]
    Tool(String),
}

impl ProviderError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<ToolError> for ProviderError {
    fn from(err: ToolError) -> Self {
        Self::Tool(err.to_string())
    }
}

/// Errors raised by a tool service while handling an invocation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}

impl ToolError {
    pub fn invalid_arguments(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result type for benchmark setup operations
pub type Result<T> = std::result::Result<T, BenchError>;
