//! Core types for the tool-calling benchmark
//!
//! Data model, pricing, scenarios, tool-service and provider interfaces,
//! configuration and tracing setup shared by the adapter and engine crates.

pub mod config;
pub mod error;
pub mod pricing;
pub mod provider;
pub mod scenario;
pub mod telemetry;
pub mod tools;
pub mod types;

pub use config::{BenchConfig, OutputSettings, RetrySettings};
pub use error::{BenchError, ProviderError, Result, ToolError};
pub use pricing::{ModelPricing, PricingTable};
pub use provider::{BoxedChatSession, ChatSession, Provider};
pub use scenario::{Scenario, ScenarioBuilder, Validator};
pub use telemetry::{init_tracing, TracingConfig};
pub use tools::{ApiCall, ParameterStore, Resettable, ToolDefinition, ToolService};
pub use types::{ChatResponse, RunOutcome, TokenUsage};
