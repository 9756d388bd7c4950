//! Provider adapter interfaces
//!
//! The engine sees a provider only through these traits: it asks whether the
//! backend is usable, which models it serves, what they cost, and for a fresh
//! chat session bound to a scenario's tools.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::pricing::ModelPricing;
use crate::scenario::Scenario;
use crate::types::ChatResponse;

/// Conversation with one model. Memory persists across `send` calls on the
/// same session and never across sessions.
#[async_trait]
pub trait ChatSession: Send {
    /// Send one user prompt and wait for the final reply, letting the model
    /// call the scenario's tools as many times as it wants in between.
    async fn send(&mut self, prompt: &str) -> Result<ChatResponse, ProviderError>;
}

pub type BoxedChatSession = Box<dyn ChatSession>;

/// A model backend: OpenAI-compatible proxy, native SDK or local runtime
#[async_trait]
pub trait Provider: Send + Sync {
    /// Display name, e.g. "Groq"
    fn name(&self) -> &str;

    /// Environment variable holding the API key, if the backend needs one
    fn api_key_env_var(&self) -> Option<&str>;

    /// Whether the backend can be used right now (key present, runtime up)
    fn is_available(&self) -> bool;

    /// Models to benchmark, in order
    fn supported_models(&self) -> &[String];

    /// Key used for pricing lookup and reporting, e.g. "groq/llama-3.1-8b-instant"
    fn full_model_name(&self, model: &str) -> String;

    /// Pricing for a model, `None` when the model is not priced
    fn pricing(&self, model: &str) -> Option<ModelPricing>;

    /// Open a fresh session bound to the scenario's system prompt and tools.
    ///
    /// Fails with [`ProviderError::Configuration`] when credentials or model
    /// setup are missing.
    async fn create_session(
        &self,
        model: &str,
        scenario: &Scenario,
    ) -> Result<BoxedChatSession, ProviderError>;
}
