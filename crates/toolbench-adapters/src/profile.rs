//! Provider profile
//!
//! The data every adapter variant shares: display name, pricing namespace,
//! credential, model list and the pricing table used to price those models.

use std::sync::Arc;
use tracing::debug;

use toolbench_core::{ModelPricing, PricingTable, ProviderError};

/// How a backend authenticates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// API key read from the named environment variable
    EnvVar(String),
    /// No key needed (local runtimes)
    None,
}

/// Which family of backend a profile describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// OpenAI-compatible endpoint of another vendor; shares that vendor's prices
    OpenAiProxy,
    /// Vendor SDK; priced through the `-native` namespace fallback
    Native,
    /// Runtime on the local machine; free, model ids may contain `:`
    Local,
}

#[derive(Debug, Clone)]
pub struct ProviderProfile {
    name: String,
    namespace: String,
    kind: BackendKind,
    credential: Credential,
    models: Vec<String>,
    pricing: Arc<PricingTable>,
}

impl ProviderProfile {
    /// Profile for a hosted backend keyed by an API-key environment variable.
    /// The pricing namespace defaults to the lowercased name.
    pub fn hosted(
        name: impl Into<String>,
        api_key_env_var: impl Into<String>,
        models: Vec<String>,
        pricing: Arc<PricingTable>,
    ) -> Self {
        let name = name.into();
        Self {
            namespace: name.to_lowercase(),
            name,
            kind: BackendKind::OpenAiProxy,
            credential: Credential::EnvVar(api_key_env_var.into()),
            models,
            pricing,
        }
    }

    /// Profile for a local runtime that needs no credentials
    pub fn local(name: impl Into<String>, models: Vec<String>) -> Self {
        let name = name.into();
        Self {
            namespace: name.to_lowercase(),
            name,
            kind: BackendKind::Local,
            credential: Credential::None,
            models,
            pricing: Arc::new(PricingTable::new()),
        }
    }

    /// Mark the profile as a native-SDK variant: its namespace gains the
    /// `-native` suffix so it falls back to the proxy variant's prices.
    pub fn native(mut self) -> Self {
        self.kind = BackendKind::Native;
        if !self.namespace.ends_with(toolbench_core::pricing::NATIVE_SUFFIX) {
            self.namespace.push_str(toolbench_core::pricing::NATIVE_SUFFIX);
        }
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn api_key_env_var(&self) -> Option<&str> {
        match &self.credential {
            Credential::EnvVar(var) => Some(var),
            Credential::None => None,
        }
    }

    /// True when no key is needed or the key variable is set and non-blank
    pub fn has_credentials(&self) -> bool {
        match &self.credential {
            Credential::EnvVar(var) => std::env::var(var)
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false),
            Credential::None => true,
        }
    }

    /// Read the API key, failing with a configuration error naming the variable
    pub fn require_api_key(&self) -> Result<Option<String>, ProviderError> {
        match &self.credential {
            Credential::None => Ok(None),
            Credential::EnvVar(var) => match std::env::var(var) {
                Ok(value) if !value.trim().is_empty() => Ok(Some(value)),
                _ => Err(ProviderError::configuration(format!(
                    "API key not found for {}. Set environment variable: {}",
                    self.name, var
                ))),
            },
        }
    }

    pub fn full_model_name(&self, model: &str) -> String {
        match self.kind {
            BackendKind::Local => format!("{}/{}", self.namespace, model.replace(':', "-")),
            _ => format!("{}/{}", self.namespace, model),
        }
    }

    pub fn pricing(&self, model: &str) -> Option<ModelPricing> {
        if self.kind == BackendKind::Local {
            return Some(ModelPricing::local(model));
        }

        let full_name = self.full_model_name(model);
        let pricing = self.pricing.resolve(&full_name);
        if pricing.is_none() {
            debug!(model = %full_name, "No pricing entry");
        }
        pricing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Arc<PricingTable> {
        Arc::new(PricingTable::builtin())
    }

    #[test]
    fn test_hosted_full_model_name() {
        let profile = ProviderProfile::hosted(
            "Groq",
            "TOOLBENCH_TEST_GROQ_KEY",
            vec!["llama-3.1-8b-instant".to_string()],
            table(),
        );

        assert_eq!(profile.full_model_name("llama-3.1-8b-instant"), "groq/llama-3.1-8b-instant");
        assert_eq!(profile.pricing("llama-3.1-8b-instant").unwrap().tokens_per_second, 840);
        assert_eq!(profile.api_key_env_var(), Some("TOOLBENCH_TEST_GROQ_KEY"));
    }

    #[test]
    fn test_native_profile_shares_proxy_prices() {
        let profile = ProviderProfile::hosted(
            "Groq",
            "TOOLBENCH_TEST_GROQ_KEY",
            vec!["llama-3.3-70b-versatile".to_string()],
            table(),
        )
        .native();

        assert_eq!(profile.kind(), BackendKind::Native);
        assert_eq!(profile.full_model_name("llama-3.3-70b-versatile"), "groq-native/llama-3.3-70b-versatile");
        assert_eq!(profile.pricing("llama-3.3-70b-versatile").unwrap().input_price_per_million, 0.59);
    }

    #[test]
    fn test_unpriced_model() {
        let profile = ProviderProfile::hosted("Acme", "TOOLBENCH_TEST_ACME_KEY", vec![], table());
        assert!(profile.pricing("mystery-1").is_none());
    }

    #[test]
    fn test_local_profile() {
        let profile = ProviderProfile::local("Ollama-Direct", vec!["qwen2.5:1.5b-instruct".to_string()]);

        assert!(profile.has_credentials());
        assert_eq!(profile.require_api_key(), Ok(None));
        assert_eq!(profile.full_model_name("qwen2.5:1.5b-instruct"), "ollama-direct/qwen2.5-1.5b-instruct");
        let pricing = profile.pricing("qwen2.5:1.5b-instruct").unwrap();
        assert_eq!(pricing.calculate_cost(10_000, 10_000), 0.0);
        assert_eq!(pricing.tokens_per_second, 75);
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let profile = ProviderProfile::hosted(
            "Deepseek",
            "TOOLBENCH_TEST_KEY_THAT_IS_NEVER_SET",
            vec![],
            table(),
        );

        assert!(!profile.has_credentials());
        let err = profile.require_api_key().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("TOOLBENCH_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_present_key() {
        std::env::set_var("TOOLBENCH_TEST_PRESENT_KEY", "sk-test");
        let profile = ProviderProfile::hosted("Mistral", "TOOLBENCH_TEST_PRESENT_KEY", vec![], table());

        assert!(profile.has_credentials());
        assert_eq!(profile.require_api_key(), Ok(Some("sk-test".to_string())));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        std::env::set_var("TOOLBENCH_TEST_BLANK_KEY", "   ");
        let profile = ProviderProfile::hosted("Mistral", "TOOLBENCH_TEST_BLANK_KEY", vec![], table());
        assert!(!profile.has_credentials());
    }
}
