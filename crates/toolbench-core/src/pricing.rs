//! Model pricing table
//!
//! Maps full model names (`<namespace>/<model>`) to per-token prices and a
//! throughput estimate. The table is built once and shared immutably.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{BenchError, Result};

/// Namespace suffix used by native-SDK adapter variants.
pub const NATIVE_SUFFIX: &str = "-native";

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Per-model pricing and capability entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// USD per million prompt tokens
    pub input_price_per_million: f64,
    /// USD per million completion tokens
    pub output_price_per_million: f64,
    /// Whether the model can invoke tools at all
    #[serde(default = "default_supports_tool_calling")]
    pub supports_tool_calling: bool,
    /// Rough generation throughput
    #[serde(default)]
    pub tokens_per_second: u32,
}

fn default_supports_tool_calling() -> bool {
    true
}

impl ModelPricing {
    pub fn new(
        input_price_per_million: f64,
        output_price_per_million: f64,
        supports_tool_calling: bool,
        tokens_per_second: u32,
    ) -> Self {
        Self {
            input_price_per_million,
            output_price_per_million,
            supports_tool_calling,
            tokens_per_second,
        }
    }

    /// Pricing for a model served by a local runtime: free, with a throughput
    /// guess taken from the parameter-count tag in the model name.
    pub fn local(model: &str) -> Self {
        Self::new(0.0, 0.0, true, estimate_local_tokens_per_second(model))
    }

    /// Cost in USD of one call with the given token usage
    pub fn calculate_cost(&self, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        (prompt_tokens as f64 * self.input_price_per_million / TOKENS_PER_MILLION)
            + (completion_tokens as f64 * self.output_price_per_million / TOKENS_PER_MILLION)
    }
}

fn estimate_local_tokens_per_second(model: &str) -> u32 {
    if model.contains("0.5b") || model.contains("1b") {
        100
    } else if model.contains("1.5b") || model.contains("3b") {
        75
    } else if model.contains("7b") || model.contains("8b") {
        50
    } else if model.contains("35b") || model.contains("70b") {
        20
    } else {
        40
    }
}

#[derive(Debug, Deserialize)]
struct PricingFile {
    #[serde(default)]
    models: HashMap<String, ModelPricing>,
}

/// Immutable lookup table from full model name to pricing
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    entries: HashMap<String, ModelPricing>,
}

impl PricingTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the published prices the benchmark ships with
    pub fn builtin() -> Self {
        Self::new()
            .with_entry("groq/llama-3.1-8b-instant", ModelPricing::new(0.05, 0.08, true, 840))
            .with_entry("groq/llama-3-8b-tool-use-preview", ModelPricing::new(0.05, 0.08, true, 1345))
            .with_entry("groq/llama-4-scout-preview", ModelPricing::new(0.11, 0.34, true, 594))
            .with_entry("groq/llama-3.3-70b-versatile", ModelPricing::new(0.59, 0.79, true, 394))
            .with_entry("groq/qwen3-32b-preview", ModelPricing::new(0.29, 0.59, true, 662))
    }

    /// Parse a table from TOML of the form
    ///
    /// ```toml
    /// [models."groq/llama-3.1-8b-instant"]
    /// input_price_per_million = 0.05
    /// output_price_per_million = 0.08
    /// tokens_per_second = 840
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: PricingFile =
            toml::from_str(content).map_err(|e| BenchError::pricing(e.to_string()))?;

        for (key, pricing) in &file.models {
            if !key.contains('/') {
                return Err(BenchError::pricing(format!(
                    "model key '{}' must be of the form <namespace>/<model>",
                    key
                )));
            }
            if pricing.input_price_per_million < 0.0 || pricing.output_price_per_million < 0.0 {
                return Err(BenchError::pricing(format!("negative price for '{}'", key)));
            }
        }

        Ok(Self {
            entries: file.models,
        })
    }

    /// Load a TOML pricing file from disk
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| BenchError::pricing(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Add or replace an entry
    pub fn with_entry(mut self, full_model_name: impl Into<String>, pricing: ModelPricing) -> Self {
        self.entries.insert(full_model_name.into(), pricing);
        self
    }

    /// Overlay another table's entries on top of this one
    pub fn merged_with(mut self, other: PricingTable) -> Self {
        self.entries.extend(other.entries);
        self
    }

    /// Exact-key lookup
    pub fn get(&self, full_model_name: &str) -> Option<&ModelPricing> {
        self.entries.get(full_model_name)
    }

    /// Lookup with fallback from a `-native` namespace to the generic one, so
    /// several adapter variants of one provider share a single price entry.
    pub fn resolve(&self, full_model_name: &str) -> Option<ModelPricing> {
        if let Some(pricing) = self.entries.get(full_model_name) {
            return Some(*pricing);
        }

        let (namespace, model) = full_model_name.split_once('/')?;
        let generic = namespace.strip_suffix(NATIVE_SUFFIX)?;
        self.entries.get(&format!("{}/{}", generic, model)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
