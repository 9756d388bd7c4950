//! Tool-service collaborator interfaces
//!
//! A tool service is the stateful object a model invokes during a trial.
//! The engine only needs to reset it between iterations and read its call
//! counter; validators inspect whatever else it records.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::ToolError;

/// Capability to return to an initial empty state.
///
/// Services with nothing to reset implement this as a no-op.
pub trait Resettable {
    fn reset(&self);
}

/// Description of one invocable tool, in the JSON-schema shape chat APIs expect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A set of tools a model can call, plus the bookkeeping the engine reads
pub trait ToolService: Resettable + Send + Sync {
    /// Human-readable service name, used in logs
    fn name(&self) -> &str;

    /// Tools exposed to the model
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Execute one tool call requested by the model
    fn invoke(&self, tool: &str, arguments: &Value) -> Result<Value, ToolError>;

    /// Number of tool calls handled since the last reset
    fn total_call_count(&self) -> u32;
}

/// A single recorded write: a parameter path and the value assigned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCall {
    pub path: String,
    pub value: Value,
}

impl ApiCall {
    pub fn new(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for ApiCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiCall{{path='{}', value={}}}", self.path, self.value)
    }
}

#[derive(Debug, Default)]
struct StoreState {
    captured: Vec<ApiCall>,
    values: HashMap<String, Value>,
}

/// Recording key/value tool service.
///
/// Exposes `get_parameter`, `set_parameter` and `set_multiple_parameters`,
/// counts every invocation and keeps the ordered log of writes.
#[derive(Debug)]
pub struct ParameterStore {
    name: String,
    call_count: AtomicU32,
    state: Mutex<StoreState>,
}

pub const GET_PARAMETER: &str = "get_parameter";
pub const SET_PARAMETER: &str = "set_parameter";
pub const SET_MULTIPLE_PARAMETERS: &str = "set_multiple_parameters";

impl ParameterStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            call_count: AtomicU32::new(0),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Ordered copy of every write since the last reset
    pub fn captured_calls(&self) -> Vec<ApiCall> {
        self.state.lock().captured.clone()
    }

    /// Whether the exact write was recorded
    pub fn contains(&self, call: &ApiCall) -> bool {
        self.state.lock().captured.iter().any(|c| c == call)
    }

    /// Current value at a path
    pub fn value(&self, path: &str) -> Option<Value> {
        self.state.lock().values.get(path).cloned()
    }

    fn record(&self, call: ApiCall) -> Value {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let response = json!({ "path": call.path, "value": call.value, "status": "SUCCESS" });
        let mut state = self.state.lock();
        state.values.insert(call.path.clone(), call.value.clone());
        state.captured.push(call);
        response
    }
}

fn parse_api_call(tool: &str, value: &Value) -> Result<ApiCall, ToolError> {
    serde_json::from_value(value.clone())
        .map_err(|e| ToolError::invalid_arguments(tool, e.to_string()))
}

impl Resettable for ParameterStore {
    fn reset(&self) {
        self.call_count.store(0, Ordering::SeqCst);
        let mut state = self.state.lock();
        state.captured.clear();
        state.values.clear();
    }
}

impl ToolService for ParameterStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        let api_call_schema = json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Parameter path, e.g. ch.0.cfg.name" },
                "value": { "description": "Value to assign" }
            },
            "required": ["path", "value"]
        });

        vec![
            ToolDefinition::new(
                GET_PARAMETER,
                "Get the current value of a parameter",
                json!({
                    "type": "object",
                    "properties": { "path": { "type": "string" } },
                    "required": ["path"]
                }),
            ),
            ToolDefinition::new(SET_PARAMETER, "Set a single parameter", api_call_schema.clone()),
            ToolDefinition::new(
                SET_MULTIPLE_PARAMETERS,
                "Set several parameters in order",
                json!({
                    "type": "object",
                    "properties": { "calls": { "type": "array", "items": api_call_schema } },
                    "required": ["calls"]
                }),
            ),
        ]
    }

    fn invoke(&self, tool: &str, arguments: &Value) -> Result<Value, ToolError> {
        match tool {
            GET_PARAMETER => {
                let path = arguments
                    .get("path")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ToolError::invalid_arguments(tool, "missing 'path'"))?;
                self.call_count.fetch_add(1, Ordering::SeqCst);
                let value = self.value(path).unwrap_or(Value::Null);
                Ok(json!({ "path": path, "value": value, "status": "SUCCESS" }))
            }
            SET_PARAMETER => {
                let call = parse_api_call(tool, arguments)?;
                Ok(self.record(call))
            }
            SET_MULTIPLE_PARAMETERS => {
                let calls = arguments
                    .get("calls")
                    .and_then(Value::as_array)
                    .ok_or_else(|| ToolError::invalid_arguments(tool, "missing 'calls' array"))?;
                let parsed = calls
                    .iter()
                    .map(|c| parse_api_call(tool, c))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(parsed.into_iter().map(|c| self.record(c)).collect()))
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    fn total_call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}
