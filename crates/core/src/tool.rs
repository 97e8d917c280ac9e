//! Tool specifications, the result envelope, and the registry.
//!
//! Tools are what give the assistant the ability to act in the world:
//! search the web, fetch pages, pull stock data, touch workspace files,
//! do arithmetic, remember things. Each capability declares an ordered
//! parameter schema up front; validation and coercion against that schema
//! happen in one place (the [`crate::executor::ToolExecutor`]), not per
//! tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// The declared type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    /// A list of strings. A bare string supplied by the model is coerced
    /// into a one-element list at the executor boundary.
    StringList,
    Object,
}

/// One entry in a tool's ordered parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A required parameter.
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    /// An optional parameter without a default.
    pub fn optional(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
            default: None,
        }
    }

    /// Attach a default value filled in when the model omits the parameter.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// A tool's declared interface: unique name, description shown to the
/// model, and the ordered parameter schema. Immutable once registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params,
        }
    }

    /// Convert this spec into a JSON-Schema tool definition for the model.
    pub fn to_definition(&self) -> ToolDefinition {
        let mut properties = Map::new();
        let mut required: Vec<Value> = Vec::new();

        for param in &self.params {
            let mut prop = Map::new();
            match param.kind {
                ParamKind::String => {
                    prop.insert("type".into(), Value::String("string".into()));
                }
                ParamKind::Integer => {
                    prop.insert("type".into(), Value::String("integer".into()));
                }
                ParamKind::Number => {
                    prop.insert("type".into(), Value::String("number".into()));
                }
                ParamKind::Boolean => {
                    prop.insert("type".into(), Value::String("boolean".into()));
                }
                ParamKind::StringList => {
                    prop.insert("type".into(), Value::String("array".into()));
                    prop.insert(
                        "items".into(),
                        serde_json::json!({ "type": "string" }),
                    );
                }
                ParamKind::Object => {
                    prop.insert("type".into(), Value::String("object".into()));
                }
            }
            prop.insert(
                "description".into(),
                Value::String(param.description.clone()),
            );
            if let Some(default) = &param.default {
                prop.insert("default".into(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(prop));
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".into(), Value::String("object".into()));
        schema.insert("properties".into(), Value::Object(properties));
        schema.insert("required".into(), Value::Array(required));

        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: Value::Object(schema),
        }
    }
}

/// A request to execute a tool, produced by the model's decision step and
/// validated against the tool's spec before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// The failure taxonomy surfaced to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnknownTool,
    InvalidArgument,
    Timeout,
    ToolError,
    StoreUnavailable,
    ParsingError,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::UnknownTool => "unknown_tool",
            FailureKind::InvalidArgument => "invalid_argument",
            FailureKind::Timeout => "timeout",
            FailureKind::ToolError => "tool_error",
            FailureKind::StoreUnavailable => "store_unavailable",
            FailureKind::ParsingError => "parsing_error",
        };
        f.write_str(s)
    }
}

/// The uniform result envelope for a tool execution.
///
/// Always serializable to a single bounded text blob via [`render`], which
/// is what gets fed back to the model as the observation.
///
/// [`render`]: ToolResult::render
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    Success { payload: Value },
    Failure { kind: FailureKind, message: String },
}

impl ToolResult {
    pub fn success(payload: Value) -> Self {
        Self::Success { payload }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    /// Convert a tool error into the matching Failure envelope.
    pub fn from_error(err: ToolError) -> Self {
        let kind = match &err {
            ToolError::UnknownTool(_) => FailureKind::UnknownTool,
            ToolError::InvalidArgument(_) => FailureKind::InvalidArgument,
            ToolError::Timeout { .. } => FailureKind::Timeout,
            ToolError::Parsing(_) => FailureKind::ParsingError,
            ToolError::StoreUnavailable(_) => FailureKind::StoreUnavailable,
            ToolError::Execution { .. } | ToolError::Denied { .. } | ToolError::DuplicateName(_) => {
                FailureKind::ToolError
            }
        };
        Self::Failure {
            kind,
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Serialize the result to a size-capped observation string.
    ///
    /// Failures render as an `{"error": …}` JSON object so the model sees
    /// structured failure text it can critique and recover from.
    pub fn render(&self, char_cap: usize) -> String {
        let text = match self {
            Self::Success { payload } => payload.to_string(),
            Self::Failure { kind, message } => {
                serde_json::json!({ "error": message, "kind": kind.to_string() }).to_string()
            }
        };
        truncate_chars(&text, char_cap)
    }
}

/// Deterministic truncation at a character boundary with a fixed marker.
pub fn truncate_chars(text: &str, cap: usize) -> String {
    if text.chars().count() <= cap {
        return text.to_string();
    }
    let mut out: String = text.chars().take(cap).collect();
    out.push_str("...[truncated]");
    out
}

/// The core Tool trait.
///
/// Each capability (web_search, calculator, save_memory, ...) implements
/// this trait. The executor validates arguments against `spec()` and runs
/// `invoke` under `timeout()`; implementations return a structured JSON
/// payload or a typed error, never a raw panic.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The declared interface of this tool.
    fn spec(&self) -> ToolSpec;

    /// Execution deadline. Network tools use a shorter window.
    fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    /// Execute with validated, coerced arguments.
    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError>;
}

/// The registry of available tools, frozen after construction.
///
/// The catalogue order exposed to the model is registration order.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    specs: Vec<ToolSpec>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            specs: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Fails if another tool already claimed the name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let spec = tool.spec();
        if self.index.contains_key(&spec.name) {
            return Err(ToolError::DuplicateName(spec.name));
        }
        self.index.insert(spec.name.clone(), self.tools.len());
        self.specs.push(spec);
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    /// All specs in registration order — the available-actions catalogue.
    pub fn list_specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Tool definitions for the model, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.specs.iter().map(ToolSpec::to_definition).collect()
    }

    /// Registered tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
