//! The tool executor — the single boundary between the reasoning loop and
//! tool implementations.
//!
//! `execute` never returns an error: every outcome, including an unknown
//! tool name, a schema violation, a timeout, or a panic-free
//! implementation failure, is normalized into the [`ToolResult`] envelope
//! so the model always receives a structured observation it can react to.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::tool::{FailureKind, ParamKind, ToolCallRequest, ToolRegistry, ToolResult, ToolSpec};

/// Default cap on the rendered observation text fed back to the model.
pub const DEFAULT_OBSERVATION_CHAR_CAP: usize = 8_000;

/// Executes validated tool calls with a bounded timeout.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    observation_char_cap: usize,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            observation_char_cap: DEFAULT_OBSERVATION_CHAR_CAP,
        }
    }

    /// Override the observation size cap.
    pub fn with_observation_cap(mut self, cap: usize) -> Self {
        self.observation_char_cap = cap.max(64);
        self
    }

    pub fn observation_char_cap(&self) -> usize {
        self.observation_char_cap
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Execute a tool call request, returning the uniform result envelope.
    pub async fn execute(&self, request: &ToolCallRequest) -> ToolResult {
        let Some(tool) = self.registry.resolve(&request.tool_name) else {
            return ToolResult::failure(
                FailureKind::UnknownTool,
                format!("Unknown tool: {}", request.tool_name),
            );
        };

        let spec = tool.spec();
        let arguments = match prepare_arguments(&spec, &request.arguments) {
            Ok(args) => args,
            Err(err) => {
                warn!(tool = %request.tool_name, error = %err, "Argument validation failed");
                return ToolResult::from_error(err);
            }
        };

        let timeout = tool.timeout();
        debug!(tool = %request.tool_name, timeout_secs = timeout.as_secs(), "Executing tool");

        match tokio::time::timeout(timeout, tool.invoke(arguments)).await {
            Err(_) => ToolResult::failure(
                FailureKind::Timeout,
                ToolError::Timeout {
                    tool_name: request.tool_name.clone(),
                    timeout_secs: timeout.as_secs(),
                }
                .to_string(),
            ),
            Ok(Err(err)) => {
                warn!(tool = %request.tool_name, error = %err, "Tool execution failed");
                ToolResult::from_error(err)
            }
            Ok(Ok(payload)) => ToolResult::success(payload),
        }
    }

    /// Execute and render in one step — the observation string for the model.
    pub async fn execute_rendered(&self, request: &ToolCallRequest) -> (ToolResult, String) {
        let result = self.execute(request).await;
        let rendered = result.render(self.observation_char_cap);
        (result, rendered)
    }
}

/// Validate and coerce raw arguments against a tool spec.
///
/// - missing required parameter → `InvalidArgument`
/// - missing optional parameter with a declared default → default filled in
/// - a bare string for a `StringList` parameter → one-element list
/// - unknown extra arguments → dropped (models over-generate; tolerate it)
fn prepare_arguments(
    spec: &ToolSpec,
    raw: &Map<String, Value>,
) -> Result<Map<String, Value>, ToolError> {
    let mut prepared = Map::new();

    for param in &spec.params {
        match raw.get(&param.name) {
            Some(value) => {
                prepared.insert(param.name.clone(), coerce(param.kind, value)?);
            }
            None if param.required => {
                return Err(ToolError::InvalidArgument(format!(
                    "Missing required parameter '{}' for tool '{}'",
                    param.name, spec.name
                )));
            }
            None => {
                if let Some(default) = &param.default {
                    prepared.insert(param.name.clone(), default.clone());
                }
            }
        }
    }

    Ok(prepared)
}

fn coerce(kind: ParamKind, value: &Value) -> Result<Value, ToolError> {
    match (kind, value) {
        // The forgiving scalar-to-list rule: a bare string becomes a
        // one-element list rather than failing.
        (ParamKind::StringList, Value::String(s)) => {
            Ok(Value::Array(vec![Value::String(s.clone())]))
        }
        (ParamKind::StringList, Value::Array(_)) => Ok(value.clone()),
        (ParamKind::StringList, other) => Err(ToolError::InvalidArgument(format!(
            "Expected a string or list of strings, got: {other}"
        ))),
        // Everything else passes through as supplied; tools read values
        // leniently and models sometimes send numbers as strings.
        _ => Ok(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ParamSpec, Tool};
    use async_trait::async_trait;
    use std::time::Duration;

    struct AdderTool;

    #[async_trait]
    impl Tool for AdderTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new(
                "adder",
                "Adds two numbers",
                vec![
                    ParamSpec::required("a", ParamKind::Number, "First operand"),
                    ParamSpec::required("b", ParamKind::Number, "Second operand"),
                ],
            )
        }

        async fn invoke(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
            let a = args.get("a").and_then(Value::as_f64).unwrap_or(0.0);
            let b = args.get("b").and_then(Value::as_f64).unwrap_or(0.0);
            Ok(serde_json::json!({ "sum": a + b }))
        }
    }

    struct JoinTool;

    #[async_trait]
    impl Tool for JoinTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new(
                "join",
                "Joins strings",
                vec![
                    ParamSpec::required("items", ParamKind::StringList, "Strings to join"),
                    ParamSpec::optional("sep", ParamKind::String, "Separator")
                        .with_default(Value::String(",".into())),
                ],
            )
        }

        async fn invoke(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
            let items: Vec<String> = args
                .get("items")
                .and_then(Value::as_array)
                .map(|a| {
                    a.iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();
            let sep = args.get("sep").and_then(Value::as_str).unwrap_or(",");
            Ok(Value::String(items.join(sep)))
        }
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new("slow", "Sleeps forever", vec![])
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(20)
        }

        async fn invoke(&self, _: Map<String, Value>) -> Result<Value, ToolError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(Value::Null)
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new("failing", "Always fails", vec![])
        }

        async fn invoke(&self, _: Map<String, Value>) -> Result<Value, ToolError> {
            Err(ToolError::Execution {
                tool_name: "failing".into(),
                reason: "deliberate failure".into(),
            })
        }
    }

    fn executor() -> ToolExecutor {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(AdderTool)).unwrap();
        registry.register(Arc::new(JoinTool)).unwrap();
        registry.register(Arc::new(SlowTool)).unwrap();
        registry.register(Arc::new(FailingTool)).unwrap();
        ToolExecutor::new(Arc::new(registry))
    }

    fn request(name: &str, args: Value) -> ToolCallRequest {
        let arguments = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        ToolCallRequest::new(name, arguments)
    }

    #[tokio::test]
    async fn executes_valid_call() {
        let exec = executor();
        let result = exec
            .execute(&request("adder", serde_json::json!({"a": 2, "b": 3})))
            .await;
        match result {
            ToolResult::Success { payload } => assert_eq!(payload["sum"], 5.0),
            other => panic!("Expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_failure_not_error() {
        let exec = executor();
        let result = exec
            .execute(&request("nonexistent", serde_json::json!({})))
            .await;
        match result {
            ToolResult::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::UnknownTool);
                assert!(message.contains("nonexistent"));
            }
            other => panic!("Expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_required_argument_is_invalid_argument() {
        let exec = executor();
        let result = exec
            .execute(&request("adder", serde_json::json!({"a": 2})))
            .await;
        match result {
            ToolResult::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::InvalidArgument);
                assert!(message.contains("'b'"));
            }
            other => panic!("Expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_required_never_panics_for_any_registered_tool() {
        let exec = executor();
        for spec in exec.registry().list_specs() {
            if !spec.params.iter().any(|p| p.required) {
                continue;
            }
            let result = exec
                .execute(&request(&spec.name, serde_json::json!({})))
                .await;
            assert!(
                matches!(
                    result,
                    ToolResult::Failure {
                        kind: FailureKind::InvalidArgument,
                        ..
                    }
                ),
                "tool {} should reject empty arguments",
                spec.name
            );
        }
    }

    #[tokio::test]
    async fn scalar_coerces_to_single_element_list() {
        let exec = executor();
        let as_scalar = exec
            .execute(&request("join", serde_json::json!({"items": "solo"})))
            .await;
        let as_list = exec
            .execute(&request("join", serde_json::json!({"items": ["solo"]})))
            .await;
        assert_eq!(as_scalar.render(1000), as_list.render(1000));
    }

    #[tokio::test]
    async fn default_fills_missing_optional() {
        let exec = executor();
        let result = exec
            .execute(&request("join", serde_json::json!({"items": ["a", "b"]})))
            .await;
        match result {
            ToolResult::Success { payload } => assert_eq!(payload, Value::String("a,b".into())),
            other => panic!("Expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_extra_arguments_are_dropped() {
        let exec = executor();
        let result = exec
            .execute(&request(
                "adder",
                serde_json::json!({"a": 1, "b": 2, "frobnicate": true}),
            ))
            .await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn timeout_becomes_timeout_failure() {
        let exec = executor();
        let result = exec.execute(&request("slow", serde_json::json!({}))).await;
        match result {
            ToolResult::Failure { kind, .. } => assert_eq!(kind, FailureKind::Timeout),
            other => panic!("Expected timeout failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn implementation_error_becomes_tool_error_failure() {
        let exec = executor();
        let result = exec
            .execute(&request("failing", serde_json::json!({})))
            .await;
        match result {
            ToolResult::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::ToolError);
                assert!(message.contains("deliberate failure"));
            }
            other => panic!("Expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rendered_observation_respects_cap() {
        let exec = executor().with_observation_cap(64);
        let (_, rendered) = exec
            .execute_rendered(&request(
                "join",
                serde_json::json!({"items": vec!["long-item"; 200]}),
            ))
            .await;
        assert!(rendered.chars().count() <= 64 + "...[truncated]".len());
    }
}
