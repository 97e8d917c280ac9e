//! Memory save tool — write a chunk into long-term memory.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use cipher_core::error::{MemoryError, ToolError};
use cipher_core::memory::MemoryStore;
use cipher_core::tool::{ParamKind, ParamSpec, Tool, ToolSpec};

pub struct MemorySaveTool {
    store: Arc<dyn MemoryStore>,
}

impl MemorySaveTool {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for MemorySaveTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "save_memory",
            "Save an important piece of information to long-term memory so it \
             can be recalled in future conversations. Use for durable facts, \
             preferences, and conclusions — not transient chatter.",
            vec![
                ParamSpec::required("content", ParamKind::String, "The text to remember"),
                ParamSpec::optional(
                    "metadata",
                    ParamKind::Object,
                    "Optional key/value tags (topic, source, ...)",
                ),
            ],
        )
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let content = arguments
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArgument("'content' must be a string".into()))?;

        let metadata = arguments
            .get("metadata")
            .and_then(Value::as_object)
            .cloned();

        let id = self
            .store
            .save(content, metadata)
            .await
            .map_err(memory_to_tool_error)?;

        debug!(memory_id = %id, "Saved memory chunk");
        Ok(serde_json::json!({
            "status": "success",
            "message": format!("Memory chunk saved with ID {id}."),
        }))
    }
}

pub(crate) fn memory_to_tool_error(err: MemoryError) -> ToolError {
    match err {
        MemoryError::StoreUnavailable(reason) => ToolError::StoreUnavailable(reason),
        other => ToolError::Execution {
            tool_name: "memory".into(),
            reason: other.to_string(),
        },
    }
}
