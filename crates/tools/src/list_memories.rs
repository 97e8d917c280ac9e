//! Memory inspection tool — dump everything in the store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use cipher_core::error::ToolError;
use cipher_core::memory::MemoryStore;
use cipher_core::tool::{Tool, ToolSpec};

use crate::memory_query::render_records;
use crate::memory_save::memory_to_tool_error;

pub struct ListMemoriesTool {
    store: Arc<dyn MemoryStore>,
}

impl ListMemoriesTool {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ListMemoriesTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "list_memories",
            "List everything currently stored in long-term memory.",
            vec![],
        )
    }

    async fn invoke(&self, _arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let records = self.store.list_all().await.map_err(memory_to_tool_error)?;
        Ok(serde_json::json!({ "memories": render_records(&records) }))
    }
}
