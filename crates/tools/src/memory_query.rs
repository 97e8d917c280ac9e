//! Memory query tool — semantic search over long-term memory.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use cipher_core::error::ToolError;
use cipher_core::memory::{MemoryRecord, MemoryStore};
use cipher_core::tool::{ParamKind, ParamSpec, Tool, ToolSpec};

use crate::memory_save::memory_to_tool_error;

pub struct MemoryQueryTool {
    store: Arc<dyn MemoryStore>,
}

impl MemoryQueryTool {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for MemoryQueryTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "search_memories",
            "Search long-term memory for information relevant to a query. Use \
             this to recall facts, preferences, or past conclusions before \
             answering.",
            vec![
                ParamSpec::required("query", ParamKind::String, "What to look for"),
                ParamSpec::optional(
                    "n_results",
                    ParamKind::Integer,
                    "Maximum results to return (default 5)",
                )
                .with_default(Value::from(5)),
            ],
        )
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let query = arguments
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArgument("'query' must be a string".into()))?;

        let n_results = arguments
            .get("n_results")
            .and_then(Value::as_u64)
            .unwrap_or(5)
            .clamp(1, 50) as usize;

        let records = self
            .store
            .query(query, n_results)
            .await
            .map_err(memory_to_tool_error)?;

        Ok(serde_json::json!({ "memories": render_records(&records) }))
    }
}

pub(crate) fn render_records(records: &[MemoryRecord]) -> Vec<Value> {
    records
        .iter()
        .map(|r| {
            serde_json::json!({
                "id": r.id,
                "content": r.content,
                "metadata": r.metadata,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipher_memory::InMemoryStore;

    fn args(query: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("query".into(), Value::String(query.into()));
        map
    }

    #[tokio::test]
    async fn finds_relevant_memory() {
        let store = Arc::new(InMemoryStore::new());
        store
            .save("The user tracks NVDA and GOOGL in their portfolio", None)
            .await
            .unwrap();
        store.save("Pasta water should be salty", None).await.unwrap();

        let tool = MemoryQueryTool::new(store);
        let payload = tool.invoke(args("NVDA portfolio")).await.unwrap();
        let memories = payload["memories"].as_array().unwrap();
        assert!(!memories.is_empty());
        assert!(memories[0]["content"].as_str().unwrap().contains("NVDA"));
        assert!(memories[0]["id"].as_str().unwrap().starts_with("mem_"));
        assert!(memories[0]["metadata"].is_object());
    }

    #[tokio::test]
    async fn empty_store_yields_empty_list() {
        let tool = MemoryQueryTool::new(Arc::new(InMemoryStore::new()));
        let payload = tool.invoke(args("anything")).await.unwrap();
        assert_eq!(payload["memories"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn n_results_caps_output() {
        let store = Arc::new(InMemoryStore::new());
        for i in 0..8 {
            store
                .save(&format!("observation {i} about markets"), None)
                .await
                .unwrap();
        }

        let tool = MemoryQueryTool::new(store);
        let mut map = args("markets");
        map.insert("n_results".into(), Value::from(3));
        let payload = tool.invoke(map).await.unwrap();
        assert_eq!(payload["memories"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn missing_query_rejected() {
        let tool = MemoryQueryTool::new(Arc::new(InMemoryStore::new()));
        let err = tool.invoke(Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }
}
