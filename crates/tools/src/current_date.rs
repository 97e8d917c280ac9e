//! Current date tool.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};

use cipher_core::error::ToolError;
use cipher_core::tool::{Tool, ToolSpec};

pub struct CurrentDateTool;

#[async_trait]
impl Tool for CurrentDateTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_current_date",
            "Get the current date and time. Use this whenever the user's \
             request depends on today's date.",
            vec![],
        )
    }

    async fn invoke(&self, _arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let now = Utc::now();
        Ok(serde_json::json!({
            "current_datetime": now.to_rfc3339(),
            "weekday": now.format("%A").to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_parseable_timestamp() {
        let tool = CurrentDateTool;
        let payload = tool.invoke(Map::new()).await.unwrap();
        let stamp = payload["current_datetime"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
        assert!(payload["weekday"].is_string());
    }

    #[test]
    fn spec_has_no_parameters() {
        let spec = CurrentDateTool.spec();
        assert_eq!(spec.name, "get_current_date");
        assert!(spec.params.is_empty());
    }
}
