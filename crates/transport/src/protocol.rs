//! The wire protocol: one JSON object per line, request/response.
//!
//! Tool-level errors ride *inside* the response content as an `{"error"}`
//! JSON object — a transport frame is only ever malformed when the peer
//! itself is broken.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tool invocation request frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolHostRequest {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// A tool invocation response frame.
///
/// `content` is the rendered observation text (success payload or
/// `{"error"}` object), already size-capped by the host's executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolHostResponse {
    pub content: String,
}

impl ToolHostRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

impl ToolHostResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trip() {
        let mut args = Map::new();
        args.insert("query".into(), Value::String("rust".into()));
        let request = ToolHostRequest::new("web_search", args);

        let line = serde_json::to_string(&request).unwrap();
        let parsed: ToolHostRequest = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.tool_name, "web_search");
        assert_eq!(parsed.arguments["query"], "rust");
    }

    #[test]
    fn request_arguments_default_to_empty() {
        let parsed: ToolHostRequest =
            serde_json::from_str(r#"{"tool_name":"get_current_date"}"#).unwrap();
        assert!(parsed.arguments.is_empty());
    }

    #[test]
    fn response_round_trip() {
        let response = ToolHostResponse::new(r#"{"result":5}"#);
        let line = serde_json::to_string(&response).unwrap();
        let parsed: ToolHostResponse = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.content, r#"{"result":5}"#);
    }
}
