//! Client side of the tool transport.
//!
//! `ToolHostClient` speaks the JSON-line protocol over any byte stream.
//! `RemoteTool` wraps a client plus a spec so an out-of-process tool
//! implements the same `Tool` trait as an in-process one — the reasoning
//! loop cannot tell the difference.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::debug;

use cipher_core::error::ToolError;
use cipher_core::tool::{Tool, ToolSpec};

use crate::protocol::{ToolHostRequest, ToolHostResponse};

/// A connection to a tool host.
pub struct ToolHostClient<R, W> {
    reader: BufReader<R>,
    writer: W,
}

impl<R, W> ToolHostClient<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Call a tool on the host and return the response content text.
    ///
    /// Any non-well-formed response is surfaced as a tool error — the
    /// loop will see a ToolError-kind failure, never a crash.
    pub async fn call(
        &mut self,
        tool_name: &str,
        arguments: Map<String, Value>,
    ) -> Result<String, ToolError> {
        let request = ToolHostRequest::new(tool_name, arguments);
        let mut frame = serde_json::to_string(&request).map_err(|e| ToolError::Execution {
            tool_name: tool_name.into(),
            reason: format!("Failed to encode request: {e}"),
        })?;
        frame.push('\n');

        self.writer
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| transport_error(tool_name, "write", e))?;
        self.writer
            .flush()
            .await
            .map_err(|e| transport_error(tool_name, "flush", e))?;

        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| transport_error(tool_name, "read", e))?;
        if read == 0 {
            return Err(ToolError::Execution {
                tool_name: tool_name.into(),
                reason: "Tool host closed the connection".into(),
            });
        }

        let response: ToolHostResponse =
            serde_json::from_str(line.trim()).map_err(|e| ToolError::Execution {
                tool_name: tool_name.into(),
                reason: format!("Non-well-formed response from tool host: {e}"),
            })?;

        debug!(tool = tool_name, bytes = response.content.len(), "Tool host replied");
        Ok(response.content)
    }
}

fn transport_error(tool_name: &str, op: &str, e: std::io::Error) -> ToolError {
    ToolError::Execution {
        tool_name: tool_name.into(),
        reason: format!("Transport {op} failed: {e}"),
    }
}

/// An out-of-process tool, presented through the in-process `Tool` trait.
pub struct RemoteTool<R, W> {
    spec: ToolSpec,
    client: Arc<Mutex<ToolHostClient<R, W>>>,
    timeout: Duration,
}

impl<R, W> RemoteTool<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(spec: ToolSpec, client: Arc<Mutex<ToolHostClient<R, W>>>) -> Self {
        Self {
            spec,
            client,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl<R, W> Tool for RemoteTool<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn spec(&self) -> ToolSpec {
        self.spec.clone()
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let content = {
            let mut client = self.client.lock().await;
            client.call(&self.spec.name, arguments).await?
        };

        // Errors ride inside the content as an {"error"} object.
        match serde_json::from_str::<Value>(&content) {
            Ok(value) => {
                if let Some(error) = value.get("error").and_then(Value::as_str) {
                    return Err(ToolError::Execution {
                        tool_name: self.spec.name.clone(),
                        reason: error.to_string(),
                    });
                }
                Ok(value)
            }
            // Plain text content is a legitimate observation.
            Err(_) => Ok(Value::String(content)),
        }
    }
}
