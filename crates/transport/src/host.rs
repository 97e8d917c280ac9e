//! The tool host — serves a tool registry over a byte stream.
//!
//! Reads one request frame per line, executes it through the uniform
//! executor, and writes one response frame per line. A malformed frame is
//! answered with an `{"error"}` content body rather than tearing the
//! connection down.

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use cipher_core::executor::ToolExecutor;
use cipher_core::tool::ToolCallRequest;

use crate::protocol::{ToolHostRequest, ToolHostResponse};

pub struct ToolHost {
    executor: Arc<ToolExecutor>,
}

impl ToolHost {
    pub fn new(executor: Arc<ToolExecutor>) -> Self {
        Self { executor }
    }

    /// Serve requests until the reader reaches EOF.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        info!(tools = self.executor.registry().len(), "Tool host serving");

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let content = match serde_json::from_str::<ToolHostRequest>(line) {
                Ok(request) => {
                    debug!(tool = %request.tool_name, "Tool host dispatching");
                    let call = ToolCallRequest::new(&request.tool_name, request.arguments);
                    let (_, rendered) = self.executor.execute_rendered(&call).await;
                    rendered
                }
                Err(e) => {
                    warn!(error = %e, "Malformed request frame");
                    serde_json::json!({ "error": format!("Malformed request: {e}") }).to_string()
                }
            };

            let response = ToolHostResponse::new(content);
            let mut frame = serde_json::to_string(&response)
                .unwrap_or_else(|_| r#"{"content":"{\"error\":\"encode failure\"}"}"#.into());
            frame.push('\n');
            writer.write_all(frame.as_bytes()).await?;
            writer.flush().await?;
        }

        info!("Tool host connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipher_core::tool::ToolRegistry;
    use cipher_memory::InMemoryStore;
    use cipher_tools::{ToolContext, build_registry};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    async fn spawn_host() -> (
        tokio::io::WriteHalf<tokio::io::DuplexStream>,
        BufReader<tokio::io::ReadHalf<tokio::io::DuplexStream>>,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(
            dir.path().to_path_buf(),
            Arc::new(InMemoryStore::new()),
        );
        let registry: ToolRegistry = build_registry(&ctx).unwrap();
        let executor = Arc::new(ToolExecutor::new(Arc::new(registry)));

        let (client_side, host_side) = tokio::io::duplex(64 * 1024);
        let (host_read, host_write) = tokio::io::split(host_side);
        tokio::spawn(async move {
            let host = ToolHost::new(executor);
            let _ = host.serve(host_read, host_write).await;
        });

        let (client_read, client_write) = tokio::io::split(client_side);
        (client_write, BufReader::new(client_read))
    }

    async fn round_trip(
        writer: &mut tokio::io::WriteHalf<tokio::io::DuplexStream>,
        reader: &mut BufReader<tokio::io::ReadHalf<tokio::io::DuplexStream>>,
        frame: &str,
    ) -> String {
        writer.write_all(frame.as_bytes()).await.unwrap();
        writer.write_all(b"\n").await.unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        let response: ToolHostResponse = serde_json::from_str(line.trim()).unwrap();
        response.content
    }

    #[tokio::test]
    async fn executes_tool_over_the_wire() {
        let (mut writer, mut reader) = spawn_host().await;
        let content = round_trip(
            &mut writer,
            &mut reader,
            r#"{"tool_name":"calculator","arguments":{"expression":"2 + 3"}}"#,
        )
        .await;
        let payload: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(payload["result"], 5.0);
    }

    #[tokio::test]
    async fn unknown_tool_is_error_content_not_fault() {
        let (mut writer, mut reader) = spawn_host().await;
        let content = round_trip(
            &mut writer,
            &mut reader,
            r#"{"tool_name":"frobnicate","arguments":{}}"#,
        )
        .await;
        let payload: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(payload["error"].as_str().unwrap().contains("frobnicate"));
    }

    #[tokio::test]
    async fn malformed_frame_answered_not_dropped() {
        let (mut writer, mut reader) = spawn_host().await;
        let content = round_trip(&mut writer, &mut reader, "this is not json").await;
        let payload: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(payload["error"].as_str().unwrap().contains("Malformed"));

        // The connection survives; a valid frame still works.
        let content = round_trip(
            &mut writer,
            &mut reader,
            r#"{"tool_name":"calculator","arguments":{"expression":"1 + 1"}}"#,
        )
        .await;
        let payload: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(payload["result"], 2.0);
    }

    #[tokio::test]
    async fn host_exits_on_eof() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(
            dir.path().to_path_buf(),
            Arc::new(InMemoryStore::new()),
        );
        let registry = build_registry(&ctx).unwrap();
        let executor = Arc::new(ToolExecutor::new(Arc::new(registry)));

        let (client_side, host_side) = tokio::io::duplex(4096);
        let (host_read, host_write) = tokio::io::split(host_side);
        let handle = tokio::spawn(async move {
            ToolHost::new(executor).serve(host_read, host_write).await
        });

        drop(client_side); // EOF
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
