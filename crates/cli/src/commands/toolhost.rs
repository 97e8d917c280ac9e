//! Out-of-process tool host command.
//!
//! Serves the full tool registry over stdio using the JSON-line
//! protocol, so a reasoning loop in another process can call tools here
//! through `cipher-transport`.

use std::path::Path;
use tracing::info;

use cipher_transport::ToolHost;

use super::wiring::{self, CliError};

pub async fn run(config_path: &Path) -> Result<(), CliError> {
    let config = wiring::load_config(config_path)?;
    let memory = wiring::open_memory_store(&config).await?;

    // No clarification surface in a headless host: ask_user resolves to
    // its "no response" observation instead of blocking.
    let executor = wiring::build_executor(&config, memory, None)?;

    info!("Serving tool host on stdio");
    let host = ToolHost::new(executor);
    host.serve(tokio::io::stdin(), tokio::io::stdout()).await?;
    Ok(())
}
