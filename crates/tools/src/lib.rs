//! Built-in tool implementations for Cipher.
//!
//! The fixed capability set: web search, page fetch, stock data,
//! arithmetic, the current date, workspace file access, long-term memory,
//! a clarification channel back to the user, and the explicitly gated
//! GUI-simulation and shell tools.
//!
//! `build_registry` assembles them in a fixed registration order — that
//! order is the catalogue the model sees.

pub mod ask_user;
pub mod browse_url;
pub mod calculator;
pub mod current_date;
pub mod file_read;
pub mod file_write;
pub mod gui_control;
pub mod list_files;
pub mod list_memories;
pub mod memory_query;
pub mod memory_save;
pub mod shell;
pub mod stock_price;
pub mod web_search;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use cipher_core::error::ToolError;
use cipher_core::memory::MemoryStore;
use cipher_core::tool::ToolRegistry;
use cipher_security::CommandAllowlist;

pub use ask_user::{AskUserTool, ClarificationRequest};
pub use gui_control::GuiState;

/// Everything the registry builder needs to wire the tools together.
pub struct ToolContext {
    /// Directory the file tools are confined to (created if missing).
    pub workspace_dir: PathBuf,

    /// The process-wide shared memory store.
    pub memory: Arc<dyn MemoryStore>,

    /// Channel to the session surface for clarification questions.
    /// `None` means every `ask_user` call resolves as "no response".
    pub clarifications: Option<mpsc::Sender<ClarificationRequest>>,

    /// Seconds to wait for a clarification reply.
    pub clarification_timeout_secs: u64,

    /// Register the simulated GUI control tools.
    pub enable_gui: bool,

    /// Register the shell execution tool.
    pub enable_shell: bool,

    /// Base commands the shell tool may run.
    pub shell_allowlist: Vec<String>,
}

impl ToolContext {
    pub fn new(workspace_dir: PathBuf, memory: Arc<dyn MemoryStore>) -> Self {
        Self {
            workspace_dir,
            memory,
            clarifications: None,
            clarification_timeout_secs: 120,
            enable_gui: false,
            enable_shell: false,
            shell_allowlist: Vec::new(),
        }
    }

    pub fn with_clarifications(
        mut self,
        sender: mpsc::Sender<ClarificationRequest>,
        timeout_secs: u64,
    ) -> Self {
        self.clarifications = Some(sender);
        self.clarification_timeout_secs = timeout_secs;
        self
    }

    pub fn with_gui(mut self, enabled: bool) -> Self {
        self.enable_gui = enabled;
        self
    }

    pub fn with_shell(mut self, enabled: bool, allowlist: Vec<String>) -> Self {
        self.enable_shell = enabled;
        self.shell_allowlist = allowlist;
        self
    }
}

/// Build the full tool registry in the fixed catalogue order.
pub fn build_registry(ctx: &ToolContext) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(web_search::WebSearchTool))?;
    registry.register(Arc::new(browse_url::BrowseUrlTool))?;
    registry.register(Arc::new(stock_price::StockPriceTool))?;
    registry.register(Arc::new(calculator::CalculatorTool))?;
    registry.register(Arc::new(current_date::CurrentDateTool))?;
    registry.register(Arc::new(file_write::FileWriteTool::new(
        ctx.workspace_dir.clone(),
    )))?;
    registry.register(Arc::new(file_read::FileReadTool::new(
        ctx.workspace_dir.clone(),
    )))?;
    registry.register(Arc::new(list_files::ListFilesTool::new(
        ctx.workspace_dir.clone(),
    )))?;
    registry.register(Arc::new(memory_save::MemorySaveTool::new(
        ctx.memory.clone(),
    )))?;
    registry.register(Arc::new(memory_query::MemoryQueryTool::new(
        ctx.memory.clone(),
    )))?;
    registry.register(Arc::new(list_memories::ListMemoriesTool::new(
        ctx.memory.clone(),
    )))?;
    registry.register(Arc::new(AskUserTool::new(
        ctx.clarifications.clone(),
        Duration::from_secs(ctx.clarification_timeout_secs),
    )))?;

    if ctx.enable_gui {
        let screen = Arc::new(GuiState::new());
        registry.register(Arc::new(gui_control::ScreenInspectTool::new(
            screen.clone(),
        )))?;
        registry.register(Arc::new(gui_control::MouseMoveTool::new(screen.clone())))?;
        registry.register(Arc::new(gui_control::MouseClickTool::new(screen.clone())))?;
        registry.register(Arc::new(gui_control::KeyboardTypeTool::new(screen)))?;
    }

    if ctx.enable_shell {
        registry.register(Arc::new(shell::ShellTool::new(CommandAllowlist::new(
            ctx.shell_allowlist.clone(),
        ))))?;
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipher_memory::InMemoryStore;

    fn base_context(dir: &std::path::Path) -> ToolContext {
        ToolContext::new(dir.to_path_buf(), Arc::new(InMemoryStore::new()))
    }

    #[test]
    fn default_registry_order() {
        let dir = tempfile::tempdir().unwrap();
        let registry = build_registry(&base_context(dir.path())).unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "web_search",
                "browse_url",
                "get_stock_price",
                "calculator",
                "get_current_date",
                "write_to_file",
                "read_from_file",
                "list_files",
                "save_memory",
                "search_memories",
                "list_memories",
                "ask_user",
            ]
        );
    }

    #[test]
    fn gated_tools_absent_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let registry = build_registry(&base_context(dir.path())).unwrap();
        assert!(registry.resolve("shell").is_none());
        assert!(registry.resolve("screen_inspect").is_none());
        assert!(registry.resolve("mouse_click").is_none());
    }

    #[test]
    fn gated_tools_registered_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = base_context(dir.path())
            .with_gui(true)
            .with_shell(true, vec!["echo".into()]);
        let registry = build_registry(&ctx).unwrap();
        assert!(registry.resolve("shell").is_some());
        assert!(registry.resolve("screen_inspect").is_some());
        assert!(registry.resolve("mouse_move").is_some());
        assert!(registry.resolve("mouse_click").is_some());
        assert!(registry.resolve("keyboard_type").is_some());
    }

    #[tokio::test]
    async fn bare_ticker_string_equals_one_element_list() {
        use cipher_core::executor::ToolExecutor;
        use cipher_core::tool::ToolCallRequest;

        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(build_registry(&base_context(dir.path())).unwrap());
        let executor = ToolExecutor::new(registry);

        let scalar: serde_json::Map<String, serde_json::Value> =
            serde_json::from_value(serde_json::json!({"tickers": "NVDA"})).unwrap();
        let list: serde_json::Map<String, serde_json::Value> =
            serde_json::from_value(serde_json::json!({"tickers": ["NVDA"]})).unwrap();

        let from_scalar = executor
            .execute(&ToolCallRequest::new("get_stock_price", scalar))
            .await;
        let from_list = executor
            .execute(&ToolCallRequest::new("get_stock_price", list))
            .await;

        assert!(from_scalar.is_success());
        assert_eq!(from_scalar.render(100_000), from_list.render(100_000));
    }

    #[tokio::test]
    async fn every_tool_with_required_params_rejects_empty_args() {
        use cipher_core::executor::ToolExecutor;
        use cipher_core::tool::{FailureKind, ToolCallRequest, ToolResult};

        let dir = tempfile::tempdir().unwrap();
        let ctx = base_context(dir.path())
            .with_gui(true)
            .with_shell(true, vec!["echo".into()]);
        let registry = Arc::new(build_registry(&ctx).unwrap());
        let executor = ToolExecutor::new(registry.clone());

        for spec in registry.list_specs() {
            if !spec.params.iter().any(|p| p.required) {
                continue;
            }
            let result = executor
                .execute(&ToolCallRequest::new(&spec.name, serde_json::Map::new()))
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
}
