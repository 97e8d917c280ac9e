//! Simulated GUI control tools.
//!
//! Screen inspection, mouse movement/clicks, and keyboard input against a
//! shared simulated screen. These are gated behind `[tools] enable_gui`;
//! a production deployment would bind the same tool contracts to a real
//! desktop automation backend.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

use cipher_core::error::ToolError;
use cipher_core::tool::{ParamKind, ParamSpec, Tool, ToolSpec};

/// Simulated screen dimensions.
pub const SCREEN_WIDTH: i64 = 1920;
pub const SCREEN_HEIGHT: i64 = 1080;

/// Shared state of the simulated screen, so the individual GUI tools
/// observe each other's effects within a session.
pub struct GuiState {
    inner: Mutex<GuiStateInner>,
}

#[derive(Default)]
struct GuiStateInner {
    cursor: (i64, i64),
    clicks: u64,
    typed: String,
}

impl GuiState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(GuiStateInner::default()),
        }
    }
}

impl Default for GuiState {
    fn default() -> Self {
        Self::new()
    }
}

// ── screen_inspect ─────────────────────────────────────────────────────────

pub struct ScreenInspectTool {
    state: Arc<GuiState>,
}

impl ScreenInspectTool {
    pub fn new(state: Arc<GuiState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for ScreenInspectTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "screen_inspect",
            "Inspect the current screen: dimensions, cursor position, and \
             visible UI elements.",
            vec![],
        )
    }

    async fn invoke(&self, _arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let inner = self.state.inner.lock().await;
        Ok(serde_json::json!({
            "width": SCREEN_WIDTH,
            "height": SCREEN_HEIGHT,
            "cursor": { "x": inner.cursor.0, "y": inner.cursor.1 },
            "clicks": inner.clicks,
            "typed_text": inner.typed,
            "elements": [
                { "kind": "window", "title": "Desktop", "x": 0, "y": 0,
                  "width": SCREEN_WIDTH, "height": SCREEN_HEIGHT },
            ],
        }))
    }
}

// ── mouse_move ─────────────────────────────────────────────────────────────

pub struct MouseMoveTool {
    state: Arc<GuiState>,
}

impl MouseMoveTool {
    pub fn new(state: Arc<GuiState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for MouseMoveTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "mouse_move",
            "Move the mouse cursor to the given screen coordinates.",
            vec![
                ParamSpec::required("x", ParamKind::Integer, "Target x coordinate"),
                ParamSpec::required("y", ParamKind::Integer, "Target y coordinate"),
            ],
        )
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let x = arguments
            .get("x")
            .and_then(Value::as_i64)
            .ok_or_else(|| ToolError::InvalidArgument("'x' must be an integer".into()))?;
        let y = arguments
            .get("y")
            .and_then(Value::as_i64)
            .ok_or_else(|| ToolError::InvalidArgument("'y' must be an integer".into()))?;

        if !(0..SCREEN_WIDTH).contains(&x) || !(0..SCREEN_HEIGHT).contains(&y) {
            return Err(ToolError::InvalidArgument(format!(
                "Coordinates ({x}, {y}) outside the {SCREEN_WIDTH}x{SCREEN_HEIGHT} screen"
            )));
        }

        let mut inner = self.state.inner.lock().await;
        inner.cursor = (x, y);
        Ok(serde_json::json!({ "status": "moved", "x": x, "y": y }))
    }
}

// ── mouse_click ────────────────────────────────────────────────────────────

pub struct MouseClickTool {
    state: Arc<GuiState>,
}

impl MouseClickTool {
    pub fn new(state: Arc<GuiState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for MouseClickTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "mouse_click",
            "Click the mouse at its current position.",
            vec![
                ParamSpec::optional("button", ParamKind::String, "'left' or 'right'")
                    .with_default(Value::String("left".into())),
            ],
        )
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let button = arguments
            .get("button")
            .and_then(Value::as_str)
            .unwrap_or("left");
        if button != "left" && button != "right" {
            return Err(ToolError::InvalidArgument(format!(
                "Unknown mouse button: '{button}'"
            )));
        }

        let mut inner = self.state.inner.lock().await;
        inner.clicks += 1;
        Ok(serde_json::json!({
            "status": "clicked",
            "button": button,
            "x": inner.cursor.0,
            "y": inner.cursor.1,
        }))
    }
}

// ── keyboard_type ──────────────────────────────────────────────────────────

pub struct KeyboardTypeTool {
    state: Arc<GuiState>,
}

impl KeyboardTypeTool {
    pub fn new(state: Arc<GuiState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for KeyboardTypeTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "keyboard_type",
            "Type text at the current focus.",
            vec![ParamSpec::required(
                "text",
                ParamKind::String,
                "The text to type",
            )],
        )
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let text = arguments
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArgument("'text' must be a string".into()))?;

        let mut inner = self.state.inner.lock().await;
        inner.typed.push_str(text);
        Ok(serde_json::json!({ "status": "typed", "chars": text.chars().count() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_args(pairs: &[(&str, i64)]) -> Map<String, Value> {
        let mut map = Map::new();
        for (k, v) in pairs {
            map.insert((*k).into(), Value::from(*v));
        }
        map
    }

    #[tokio::test]
    async fn move_click_type_inspect_share_state() {
        let state = Arc::new(GuiState::new());

        MouseMoveTool::new(state.clone())
            .invoke(int_args(&[("x", 100), ("y", 200)]))
            .await
            .unwrap();

        MouseClickTool::new(state.clone())
            .invoke(Map::new())
            .await
            .unwrap();

        let mut text_args = Map::new();
        text_args.insert("text".into(), Value::String("hello".into()));
        KeyboardTypeTool::new(state.clone())
            .invoke(text_args)
            .await
            .unwrap();

        let snapshot = ScreenInspectTool::new(state)
            .invoke(Map::new())
            .await
            .unwrap();
        assert_eq!(snapshot["cursor"]["x"], 100);
        assert_eq!(snapshot["cursor"]["y"], 200);
        assert_eq!(snapshot["clicks"], 1);
        assert_eq!(snapshot["typed_text"], "hello");
    }

    #[tokio::test]
    async fn out_of_bounds_move_rejected() {
        let tool = MouseMoveTool::new(Arc::new(GuiState::new()));
        let err = tool
            .invoke(int_args(&[("x", 5000), ("y", 10)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn click_reports_cursor_position() {
        let state = Arc::new(GuiState::new());
        let payload = MouseClickTool::new(state)
            .invoke(Map::new())
            .await
            .unwrap();
        assert_eq!(payload["button"], "left");
        assert_eq!(payload["x"], 0);
        assert_eq!(payload["y"], 0);
    }

    #[tokio::test]
    async fn unknown_button_rejected() {
        let tool = MouseClickTool::new(Arc::new(GuiState::new()));
        let mut args = Map::new();
        args.insert("button".into(), Value::String("middle".into()));
        let err = tool.invoke(args).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }
}
