//! Configuration loading and validation for Cipher.
//!
//! Loads configuration from a TOML file (default `cipher.toml` next to the
//! binary or `~/.cipher/config.toml`) with environment variable overrides
//! for secrets. Every knob has a serde default so an empty file is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable that overrides the provider API key.
pub const API_KEY_ENV: &str = "CIPHER_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The root configuration structure.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Model endpoint settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name ("openrouter", "openai", "ollama")
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Base URL override; empty uses the provider's default endpoint
    #[serde(default)]
    pub api_url: Option<String>,

    /// API key; prefer the CIPHER_API_KEY environment variable
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_provider_name() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            api_url: None,
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

/// Reasoning loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model-decision cycles per user turn before forced failure
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Maximum turns kept in the rolling conversation window
    #[serde(default = "default_window_turns")]
    pub window_turns: usize,

    /// Maximum memories recalled at the start of a turn
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,

    /// Auto-save a summary of each completed exchange to memory
    #[serde(default = "default_true")]
    pub auto_save: bool,

    /// Character cap on each observation fed back to the model
    #[serde(default = "default_observation_char_cap")]
    pub observation_char_cap: usize,

    /// Optional system prompt override
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_max_iterations() -> u32 {
    12
}
fn default_window_turns() -> usize {
    50
}
fn default_recall_limit() -> usize {
    5
}
fn default_true() -> bool {
    true
}
fn default_observation_char_cap() -> usize {
    8_000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            window_turns: default_window_turns(),
            recall_limit: default_recall_limit(),
            auto_save: true,
            observation_char_cap: default_observation_char_cap(),
            system_prompt: None,
        }
    }
}

/// Memory store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Backend: "sqlite" or "in_memory"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// SQLite database path
    #[serde(default = "default_memory_path")]
    pub path: String,

    /// Optional cap on stored records; unset keeps everything
    #[serde(default)]
    pub retention_max_records: Option<usize>,
}

fn default_memory_backend() -> String {
    "sqlite".into()
}
fn default_memory_path() -> String {
    "memory_db/cipher.db".into()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: default_memory_path(),
            retention_max_records: None,
        }
    }
}

/// Workspace (file tool sandbox) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory all file tools are confined to
    #[serde(default = "default_workspace_dir")]
    pub dir: PathBuf,
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from("workspace")
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            dir: default_workspace_dir(),
        }
    }
}

/// Capability gating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Register the simulated GUI control tools
    #[serde(default)]
    pub enable_gui: bool,

    /// Register the shell execution tool
    #[serde(default)]
    pub enable_shell: bool,

    /// Base commands the shell tool may run
    #[serde(default = "default_shell_allowlist")]
    pub shell_allowlist: Vec<String>,

    /// Seconds to wait for a clarification reply from the user
    #[serde(default = "default_clarification_timeout_secs")]
    pub clarification_timeout_secs: u64,
}

fn default_shell_allowlist() -> Vec<String> {
    ["ls", "cat", "head", "tail", "echo", "pwd", "date", "wc", "grep"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_clarification_timeout_secs() -> u64 {
    120
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enable_gui: false,
            enable_shell: false,
            shell_allowlist: default_shell_allowlist(),
            clarification_timeout_secs: default_clarification_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("agent", &self.agent)
            .field("memory", &self.memory)
            .field("workspace", &self.workspace)
            .field("tools", &self.tools)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply env overrides.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            toml::from_str(&raw)?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (secrets stay out of files).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.is_empty()
        {
            self.provider.api_key = Some(key);
        }
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::Io {
                path: "<config>".into(),
                reason: "agent.max_iterations must be at least 1".into(),
            });
        }
        Ok(())
    }
}
