//! Shared construction of the long-lived handles: config, memory store,
//! provider, tool registry, executor.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use cipher_config::AppConfig;
use cipher_core::executor::ToolExecutor;
use cipher_core::memory::{MemoryStore, RetentionPolicy};
use cipher_core::provider::Provider;
use cipher_memory::{InMemoryStore, SqliteStore};
use cipher_providers::OpenAiCompatProvider;
use cipher_tools::{ClarificationRequest, ToolContext, build_registry};

pub type CliError = Box<dyn std::error::Error>;

pub fn load_config(path: &Path) -> Result<AppConfig, CliError> {
    let config = AppConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

pub async fn open_memory_store(config: &AppConfig) -> Result<Arc<dyn MemoryStore>, CliError> {
    let retention = match config.memory.retention_max_records {
        Some(cap) => RetentionPolicy::MaxRecords(cap),
        None => RetentionPolicy::Unbounded,
    };

    match config.memory.backend.as_str() {
        "in_memory" => Ok(Arc::new(InMemoryStore::new().with_retention(retention))),
        "sqlite" => {
            if let Some(parent) = Path::new(&config.memory.path).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            let url = format!("sqlite://{}", config.memory.path);
            let store = SqliteStore::new(&url).await?.with_retention(retention);
            Ok(Arc::new(store))
        }
        other => Err(format!("Unknown memory backend: '{other}'").into()),
    }
}

pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, CliError> {
    let key = config.provider.api_key.clone().unwrap_or_default();

    let provider = match config.provider.name.as_str() {
        "openrouter" => {
            require_key(&key)?;
            OpenAiCompatProvider::openrouter(key)?
        }
        "openai" => {
            require_key(&key)?;
            OpenAiCompatProvider::openai(key)?
        }
        "ollama" => OpenAiCompatProvider::ollama(config.provider.api_url.as_deref())?,
        name => {
            let url = config
                .provider
                .api_url
                .clone()
                .ok_or_else(|| format!("Provider '{name}' requires provider.api_url"))?;
            OpenAiCompatProvider::new(name, url, key)?
        }
    };

    info!(provider = %config.provider.name, model = %config.provider.model, "Provider ready");
    Ok(Arc::new(provider))
}

fn require_key(key: &str) -> Result<(), CliError> {
    if key.is_empty() {
        return Err(format!(
            "No API key configured; set {} or provider.api_key",
            cipher_config::API_KEY_ENV
        )
        .into());
    }
    Ok(())
}

pub fn build_executor(
    config: &AppConfig,
    memory: Arc<dyn MemoryStore>,
    clarifications: Option<mpsc::Sender<ClarificationRequest>>,
) -> Result<Arc<ToolExecutor>, CliError> {
    let mut ctx = ToolContext::new(config.workspace.dir.clone(), memory)
        .with_gui(config.tools.enable_gui)
        .with_shell(
            config.tools.enable_shell,
            config.tools.shell_allowlist.clone(),
        );
    if let Some(sender) = clarifications {
        ctx = ctx.with_clarifications(sender, config.tools.clarification_timeout_secs);
    }

    let registry = Arc::new(build_registry(&ctx)?);
    Ok(Arc::new(
        ToolExecutor::new(registry).with_observation_cap(config.agent.observation_char_cap),
    ))
}
