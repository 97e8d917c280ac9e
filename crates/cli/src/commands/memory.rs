//! Memory inspection command.

use std::path::Path;

use super::wiring::{self, CliError};

pub async fn run_list(config_path: &Path) -> Result<(), CliError> {
    let config = wiring::load_config(config_path)?;
    let store = wiring::open_memory_store(&config).await?;

    let records = store.list_all().await?;
    if records.is_empty() {
        println!("No memories stored.");
        return Ok(());
    }

    println!("{} memories ({} backend):", records.len(), store.name());
    for record in records {
        let preview: String = record.content.chars().take(80).collect();
        let suffix = if record.content.chars().count() > 80 {
            "..."
        } else {
            ""
        };
        println!(
            "  {}  {}  {preview}{suffix}",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M"),
        );
    }

    Ok(())
}
