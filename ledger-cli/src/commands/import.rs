//! Import command - import transactions from a CSV export

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use super::{get_logger, load_context, log_event, spinner};
use crate::output::{success, warning};
use ledger_core::services::ImportMode;
use ledger_core::LogEvent;

/// Warnings listed before the rest are summarized
const SHOWN_WARNINGS: usize = 10;

pub async fn run(file: &Path, append: bool, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }

    let ctx = load_context().await?;
    let mode = if append {
        ImportMode::Append
    } else {
        ImportMode::Replace
    };

    let progress = spinner("Importing...");
    let result = ctx.import_service.import(file, mode).await;
    progress.finish_and_clear();
    let result = result?;

    log_event(
        &get_logger(),
        LogEvent::new("import_completed")
            .with_command("import")
            .with_storage(ctx.store.backend_name()),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    success(&format!(
        "Imported {} transactions from {}",
        result.imported,
        file.display()
    ));
    println!(
        "{} transactions stored ({})",
        result.total.to_string().bold(),
        ctx.store.backend_name()
    );

    if !result.warnings.is_empty() {
        println!();
        warning(&format!("{} fields were defaulted:", result.warnings.len()));
        for w in result.warnings.iter().take(SHOWN_WARNINGS) {
            println!("  {}", w);
        }
        if result.warnings.len() > SHOWN_WARNINGS {
            println!("  ... and {} more", result.warnings.len() - SHOWN_WARNINGS);
        }
    }

    Ok(())
}
