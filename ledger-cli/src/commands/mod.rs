//! CLI command implementations

pub mod ask;
pub mod auth;
pub mod compare;
pub mod config;
pub mod dashboard;
pub mod import;
pub mod list;
pub mod logs;
pub mod status;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use ledger_core::{Error, LedgerContext, LogEvent, LoggingService, Month};
use tracing::debug;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    LoggingService::new(&get_data_dir(), env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the data directory from environment or default
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LEDGER_LENS_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ledger-lens")
    }
}

/// Create the context without touching the store
pub fn get_context() -> Result<LedgerContext> {
    let data_dir = get_data_dir();
    LedgerContext::new(&data_dir)
        .with_context(|| format!("Failed to initialize Ledger Lens in {}", data_dir.display()))
}

/// Create the context and load the transaction set from storage
pub async fn load_context() -> Result<LedgerContext> {
    let ctx = get_context()?;
    if ctx.needs_login() {
        return Err(Error::NotLoggedIn.into());
    }

    let progress = spinner("Loading transactions...");
    let loaded = ctx.store.reload().await;
    progress.finish_and_clear();
    let count = loaded?;
    debug!("Loaded {} transactions from {}", count, ctx.store.backend_name());

    Ok(ctx)
}

/// Spinner on stderr; hidden when stderr is not a terminal
pub fn spinner(message: &str) -> ProgressBar {
    if atty::isnt(atty::Stream::Stderr) {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        progress.set_style(style);
    }
    progress.set_message(message.to_string());
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Parse `--month`, defaulting to `default` or else the current month
pub fn parse_month(month: Option<&str>, default: Option<Month>) -> Result<Month> {
    match month {
        Some(value) => value.parse::<Month>().map_err(anyhow::Error::msg),
        None => Ok(default.unwrap_or_else(|| Month::from_date(Local::now().date_naive()))),
    }
}

pub fn is_auth_expired(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<Error>(), Some(Error::AuthExpired))
}

/// Message shown for a failed command
pub fn describe_error(error: &anyhow::Error) -> String {
    if is_auth_expired(error) {
        return format!("{} Run 'lens login'.", Error::AuthExpired);
    }
    format!("{:#}", error)
}
