//! Status command - show storage, session and data summary

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use super::get_context;
use crate::output::{create_table, format_date, warning};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusSummary {
    data_dir: String,
    storage: String,
    api_base_url: String,
    logged_in: bool,
    ai_configured: bool,
    ai_model: String,
    transactions: Option<usize>,
    earliest: Option<String>,
    latest: Option<String>,
    load_error: Option<String>,
}

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;

    let mut summary = StatusSummary {
        data_dir: ctx.data_dir().display().to_string(),
        storage: ctx.config.storage_mode.to_string(),
        api_base_url: ctx.config.api_base_url.clone(),
        logged_in: ctx.session_service.is_authenticated(),
        ai_configured: ctx.config.ai_api_key.is_some(),
        ai_model: ctx.config.ai_model.clone(),
        transactions: None,
        earliest: None,
        latest: None,
        load_error: None,
    };

    if !ctx.needs_login() {
        match ctx.store.reload().await {
            Ok(count) => {
                let snapshot = ctx.store.snapshot();
                let mut dates: Vec<String> = snapshot
                    .iter()
                    .filter(|tx| tx.calendar_date().is_some())
                    .map(|tx| format_date(&tx.date))
                    .collect();
                dates.sort();
                summary.transactions = Some(count);
                summary.earliest = dates.first().cloned();
                summary.latest = dates.last().cloned();
            }
            Err(e) => summary.load_error = Some(e.to_string()),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "Ledger Lens Status".bold());
    println!();

    let mut table = create_table();
    table.add_row(vec!["Data directory", &summary.data_dir]);
    table.add_row(vec!["Storage", &summary.storage]);
    if summary.storage == "remote" {
        table.add_row(vec!["Backend", &summary.api_base_url]);
        table.add_row(vec!["Logged in", if summary.logged_in { "yes" } else { "no" }]);
    }
    let ai = if summary.ai_configured {
        summary.ai_model.clone()
    } else {
        "not configured (set GEMINI_API_KEY)".to_string()
    };
    table.add_row(vec!["AI model", &ai]);
    if let Some(count) = summary.transactions {
        table.add_row(vec!["Transactions", &count.to_string()]);
    }
    println!("{}", table);

    if let (Some(earliest), Some(latest)) = (&summary.earliest, &summary.latest) {
        println!();
        println!("Date range: {} to {}", earliest, latest);
    }
    if let Some(error) = &summary.load_error {
        println!();
        warning(&format!("Could not load transactions: {}", error));
    } else if summary.transactions.is_none() {
        println!();
        warning("Not logged in. Run 'lens login' to load your transactions.");
    }

    Ok(())
}
