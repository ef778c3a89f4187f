//! Ask command - answer a natural-language question about the transactions

use std::io::{self, Read};

use anyhow::{Context, Result};
use colored::Colorize;

use super::{get_logger, load_context, log_event, spinner};
use crate::output::{info, transaction_table};
use ledger_core::LogEvent;

pub async fn run(words: Vec<String>, json: bool) -> Result<()> {
    let question = if !words.is_empty() {
        words.join(" ")
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read question from stdin")?;
        buffer
    } else {
        anyhow::bail!("No question provided. Pass it as arguments or pipe it from stdin.");
    };

    let ctx = load_context().await?;
    let logger = get_logger();

    let progress = spinner("Thinking...");
    let result = ctx.search_service.ask(&question).await;
    progress.finish_and_clear();

    let answer = match result {
        Ok(answer) => {
            log_event(
                &logger,
                LogEvent::new("search_completed")
                    .with_command("ask")
                    .with_storage(ctx.store.backend_name()),
            );
            answer
        }
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new("search_failed")
                    .with_command("ask")
                    .with_error(e.to_string()),
            );
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }

    println!("{}", answer.answer);

    if !answer.related.is_empty() {
        println!();
        println!("{}", "Related transactions".bold());
        println!("{}", transaction_table(&answer.related));
        if answer.match_count > answer.related.len() {
            info(&format!(
                "{} of {} matches shown. Use 'lens list' to see them all.",
                answer.related.len(),
                answer.match_count
            ));
        }
    }

    Ok(())
}
