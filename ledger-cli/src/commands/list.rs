//! List command - show transactions matching a filter

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use rust_decimal::Decimal;
use serde_json::json;

use super::load_context;
use crate::output::{format_amount, info, transaction_table};
use ledger_core::services::aggregate::{filter, sum_by_type};
use ledger_core::{FilterSpec, TransactionType, TypeFilter};

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Text to find in note, category, tags, member or account (case-insensitive)
    #[arg(short, long)]
    keyword: Option<String>,
    /// Text the category must contain
    #[arg(short, long)]
    category: Option<String>,
    /// Minimum amount
    #[arg(long)]
    min: Option<Decimal>,
    /// Maximum amount
    #[arg(long)]
    max: Option<Decimal>,
    /// First date, YYYY-MM-DD
    #[arg(long)]
    from: Option<String>,
    /// Last date, YYYY-MM-DD
    #[arg(long)]
    to: Option<String>,
    /// expense, income, transfer or all
    #[arg(long = "type", value_parser = parse_type_filter)]
    kind: Option<TypeFilter>,
}

fn parse_type_filter(value: &str) -> Result<TypeFilter, String> {
    serde_json::from_value(json!(value.trim().to_lowercase()))
        .map_err(|_| format!("unknown type '{}' (expected expense, income, transfer or all)", value))
}

impl From<FilterArgs> for FilterSpec {
    fn from(args: FilterArgs) -> Self {
        FilterSpec {
            keyword: args.keyword,
            category: args.category,
            min_amount: args.min,
            max_amount: args.max,
            start_date: args.from,
            end_date: args.to,
            kind: args.kind,
        }
    }
}

pub async fn run(args: FilterArgs, limit: usize, json: bool) -> Result<()> {
    let ctx = load_context().await?;
    let spec = FilterSpec::from(args);
    let matches = filter(&ctx.store.snapshot(), &spec);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "filter": spec,
                "count": matches.len(),
                "transactions": matches.iter().take(limit).collect::<Vec<_>>(),
            }))?
        );
        return Ok(());
    }

    if matches.is_empty() {
        println!("No transactions match.");
        return Ok(());
    }

    let shown = &matches[..matches.len().min(limit)];
    println!("{}", transaction_table(shown));
    if matches.len() > shown.len() {
        info(&format!(
            "Showing {} of {} transactions (use --limit to see more)",
            shown.len(),
            matches.len()
        ));
    }

    println!();
    println!(
        "Expense {}   Income {}",
        format_amount(sum_by_type(&matches, TransactionType::Expense)).red(),
        format_amount(sum_by_type(&matches, TransactionType::Income)).green()
    );

    Ok(())
}
