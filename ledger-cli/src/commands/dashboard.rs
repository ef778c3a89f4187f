//! Dashboard command - monthly income, expense and top categories

use anyhow::Result;
use colored::Colorize;
use comfy_table::Cell;
use serde_json::json;

use super::{load_context, parse_month};
use crate::output::{amount_cell, create_table, format_amount};

pub async fn run(month: Option<&str>, trend: usize, json: bool) -> Result<()> {
    let month = parse_month(month, None)?;
    let ctx = load_context().await?;
    let overview = ctx.analysis_service.overview(month);
    let history = ctx.analysis_service.trend(trend);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "overview": overview,
                "trend": history,
            }))?
        );
        return Ok(());
    }

    println!("{}", format!("Dashboard {}", overview.month).bold());
    println!();
    println!("  Income   {}", format_amount(overview.income).green());
    println!("  Expense  {}", format_amount(overview.expense).red());
    let balance = format_amount(overview.balance);
    let balance = if overview.balance.is_sign_negative() {
        balance.red()
    } else {
        balance.normal()
    };
    println!("  Balance  {}", balance);
    println!("  Records  {}", overview.count);

    if overview.top_categories.is_empty() {
        println!();
        println!("No expenses recorded for {}.", overview.month);
    } else {
        println!();
        let mut table = create_table();
        table.set_header(vec!["Category", "Expense"]);
        for share in &overview.top_categories {
            table.add_row(vec![Cell::new(&share.category), amount_cell(share.amount)]);
        }
        println!("{}", table);
    }

    if !history.is_empty() {
        println!();
        println!("{}", "Monthly expenses".bold());
        let mut table = create_table();
        table.set_header(vec!["Month", "Expense"]);
        for summary in &history {
            table.add_row(vec![
                Cell::new(summary.month.to_string()),
                amount_cell(summary.total_expense),
            ]);
        }
        println!("{}", table);
    }

    Ok(())
}
