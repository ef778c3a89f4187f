//! Compare command - month-over-month or year-over-year expense comparison

use anyhow::Result;
use colored::Colorize;
use comfy_table::Cell;

use super::{load_context, parse_month, spinner};
use crate::output::{amount_cell, create_table, format_amount, format_change};
use ledger_core::ComparisonKind;

pub async fn run(month: Option<&str>, yoy: bool, narrate: bool, json: bool) -> Result<()> {
    let ctx = load_context().await?;
    let month = parse_month(month, ctx.analysis_service.latest_month())?;
    let kind = if yoy {
        ComparisonKind::YearOverYear
    } else {
        ComparisonKind::MonthOverMonth
    };

    let progress = if narrate {
        spinner("Analyzing...")
    } else {
        indicatif::ProgressBar::hidden()
    };
    let report = ctx.analysis_service.compare(month, kind, narrate).await;
    progress.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{} {} vs {}",
            kind.label(),
            report.current.month,
            report.previous.month
        )
        .bold()
    );
    println!();
    println!("  {}  {}", report.current.month, format_amount(report.current.total_expense));
    println!("  {}  {}", report.previous.month, format_amount(report.previous.total_expense));
    println!(
        "  Change   {} ({})",
        format_amount(report.comparison.diff),
        format_change(report.comparison.percent_change)
    );

    if !report.current.category_breakdown.is_empty() || !report.previous.category_breakdown.is_empty() {
        println!();
        let mut table = create_table();
        table.set_header(vec![
            "Category".to_string(),
            report.current.month.to_string(),
            report.previous.month.to_string(),
        ]);

        let mut categories: Vec<&str> = report
            .current
            .category_breakdown
            .iter()
            .map(|(category, _)| category)
            .collect();
        for (category, _) in report.previous.category_breakdown.iter() {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }

        for category in categories {
            let current = report.current.category_breakdown.get(category).unwrap_or_default();
            let previous = report.previous.category_breakdown.get(category).unwrap_or_default();
            table.add_row(vec![Cell::new(category), amount_cell(current), amount_cell(previous)]);
        }
        println!("{}", table);
    }

    if let Some(narrative) = &report.narrative {
        println!();
        println!("{}", narrative);
    }

    Ok(())
}
