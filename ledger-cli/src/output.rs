//! Output formatting utilities

use colored::{ColoredString, Colorize};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, ContentArrangement, Table};
use ledger_core::{Transaction, TransactionType};
use rust_decimal::Decimal;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Right-aligned amount cell
pub fn amount_cell(amount: Decimal) -> Cell {
    Cell::new(format_amount(amount)).set_alignment(CellAlignment::Right)
}

/// Two decimals with thousands separators
pub fn format_amount(amount: Decimal) -> String {
    let rounded = format!("{:.2}", amount.abs());
    let (whole, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}

/// Percentage with sign, colored red for growth in spending
pub fn format_change(percent: Decimal) -> ColoredString {
    let text = format!("{:+.1}%", percent);
    if percent > Decimal::ZERO {
        text.red()
    } else if percent < Decimal::ZERO {
        text.green()
    } else {
        text.normal()
    }
}

/// `YYYYMMDD` as `YYYY-MM-DD`; anything else unchanged
pub fn format_date(date: &str) -> String {
    match ledger_core::domain::parse_calendar_date(date) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => date.to_string(),
    }
}

/// Table of transactions
pub fn transaction_table(transactions: &[Transaction]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Date", "Type", "Category", "Amount", "Member", "Account", "Note"]);
    for tx in transactions {
        let kind = match tx.kind {
            TransactionType::Expense => tx.kind.as_str().red().to_string(),
            TransactionType::Income => tx.kind.as_str().green().to_string(),
            TransactionType::Transfer => tx.kind.as_str().to_string(),
        };
        table.add_row(vec![
            Cell::new(format_date(&tx.date)),
            Cell::new(kind),
            Cell::new(&tx.category),
            amount_cell(tx.amount),
            Cell::new(&tx.member),
            Cell::new(&tx.account),
            Cell::new(&tx.note),
        ]);
    }
    table
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
