//! Import service - CSV transaction import
//!
//! Reads the bookkeeping app's CSV export. The header row names the columns, either with
//! the app's Traditional Chinese labels or the English field names. Every data row becomes
//! a transaction; a field that cannot be read is defaulted and reported as a warning.

use std::path::Path;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{parse_amount, Transaction, TransactionType};
use crate::services::fallback::recover;
use crate::services::store::TransactionStore;

const UTF8_BOM: char = '\u{feff}';

/// The twelve known columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Date,
    Category,
    MainCategory,
    Amount,
    Currency,
    Member,
    Account,
    Tags,
    Note,
    Type,
    LastUpdated,
    Uuid,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let header = header.trim().trim_start_matches(UTF8_BOM).trim();
        let column = match header {
            "日期" => Column::Date,
            "類別" => Column::Category,
            "大類別" => Column::MainCategory,
            "金額" => Column::Amount,
            "貨幣" => Column::Currency,
            "成員" => Column::Member,
            "帳戶" => Column::Account,
            "標籤" => Column::Tags,
            "備註" => Column::Note,
            "收支區分" => Column::Type,
            "上次更新" => Column::LastUpdated,
            "UUID" => Column::Uuid,
            other => match other.to_lowercase().as_str() {
                "date" => Column::Date,
                "category" => Column::Category,
                "maincategory" | "main category" | "main_category" => Column::MainCategory,
                "amount" => Column::Amount,
                "currency" => Column::Currency,
                "member" => Column::Member,
                "account" => Column::Account,
                "tags" => Column::Tags,
                "note" => Column::Note,
                "type" | "transaction type" => Column::Type,
                "lastupdated" | "last updated" | "last_updated" => Column::LastUpdated,
                "uuid" => Column::Uuid,
                _ => return None,
            },
        };
        Some(column)
    }

    fn name(&self) -> &'static str {
        match self {
            Column::Date => "date",
            Column::Category => "category",
            Column::MainCategory => "mainCategory",
            Column::Amount => "amount",
            Column::Currency => "currency",
            Column::Member => "member",
            Column::Account => "account",
            Column::Tags => "tags",
            Column::Note => "note",
            Column::Type => "type",
            Column::LastUpdated => "lastUpdated",
            Column::Uuid => "uuid",
        }
    }
}

/// Outcome of parsing a CSV export
#[derive(Debug, Default)]
pub struct ParsedCsv {
    pub transactions: Vec<Transaction>,
    /// One entry per defaulted field
    pub warnings: Vec<String>,
}

/// Parse a CSV export held in memory.
///
/// Fails only when the content is not UTF-8 or cannot be tokenized; field-level problems
/// become warnings.
pub fn parse_csv(content: &[u8]) -> Result<ParsedCsv> {
    let text = std::str::from_utf8(content)
        .map_err(|e| Error::ImportParse(format!("file is not valid UTF-8: {}", e)))?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns: Vec<(usize, Column)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| Column::from_header(header).map(|column| (idx, column)))
        .collect();

    if columns.is_empty() {
        return Err(Error::ImportParse(
            "header row does not name any known column".to_string(),
        ));
    }

    let mut parsed = ParsedCsv::default();

    for result in reader.records() {
        let record = result?;

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        let mut tx = Transaction::default();

        for (idx, column) in &columns {
            let value = record.get(*idx).unwrap_or("").trim();
            match column {
                Column::Date => tx.date = value.to_string(),
                Column::Category => tx.category = value.to_string(),
                Column::MainCategory => tx.main_category = value.to_string(),
                Column::Amount => {
                    let amount = noted(&mut parsed.warnings, read_amount(line, *column, value));
                    tx.amount = recover("amount field", amount, || Decimal::ZERO);
                }
                Column::Currency => tx.currency = value.to_string(),
                Column::Member => tx.member = value.to_string(),
                Column::Account => tx.account = value.to_string(),
                Column::Tags => tx.tags = value.to_string(),
                Column::Note => tx.note = value.to_string(),
                Column::Type => {
                    let kind = noted(&mut parsed.warnings, read_type(line, *column, value));
                    tx.kind = recover("type field", kind, || TransactionType::Expense);
                }
                Column::LastUpdated => tx.last_updated = value.to_string(),
                Column::Uuid => tx.uuid = value.to_string(),
            }
        }

        parsed.transactions.push(tx);
    }

    Ok(parsed)
}

/// Empty amounts read as zero without complaint
fn read_amount(line: usize, column: Column, value: &str) -> Result<Decimal> {
    if value.is_empty() {
        return Ok(Decimal::ZERO);
    }
    parse_amount(value)
        .ok_or_else(|| row_error(line, column, format!("'{}' is not a usable amount", value)))
}

fn read_type(line: usize, column: Column, value: &str) -> Result<TransactionType> {
    value
        .parse()
        .map_err(|e: String| row_error(line, column, format!("{}, treated as expense", e)))
}

/// Record a field error as an import warning before it is recovered
fn noted<T>(warnings: &mut Vec<String>, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        warnings.push(e.to_string());
    }
    result
}

fn row_error(line: usize, column: Column, message: String) -> Error {
    Error::RowField {
        row: line,
        field: column.name().to_string(),
        message,
    }
}

/// How an import combines with the current set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// The file becomes the whole set
    #[default]
    Replace,
    /// The file's rows are added after the current set
    Append,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub mode: ImportMode,
    /// Rows read from the file
    pub imported: usize,
    /// Size of the set after the import
    pub total: usize,
    pub warnings: Vec<String>,
}

/// Import service for CSV imports
pub struct ImportService {
    store: Arc<TransactionStore>,
}

impl ImportService {
    pub fn new(store: Arc<TransactionStore>) -> Self {
        Self { store }
    }

    /// Import a CSV export and persist the result.
    ///
    /// The store only changes once the backend accepted the new set.
    pub async fn import(&self, file_path: &Path, mode: ImportMode) -> Result<ImportResult> {
        let content = tokio::fs::read(file_path).await?;
        let parsed = parse_csv(&content)?;
        let imported = parsed.transactions.len();

        for warning in &parsed.warnings {
            warn!("{}: {}", file_path.display(), warning);
        }

        let total = match mode {
            ImportMode::Replace => self.store.replace_all(parsed.transactions).await?,
            ImportMode::Append => self.store.append(parsed.transactions).await?,
        };

        info!(
            "Imported {} transactions from {} ({:?})",
            imported,
            file_path.display(),
            mode
        );

        Ok(ImportResult {
            mode,
            imported,
            total,
            warnings: parsed.warnings,
        })
    }
}
