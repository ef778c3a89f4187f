//! Transaction domain model

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Largest magnitude accepted for an amount; anything bigger reads as unreadable.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Date layouts accepted for the `date` field. The canonical export layout comes first.
const DATE_FORMATS: &[&str] = &["%Y%m%d", "%Y-%m-%d", "%Y/%m/%d"];

/// Whether money left, entered, or moved between accounts.
///
/// On the wire the original single-character tags are used (`支`, `收`, `轉`); the English
/// names are accepted on input as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[default]
    #[serde(rename = "支", alias = "expense", alias = "Expense")]
    Expense,
    #[serde(rename = "收", alias = "income", alias = "Income")]
    Income,
    #[serde(rename = "轉", alias = "transfer", alias = "Transfer")]
    Transfer,
}

impl TransactionType {
    /// English name, used in prompts and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
            TransactionType::Transfer => "transfer",
        }
    }

    /// The tag used in CSV exports and the backend payload
    pub fn tag(&self) -> &'static str {
        match self {
            TransactionType::Expense => "支",
            TransactionType::Income => "收",
            TransactionType::Transfer => "轉",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "支" | "expense" => Ok(TransactionType::Expense),
            "收" | "income" => Ok(TransactionType::Income),
            "轉" | "transfer" => Ok(TransactionType::Transfer),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

/// A single financial event as exported by the bookkeeping app.
///
/// Records are immutable once imported; a re-import replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    /// Calendar date as exported, normally `YYYYMMDD`
    pub date: String,
    pub category: String,
    pub main_category: String,
    #[serde(
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "deserialize_amount"
    )]
    pub amount: Decimal,
    pub currency: String,
    pub member: String,
    pub account: String,
    pub tags: String,
    pub note: String,
    #[serde(rename = "type", deserialize_with = "deserialize_kind")]
    pub kind: TransactionType,
    /// Free text, never parsed
    pub last_updated: String,
    /// Assumed unique within a dataset, never checked
    pub uuid: String,
}

impl Transaction {
    /// Create a transaction with the fields the engine cares about
    pub fn new(
        date: impl Into<String>,
        kind: TransactionType,
        category: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            date: date.into(),
            kind,
            category: category.into(),
            amount,
            ..Default::default()
        }
    }

    /// The `date` field as a calendar date, or `None` when it cannot be parsed.
    ///
    /// Every date comparison in the crate goes through this method.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        parse_calendar_date(&self.date)
    }

    /// Lowercased text that keyword searches run against
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.note, self.category, self.tags, self.member, self.account
        )
        .to_lowercase()
    }
}

/// Parse a calendar date in any of the accepted layouts
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse a user-entered amount.
///
/// Tolerates currency symbols, thousands separators and accounting-style parentheses:
/// `(1,200.50)` is `-1200.50`. Returns `None` when nothing numeric remains.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();

    let (is_negative, s) = if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };

    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let mut amount: Decimal = cleaned.parse().ok()?;
    if amount.abs() > MAX_AMOUNT {
        return None;
    }
    if is_negative && amount > Decimal::ZERO {
        amount = -amount;
    }
    Some(amount)
}

/// Deserialize an amount that may arrive as a number, a numeric string or null.
///
/// Anything unreadable becomes zero so that record counts stay consistent with what was stored.
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    let amount = match &value {
        JsonValue::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .ok()
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()))
            .filter(|amount| amount.abs() <= MAX_AMOUNT),
        JsonValue::String(s) => parse_amount(s),
        _ => None,
    };
    Ok(amount.unwrap_or_else(|| {
        if !value.is_null() {
            tracing::warn!("Unreadable amount {} treated as zero", value);
        }
        Decimal::ZERO
    }))
}

/// Deserialize a type tag, defaulting anything unknown or blank to expense
fn deserialize_kind<'de, D>(deserializer: D) -> std::result::Result<TransactionType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    let kind = value.as_str().and_then(|s| s.parse::<TransactionType>().ok());
    Ok(kind.unwrap_or_else(|| {
        tracing::warn!("Unknown transaction type {} treated as expense", value);
        TransactionType::Expense
    }))
}
