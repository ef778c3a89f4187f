//! Filter predicates for transaction queries
//!
//! A `FilterSpec` is a conjunction of optional predicates. It is also the JSON shape the
//! text-generation service is asked to produce, so it derives `JsonSchema`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::transaction::{parse_amount, parse_calendar_date, Transaction, TransactionType};

/// Which transaction types a filter admits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    #[serde(alias = "支")]
    Expense,
    #[serde(alias = "收")]
    Income,
    #[serde(alias = "轉")]
    Transfer,
}

impl TypeFilter {
    pub fn admits(&self, kind: TransactionType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Expense => kind == TransactionType::Expense,
            TypeFilter::Income => kind == TransactionType::Income,
            TypeFilter::Transfer => kind == TransactionType::Transfer,
        }
    }
}

impl From<TransactionType> for TypeFilter {
    fn from(kind: TransactionType) -> Self {
        match kind {
            TransactionType::Expense => TypeFilter::Expense,
            TransactionType::Income => TypeFilter::Income,
            TransactionType::Transfer => TypeFilter::Transfer,
        }
    }
}

/// Optional predicates over transaction fields, combined with AND.
///
/// Absent fields and empty strings place no constraint on their axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    /// Case-insensitive substring of note, category, tags, member and account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,

    /// Substring of the category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Inclusive lower bound on amount
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "rust_decimal::serde::float_option::serialize",
        deserialize_with = "deserialize_optional_amount"
    )]
    #[schemars(with = "Option<f64>")]
    pub min_amount: Option<Decimal>,

    /// Inclusive upper bound on amount
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "rust_decimal::serde::float_option::serialize",
        deserialize_with = "deserialize_optional_amount"
    )]
    #[schemars(with = "Option<f64>")]
    pub max_amount: Option<Decimal>,

    /// Inclusive start date, YYYY-MM-DD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// Inclusive end date, YYYY-MM-DD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    /// expense, income, transfer or all
    #[serde(
        rename = "type",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_type_filter"
    )]
    #[schemars(with = "Option<TypeFilter>")]
    pub kind: Option<TypeFilter>,
}

/// Date bounds of a filter, resolved once per pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateBounds {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateBounds {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

impl FilterSpec {
    /// True when no predicate is set
    pub fn is_empty(&self) -> bool {
        non_blank(&self.keyword).is_none()
            && non_blank(&self.category).is_none()
            && self.min_amount.is_none()
            && self.max_amount.is_none()
            && non_blank(&self.start_date).is_none()
            && non_blank(&self.end_date).is_none()
            && self.kind.map_or(true, |k| k == TypeFilter::All)
    }

    /// Parse the date bounds. A bound that cannot be parsed is dropped.
    pub fn date_bounds(&self) -> DateBounds {
        DateBounds {
            start: resolve_bound("startDate", &self.start_date),
            end: resolve_bound("endDate", &self.end_date),
        }
    }

    /// Whether `tx` satisfies every present predicate.
    ///
    /// `bounds` must come from [`FilterSpec::date_bounds`] on the same spec.
    pub fn matches(&self, tx: &Transaction, bounds: &DateBounds) -> bool {
        if !bounds.is_unbounded() {
            match tx.calendar_date() {
                Some(date) if bounds.contains(date) => {}
                Some(_) => return false,
                None => {
                    tracing::debug!(uuid = %tx.uuid, date = %tx.date, "Skipping record with unparsable date");
                    return false;
                }
            }
        }

        if let Some(min) = self.min_amount {
            if tx.amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if tx.amount > max {
                return false;
            }
        }

        if let Some(category) = non_blank(&self.category) {
            if !tx.category.contains(category) {
                return false;
            }
        }

        if let Some(keyword) = non_blank(&self.keyword) {
            if !tx.search_text().contains(&keyword.to_lowercase()) {
                return false;
            }
        }

        if let Some(kind) = self.kind {
            if !kind.admits(tx.kind) {
                return false;
            }
        }

        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn resolve_bound(name: &str, value: &Option<String>) -> Option<NaiveDate> {
    let raw = non_blank(value)?;
    let parsed = parse_calendar_date(raw);
    if parsed.is_none() {
        tracing::warn!("Ignoring unparsable {} '{}' in filter", name, raw);
    }
    parsed
}

fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    Ok(match value {
        JsonValue::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .ok()
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        JsonValue::String(s) => parse_amount(&s),
        _ => None,
    })
}

/// Unknown or blank type values are treated as absent instead of failing the whole spec
fn deserialize_type_filter<'de, D>(deserializer: D) -> Result<Option<TypeFilter>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    Ok(match value {
        JsonValue::String(s) if !s.trim().is_empty() => {
            serde_json::from_value(JsonValue::String(s.trim().to_lowercase())).ok()
        }
        _ => None,
    })
}
