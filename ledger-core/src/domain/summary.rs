//! Derived aggregates. Recomputed on demand, never persisted.

use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::month::Month;

/// Label of the synthetic bucket collecting categories beyond the top N
pub const OTHER_CATEGORY: &str = "Other";

/// Category → summed amount, in first-encountered order.
///
/// Serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryBreakdown {
    entries: Vec<(String, Decimal)>,
}

impl CategoryBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `category`, creating the entry on first sight
    pub fn add(&mut self, category: &str, amount: Decimal) {
        match self.entries.iter_mut().find(|(c, _)| c == category) {
            Some((_, total)) => *total += amount,
            None => self.entries.push((category.to_string(), amount)),
        }
    }

    pub fn get(&self, category: &str) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, amount)| *amount)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> Decimal {
        self.entries.iter().map(|(_, amount)| *amount).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.entries.iter().map(|(c, amount)| (c.as_str(), *amount))
    }
}

impl Serialize for CategoryBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, amount) in &self.entries {
            map.serialize_entry(category, &FloatAmount(*amount))?;
        }
        map.end()
    }
}

struct FloatAmount(Decimal);

impl Serialize for FloatAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

/// One row of a ranked category list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Expense aggregate for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub month: Month,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expense: Decimal,
    pub category_breakdown: CategoryBreakdown,
}

/// Difference between two monthly totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodComparison {
    #[serde(with = "rust_decimal::serde::float")]
    pub diff: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub percent_change: Decimal,
}

/// Which earlier month a month is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ComparisonKind {
    /// The month before
    #[default]
    #[serde(rename = "MoM")]
    MonthOverMonth,
    /// The same month one year earlier
    #[serde(rename = "YoY")]
    YearOverYear,
}

impl ComparisonKind {
    pub fn label(&self) -> &'static str {
        match self {
            ComparisonKind::MonthOverMonth => "MoM",
            ComparisonKind::YearOverYear => "YoY",
        }
    }

    /// The month `month` is compared against
    pub fn baseline(&self, month: Month) -> Month {
        match self {
            ComparisonKind::MonthOverMonth => month.previous(),
            ComparisonKind::YearOverYear => month.year_before(),
        }
    }
}

/// Dashboard figures for one month
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthOverview {
    pub month: Month,
    #[serde(with = "rust_decimal::serde::float")]
    pub income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub expense: Decimal,
    /// income - expense
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    /// All records dated in the month, any type
    pub count: usize,
    pub top_categories: Vec<CategoryShare>,
}
