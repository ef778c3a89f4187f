//! Filter/aggregation engine
//!
//! Pure, synchronous reductions over a transaction slice. Nothing here mutates its input
//! or keeps state between calls; every aggregate can be recomputed from the store.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::{
    CategoryBreakdown, CategoryShare, FilterSpec, Month, MonthOverview, MonthlySummary,
    PeriodComparison, Transaction, TransactionType, OTHER_CATEGORY,
};

/// Number of ranked categories on the dashboard before the rest collapse into "Other"
pub const DASHBOARD_TOP_CATEGORIES: usize = 5;

/// Records satisfying every predicate of `spec`, in their original order.
///
/// An empty spec returns the whole input.
pub fn filter(transactions: &[Transaction], spec: &FilterSpec) -> Vec<Transaction> {
    if spec.is_empty() {
        return transactions.to_vec();
    }

    let bounds = spec.date_bounds();
    transactions
        .iter()
        .filter(|tx| spec.matches(tx, &bounds))
        .cloned()
        .collect()
}

/// Sum of amounts over records of the given type. Zero when nothing matches.
pub fn sum_by_type(transactions: &[Transaction], kind: TransactionType) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.kind == kind)
        .map(|tx| tx.amount)
        .sum()
}

/// Summed amount per category present in the input
pub fn group_by_category(transactions: &[Transaction]) -> CategoryBreakdown {
    let mut breakdown = CategoryBreakdown::new();
    for tx in transactions {
        breakdown.add(&tx.category, tx.amount);
    }
    breakdown
}

/// The `n` largest categories, descending.
///
/// Ties keep first-encountered order. Whatever lies beyond rank `n` is folded into a
/// single [`OTHER_CATEGORY`] row, which only appears when its sum is positive.
pub fn top_n_categories(breakdown: &CategoryBreakdown, n: usize) -> Vec<CategoryShare> {
    let mut ranked: Vec<(&str, Decimal)> = breakdown.iter().collect();
    // stable sort: equal amounts stay in insertion order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let rest: Decimal = ranked.iter().skip(n).map(|(_, amount)| *amount).sum();

    let mut shares: Vec<CategoryShare> = ranked
        .into_iter()
        .take(n)
        .map(|(category, amount)| CategoryShare {
            category: category.to_string(),
            amount,
        })
        .collect();

    if rest > Decimal::ZERO {
        shares.push(CategoryShare {
            category: OTHER_CATEGORY.to_string(),
            amount: rest,
        });
    }

    shares
}

/// Expense total and per-category breakdown for one calendar month
pub fn monthly_summary(transactions: &[Transaction], month: Month) -> MonthlySummary {
    let expenses: Vec<Transaction> = in_month(transactions, month)
        .filter(|tx| tx.kind == TransactionType::Expense)
        .cloned()
        .collect();

    MonthlySummary {
        month,
        total_expense: sum_by_type(&expenses, TransactionType::Expense),
        category_breakdown: group_by_category(&expenses),
    }
}

/// Compare two monthly summaries
pub fn compare_periods(current: &MonthlySummary, previous: &MonthlySummary) -> PeriodComparison {
    compare_totals(current.total_expense, previous.total_expense)
}

/// `diff = current - previous` and the percentage change relative to `previous`.
///
/// With a zero `previous` the percentage is 100 when `current` is positive, else 0.
pub fn compare_totals(current: Decimal, previous: Decimal) -> PeriodComparison {
    let diff = current - previous;
    let percent_change = if previous.is_zero() {
        if current > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        }
    } else {
        diff.checked_div(previous)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
    };

    PeriodComparison {
        diff,
        percent_change,
    }
}

/// Dashboard figures for one month
pub fn month_overview(transactions: &[Transaction], month: Month) -> MonthOverview {
    let records: Vec<Transaction> = in_month(transactions, month).cloned().collect();

    let income = sum_by_type(&records, TransactionType::Income);
    let expense = sum_by_type(&records, TransactionType::Expense);

    let expenses: Vec<Transaction> = records
        .iter()
        .filter(|tx| tx.kind == TransactionType::Expense)
        .cloned()
        .collect();
    let top_categories = top_n_categories(&group_by_category(&expenses), DASHBOARD_TOP_CATEGORIES);

    MonthOverview {
        month,
        income,
        expense,
        balance: income - expense,
        count: records.len(),
        top_categories,
    }
}

/// Expense summaries for the most recent `months` months that have expense records,
/// oldest first
pub fn monthly_expense_trend(transactions: &[Transaction], months: usize) -> Vec<MonthlySummary> {
    let mut by_month: BTreeMap<Month, Vec<Transaction>> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| tx.kind == TransactionType::Expense) {
        match tx.calendar_date() {
            Some(date) => by_month
                .entry(Month::from_date(date))
                .or_default()
                .push(tx.clone()),
            None => debug!(uuid = %tx.uuid, date = %tx.date, "Skipping record with unparsable date"),
        }
    }

    let skip = by_month.len().saturating_sub(months);
    by_month
        .into_iter()
        .skip(skip)
        .map(|(month, records)| MonthlySummary {
            month,
            total_expense: sum_by_type(&records, TransactionType::Expense),
            category_breakdown: group_by_category(&records),
        })
        .collect()
}

/// Most recent month with a parsable date in the data
pub fn latest_month(transactions: &[Transaction]) -> Option<Month> {
    transactions
        .iter()
        .filter_map(Transaction::calendar_date)
        .max()
        .map(Month::from_date)
}

fn in_month(transactions: &[Transaction], month: Month) -> impl Iterator<Item = &Transaction> {
    transactions.iter().filter(move |tx| match tx.calendar_date() {
        Some(date) => month.contains(date),
        None => {
            debug!(uuid = %tx.uuid, date = %tx.date, "Skipping record with unparsable date");
            false
        }
    })
}
