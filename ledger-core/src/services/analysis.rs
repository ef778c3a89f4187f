//! Period analysis: month comparisons and dashboard figures

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{ComparisonKind, Month, MonthOverview, MonthlySummary, PeriodComparison};
use crate::services::aggregate::{
    compare_periods, latest_month, month_overview, monthly_expense_trend, monthly_summary,
};
use crate::services::narrator::InsightNarrator;
use crate::services::store::TransactionStore;

/// Outcome of comparing a month against its baseline
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub kind: ComparisonKind,
    pub current: MonthlySummary,
    pub previous: MonthlySummary,
    pub comparison: PeriodComparison,
    /// Narrated explanation, when one was asked for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

pub struct AnalysisService {
    store: Arc<TransactionStore>,
    narrator: Arc<InsightNarrator>,
}

impl AnalysisService {
    pub fn new(store: Arc<TransactionStore>, narrator: Arc<InsightNarrator>) -> Self {
        Self { store, narrator }
    }

    /// Compare `month`'s expenses with the month `kind` selects
    pub async fn compare(&self, month: Month, kind: ComparisonKind, narrate: bool) -> ComparisonReport {
        let snapshot = self.store.snapshot();
        let current = monthly_summary(&snapshot, month);
        let previous = monthly_summary(&snapshot, kind.baseline(month));
        let comparison = compare_periods(&current, &previous);

        let narrative = if narrate {
            Some(self.narrator.explain_comparison(&current, &previous, kind).await)
        } else {
            None
        };

        ComparisonReport {
            kind,
            current,
            previous,
            comparison,
            narrative,
        }
    }

    pub fn overview(&self, month: Month) -> MonthOverview {
        month_overview(&self.store.snapshot(), month)
    }

    /// Expense totals of the most recent `months` months that have expenses, oldest first
    pub fn trend(&self, months: usize) -> Vec<MonthlySummary> {
        monthly_expense_trend(&self.store.snapshot(), months)
    }

    /// Most recent month with a dated record
    pub fn latest_month(&self) -> Option<Month> {
        latest_month(&self.store.snapshot())
    }
}
