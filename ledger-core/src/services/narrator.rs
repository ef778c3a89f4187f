//! Insight narration
//!
//! Asks the text-generation service to explain an aggregate comparison or answer a question
//! over a set of records. Failures never propagate: the caller always gets displayable text.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{ComparisonKind, MonthlySummary, Transaction, TransactionType};
use crate::ports::TextGenerator;
use crate::services::aggregate::sum_by_type;
use crate::services::fallback::attempt;

/// Records included in a question prompt at most
pub const NARRATION_RECORD_LIMIT: usize = 1000;

pub const DEFAULT_REPLY_LANGUAGE: &str = "Traditional Chinese (繁體中文)";

/// Returned without calling out when no API key is configured
pub const MISSING_KEY_MESSAGE: &str = "API Key is missing. Please configure your environment.";

/// Returned when the service call fails
pub const NARRATION_FAILED_MESSAGE: &str =
    "Analysis failed. Please check your API key or network connection.";

/// The parts of a record the model gets to see
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordView<'a> {
    date: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    category: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    note: &'a str,
    tags: &'a str,
    member: &'a str,
    account: &'a str,
}

impl<'a> From<&'a Transaction> for RecordView<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            date: &tx.date,
            kind: tx.kind.as_str(),
            category: &tx.category,
            amount: tx.amount,
            note: &tx.note,
            tags: &tx.tags,
            member: &tx.member,
            account: &tx.account,
        }
    }
}

/// Generates human-readable explanations
pub struct InsightNarrator {
    generator: Arc<dyn TextGenerator>,
    reply_language: String,
}

impl InsightNarrator {
    pub fn new(generator: Arc<dyn TextGenerator>, reply_language: Option<&str>) -> Self {
        let reply_language = reply_language
            .map(str::trim)
            .filter(|language| !language.is_empty())
            .unwrap_or(DEFAULT_REPLY_LANGUAGE)
            .to_string();
        Self {
            generator,
            reply_language,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_configured()
    }

    pub fn reply_language(&self) -> &str {
        &self.reply_language
    }

    /// Explain how spending changed between two months
    pub async fn explain_comparison(
        &self,
        current: &MonthlySummary,
        previous: &MonthlySummary,
        kind: ComparisonKind,
    ) -> String {
        self.narrate("Comparison narration", || {
            Ok(format!(
                "You are a financial analyst. Compare the spending habits between two periods.\n\
                 \n\
                 Current Period ({current_month}):\n\
                 Total Expense: {current_total}\n\
                 Breakdown: {current_breakdown}\n\
                 \n\
                 Previous Period ({previous_month}) [{kind}]:\n\
                 Total Expense: {previous_total}\n\
                 Breakdown: {previous_breakdown}\n\
                 \n\
                 Please provide:\n\
                 1. A brief summary of the change in total spending.\n\
                 2. Identify top 3 categories where spending increased significantly.\n\
                 3. Identify top 3 categories where spending decreased or improved.\n\
                 4. A constructive suggestion for the user.\n\
                 \n\
                 Keep the tone professional yet encouraging. Output in Markdown.\n\
                 Reply in {language}.",
                current_month = current.month,
                current_total = current.total_expense,
                current_breakdown = serde_json::to_string(&current.category_breakdown)?,
                previous_month = previous.month,
                previous_total = previous.total_expense,
                previous_breakdown = serde_json::to_string(&previous.category_breakdown)?,
                kind = kind.label(),
                language = self.reply_language,
            ))
        })
        .await
    }

    /// Answer `question` from `records`, the result of filtering for it.
    ///
    /// Only the first [`NARRATION_RECORD_LIMIT`] records are sent; totals cover all of them.
    pub async fn answer_question(&self, question: &str, records: &[Transaction]) -> String {
        self.narrate("Search narration", || {
            let shown: Vec<RecordView> = records
                .iter()
                .take(NARRATION_RECORD_LIMIT)
                .map(RecordView::from)
                .collect();

            Ok(format!(
                "You are a personal bookkeeping assistant. Answer the user's question using only \
                 the records below.\n\
                 \n\
                 Question: {question}\n\
                 \n\
                 Matching records: {count} (showing {shown})\n\
                 Total expense: {expense}\n\
                 Total income: {income}\n\
                 Records: {records}\n\
                 \n\
                 Quote concrete amounts and dates where they help. Output in Markdown.\n\
                 Reply in {language}.",
                question = question.trim(),
                count = records.len(),
                shown = shown.len(),
                expense = sum_by_type(records, TransactionType::Expense),
                income = sum_by_type(records, TransactionType::Income),
                records = serde_json::to_string(&shown)?,
                language = self.reply_language,
            ))
        })
        .await
    }

    async fn narrate<F>(&self, operation: &str, prompt: F) -> String
    where
        F: FnOnce() -> Result<String>,
    {
        if !self.generator.is_configured() {
            return MISSING_KEY_MESSAGE.to_string();
        }

        attempt(
            operation,
            async {
                let prompt = prompt()?;
                self.generator.generate(&prompt, None).await
            },
            || NARRATION_FAILED_MESSAGE.to_string(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Month;
    use crate::ports::generator::testing::ScriptedGenerator;
    use crate::services::aggregate::monthly_summary;

    fn records() -> Vec<Transaction> {
        let mut ramen = Transaction::new("20251128", TransactionType::Expense, "午餐", Decimal::new(120, 0));
        ramen.note = "拉麵".to_string();
        vec![
            ramen,
            Transaction::new("20251015", TransactionType::Expense, "午餐", Decimal::new(80, 0)),
            Transaction::new("20251020", TransactionType::Expense, "交通", Decimal::new(50, 0)),
            Transaction::new("20251130", TransactionType::Income, "薪水", Decimal::new(5000, 0)),
        ]
    }

    #[tokio::test]
    async fn test_explain_comparison_prompt() {
        let generator = Arc::new(ScriptedGenerator::replying("支出減少"));
        let narrator = InsightNarrator::new(generator.clone(), None);

        let current = monthly_summary(&records(), Month::new(2025, 11).unwrap());
        let previous = monthly_summary(&records(), Month::new(2025, 10).unwrap());
        let text = narrator
            .explain_comparison(&current, &previous, ComparisonKind::MonthOverMonth)
            .await;

        assert_eq!(text, "支出減少");
        let prompt = generator.last_prompt();
        assert!(prompt.contains("Current Period (2025-11)"));
        assert!(prompt.contains("Previous Period (2025-10) [MoM]"));
        assert!(prompt.contains(r#"{"午餐":80"#));
        assert!(prompt.contains("Reply in Traditional Chinese"));
    }

    #[tokio::test]
    async fn test_answer_question_prompt() {
        let generator = Arc::new(ScriptedGenerator::replying("你在拉麵花了 120 元"));
        let narrator = InsightNarrator::new(generator.clone(), Some("English"));

        let text = narrator.answer_question("拉麵花多少?", &records()[..1]).await;

        assert_eq!(text, "你在拉麵花了 120 元");
        let prompt = generator.last_prompt();
        assert!(prompt.contains("Question: 拉麵花多少?"));
        assert!(prompt.contains("Matching records: 1 (showing 1)"));
        assert!(prompt.contains("\"note\":\"拉麵\""));
        assert!(prompt.contains("Reply in English."));
    }

    #[tokio::test]
    async fn test_answer_question_caps_records() {
        let generator = Arc::new(ScriptedGenerator::replying("ok"));
        let narrator = InsightNarrator::new(generator.clone(), None);
        let many: Vec<Transaction> = (0..NARRATION_RECORD_LIMIT + 5)
            .map(|_| Transaction::new("20250101", TransactionType::Expense, "x", Decimal::ONE))
            .collect();

        narrator.answer_question("total?", &many).await;

        let prompt = generator.last_prompt();
        assert!(prompt.contains(&format!(
            "Matching records: {} (showing {})",
            NARRATION_RECORD_LIMIT + 5,
            NARRATION_RECORD_LIMIT
        )));
        assert!(prompt.contains(&format!("Total expense: {}", NARRATION_RECORD_LIMIT + 5)));
    }

    #[tokio::test]
    async fn test_failure_returns_fixed_message() {
        let narrator = InsightNarrator::new(Arc::new(ScriptedGenerator::failing()), None);
        let text = narrator.answer_question("q", &records()).await;
        assert_eq!(text, NARRATION_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_missing_key_skips_call() {
        let generator = Arc::new(ScriptedGenerator::unconfigured());
        let narrator = InsightNarrator::new(generator.clone(), None);

        let text = narrator.answer_question("q", &records()).await;

        assert_eq!(text, MISSING_KEY_MESSAGE);
        assert_eq!(generator.calls(), 0);
    }
}
