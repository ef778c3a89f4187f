//! Natural-language query translation
//!
//! Turns a free-text question into a [`FilterSpec`] by asking the text-generation service
//! for JSON constrained by the filter's schema. Fails open: any error or unparsable reply
//! yields an empty filter, which matches every record.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::domain::result::{Error, Result};
use crate::domain::{FilterSpec, Transaction};
use crate::ports::TextGenerator;
use crate::services::fallback::attempt;

/// Categories listed in the prompt at most
const MAX_DIGEST_CATEGORIES: usize = 100;

/// What the model is told about the data it is filtering
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDigest {
    pub today: NaiveDate,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
    /// Distinct categories in first-seen order
    pub categories: Vec<String>,
}

impl DatasetDigest {
    pub fn new(transactions: &[Transaction], today: NaiveDate) -> Self {
        let mut earliest: Option<NaiveDate> = None;
        let mut latest: Option<NaiveDate> = None;
        let mut categories: Vec<String> = Vec::new();

        for tx in transactions {
            if let Some(date) = tx.calendar_date() {
                earliest = Some(earliest.map_or(date, |d| d.min(date)));
                latest = Some(latest.map_or(date, |d| d.max(date)));
            }
            let category = tx.category.trim();
            if !category.is_empty()
                && categories.len() < MAX_DIGEST_CATEGORIES
                && !categories.iter().any(|c| c == category)
            {
                categories.push(category.to_string());
            }
        }

        Self {
            today,
            earliest,
            latest,
            categories,
        }
    }
}

/// JSON schema of [`FilterSpec`] as sent with the request
pub fn filter_schema() -> JsonValue {
    let mut schema = schemars::schema_for!(FilterSpec);
    schema.remove("$schema");
    schema.remove("title");
    schema.to_value()
}

/// Parse a model reply into a filter, tolerating Markdown code fences and stray prose
/// around the JSON object
pub fn parse_filter(reply: &str) -> Result<FilterSpec> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &reply[start..=end],
        _ => return Err(Error::ai("reply contains no JSON object")),
    };
    serde_json::from_str(json).map_err(|e| Error::ai(format!("unparsable filter: {}", e)))
}

fn build_prompt(question: &str, digest: &DatasetDigest) -> String {
    let range = match (digest.earliest, digest.latest) {
        (Some(earliest), Some(latest)) => format!(
            "Records span {} to {}.",
            earliest.format("%Y-%m-%d"),
            latest.format("%Y-%m-%d")
        ),
        _ => "No dated records are loaded.".to_string(),
    };
    let categories = if digest.categories.is_empty() {
        "(none)".to_string()
    } else {
        digest.categories.join(", ")
    };

    format!(
        "You translate questions about personal bookkeeping records into a JSON search filter.\n\
         Today is {today}.\n\
         {range}\n\
         Known categories: {categories}\n\
         \n\
         Rules:\n\
         - Only set fields the question actually constrains; omit the rest.\n\
         - startDate and endDate are inclusive and use YYYY-MM-DD. Resolve relative dates such as \"last month\" against today.\n\
         - category must be one of the known categories when the question names one.\n\
         - keyword is free text searched in notes, tags, members and accounts.\n\
         - type is \"expense\", \"income\", \"transfer\" or \"all\".\n\
         - Amounts are positive numbers.\n\
         \n\
         Question: {question}",
        today = digest.today.format("%Y-%m-%d"),
        range = range,
        categories = categories,
        question = question.trim(),
    )
}

/// Natural-language → [`FilterSpec`] translator
pub struct QueryTranslator {
    generator: Arc<dyn TextGenerator>,
    schema: JsonValue,
}

impl QueryTranslator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            schema: filter_schema(),
        }
    }

    /// Translate `question`. Never fails: on any problem the empty filter is returned.
    pub async fn translate(
        &self,
        question: &str,
        transactions: &[Transaction],
        today: NaiveDate,
    ) -> FilterSpec {
        if !self.generator.is_configured() {
            debug!("Text generation not configured, searching without a filter");
            return FilterSpec::default();
        }

        let prompt = build_prompt(question, &DatasetDigest::new(transactions, today));
        let filter = attempt(
            "Query translation",
            async {
                let reply = self.generator.generate(&prompt, Some(&self.schema)).await?;
                parse_filter(&reply)
            },
            FilterSpec::default,
        )
        .await;

        info!("Translated question into filter: {:?}", filter);
        filter
    }
}
