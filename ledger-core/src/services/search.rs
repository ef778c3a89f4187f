//! Smart search
//!
//! One question in, one answer out: translate the question into a filter, run it against the
//! current snapshot, and narrate the matches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::domain::result::{Error, Result};
use crate::domain::{FilterSpec, Transaction};
use crate::services::aggregate::filter;
use crate::services::narrator::InsightNarrator;
use crate::services::store::TransactionStore;
use crate::services::translator::QueryTranslator;

/// Matches returned alongside the answer
pub const RELATED_LIMIT: usize = 5;

/// Answer when the filter matches nothing
pub const NO_MATCH_ANSWER: &str = "Sorry, no transactions in your records match the current \
    filter. Please check that your data covers that date range.";

/// Result of one question
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAnswer {
    pub question: String,
    /// Filter the question was translated into; empty when translation failed
    pub filter: FilterSpec,
    pub match_count: usize,
    pub answer: String,
    /// First matches, in store order
    pub related: Vec<Transaction>,
}

/// Clears the processing flag when the search ends, however it ends
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Service for natural-language search
pub struct SearchService {
    store: Arc<TransactionStore>,
    translator: Arc<QueryTranslator>,
    narrator: Arc<InsightNarrator>,
    processing: AtomicBool,
}

impl SearchService {
    pub fn new(
        store: Arc<TransactionStore>,
        translator: Arc<QueryTranslator>,
        narrator: Arc<InsightNarrator>,
    ) -> Self {
        Self {
            store,
            translator,
            narrator,
            processing: AtomicBool::new(false),
        }
    }

    /// True while a question is being answered
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Answer `question` with relative dates resolved against the local date
    pub async fn ask(&self, question: &str) -> Result<SearchAnswer> {
        self.ask_as_of(question, Local::now().date_naive()).await
    }

    /// Answer `question` with relative dates resolved against `today`.
    ///
    /// Fails with [`Error::Busy`] while another question is in flight.
    pub async fn ask_as_of(&self, question: &str, today: NaiveDate) -> Result<SearchAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::validation("Question cannot be empty"));
        }

        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::Busy);
        }
        let _guard = ProcessingGuard(&self.processing);

        let snapshot = self.store.snapshot();
        let spec = self.translator.translate(question, &snapshot, today).await;
        let matches = filter(&snapshot, &spec);
        info!("Search matched {} of {} records", matches.len(), snapshot.len());

        let answer = if matches.is_empty() {
            NO_MATCH_ANSWER.to_string()
        } else {
            self.narrator.answer_question(question, &matches).await
        };

        Ok(SearchAnswer {
            question: question.to_string(),
            filter: spec,
            match_count: matches.len(),
            answer,
            related: matches.into_iter().take(RELATED_LIMIT).collect(),
        })
    }
}
