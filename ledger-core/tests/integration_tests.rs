//! Integration tests for ledger-core services
//!
//! These tests drive the public API the way the CLI does: CSV files on disk, a real DuckDB
//! store, and the services wired by `LedgerContext`. The text-generation service is stubbed
//! at the trait level.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use tempfile::TempDir;

use ledger_core::adapters::duckdb::{DuckDbBackend, DB_FILENAME};
use ledger_core::adapters::remote::RemoteClient;
use ledger_core::adapters::token_store::FileTokenStore;
use ledger_core::config::{Config, StorageMode};
use ledger_core::domain::result::{Error, Result};
use ledger_core::ports::{TextGenerator, TransactionBackend};
use ledger_core::services::aggregate::{compare_totals, filter, monthly_summary, sum_by_type};
use ledger_core::services::{ImportMode, QueryTranslator, NO_MATCH_ANSWER};
use ledger_core::{ComparisonKind, FilterSpec, LedgerContext, Month, Transaction, TransactionType};

// ============================================================================
// Test Helpers
// ============================================================================

const HEADER: &str = "日期,類別,大類別,金額,貨幣,成員,帳戶,標籤,備註,收支區分,上次更新,UUID";

/// Text generator returning one fixed reply and counting calls
struct CannedGenerator {
    reply: String,
    calls: Mutex<usize>,
}

impl CannedGenerator {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str, _schema: Option<&JsonValue>) -> Result<String> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.reply.clone())
    }
}

/// Backend that accepts nothing
struct UnreachableBackend;

#[async_trait]
impl TransactionBackend for UnreachableBackend {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn load(&self) -> Result<Vec<Transaction>> {
        Err(Error::network("connection refused"))
    }

    async fn save(&self, _transactions: &[Transaction]) -> Result<()> {
        Err(Error::network("connection refused"))
    }
}

fn local_config() -> Config {
    Config {
        storage_mode: StorageMode::Local,
        ..Config::default()
    }
}

/// Context over a DuckDB store in `dir` with `generator` standing in for Gemini
fn create_context(
    dir: &Path,
    backend: Arc<dyn TransactionBackend>,
    generator: Arc<dyn TextGenerator>,
) -> LedgerContext {
    let session = Arc::new(FileTokenStore::open(dir).unwrap());
    let remote = Arc::new(
        RemoteClient::new("http://127.0.0.1:1/api", Duration::from_secs(1), session.clone())
            .unwrap(),
    );
    LedgerContext::assemble(dir, local_config(), session, remote, backend, generator)
}

fn duckdb_backend(dir: &Path) -> Arc<dyn TransactionBackend> {
    Arc::new(DuckDbBackend::open(&dir.join(DB_FILENAME)).unwrap())
}

fn write_csv(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let mut content = String::from(HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn sample_rows() -> Vec<&'static str> {
    vec![
        "20251003,午餐,飲食,150,TWD,我,現金,,便當,支,2025-10-03 12:00,a1",
        "20251015,交通,交通,50,TWD,我,悠遊卡,通勤,捷運,支,2025-10-15 08:00,a2",
        "20251105,午餐,飲食,120,TWD,我,現金,,拉麵,支,2025-11-05 12:30,a3",
        "20251110,娛樂,休閒,300,TWD,小明,信用卡,週末,電影,支,2025-11-10 20:00,a4",
        "20251130,薪水,收入,50000,TWD,我,銀行,,,收,2025-11-30 09:00,a5",
    ]
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ============================================================================
// Import Tests
// ============================================================================

/// Importing N data rows yields exactly N records with fields mapped by column name
#[tokio::test]
async fn test_import_round_trip_through_duckdb() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_csv(temp_dir.path(), "export.csv", &sample_rows());

    {
        let ctx = create_context(
            temp_dir.path(),
            duckdb_backend(temp_dir.path()),
            CannedGenerator::new("{}"),
        );
        let result = ctx.import_service.import(&csv, ImportMode::Replace).await.unwrap();
        assert_eq!(result.imported, 5);
        assert_eq!(result.total, 5);
        assert!(result.warnings.is_empty());
    }

    // A fresh store over the same file sees the same set
    let ctx = create_context(
        temp_dir.path(),
        duckdb_backend(temp_dir.path()),
        CannedGenerator::new("{}"),
    );
    assert_eq!(ctx.store.reload().await.unwrap(), 5);

    let snapshot = ctx.store.snapshot();
    let movie = &snapshot[3];
    assert_eq!(movie.date, "20251110");
    assert_eq!(movie.category, "娛樂");
    assert_eq!(movie.main_category, "休閒");
    assert_eq!(movie.amount, Decimal::new(300, 0));
    assert_eq!(movie.currency, "TWD");
    assert_eq!(movie.member, "小明");
    assert_eq!(movie.account, "信用卡");
    assert_eq!(movie.tags, "週末");
    assert_eq!(movie.note, "電影");
    assert_eq!(movie.kind, TransactionType::Expense);
    assert_eq!(movie.last_updated, "2025-11-10 20:00");
    assert_eq!(movie.uuid, "a4");
    assert_eq!(snapshot[4].kind, TransactionType::Income);
}

#[tokio::test]
async fn test_append_import_keeps_existing_records() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(
        temp_dir.path(),
        duckdb_backend(temp_dir.path()),
        CannedGenerator::new("{}"),
    );

    let first = write_csv(temp_dir.path(), "first.csv", &sample_rows()[..2]);
    let second = write_csv(temp_dir.path(), "second.csv", &sample_rows()[2..]);

    ctx.import_service.import(&first, ImportMode::Replace).await.unwrap();
    let result = ctx.import_service.import(&second, ImportMode::Append).await.unwrap();

    assert_eq!(result.imported, 3);
    assert_eq!(result.total, 5);
    let uuids: Vec<String> = ctx.store.snapshot().iter().map(|tx| tx.uuid.clone()).collect();
    assert_eq!(uuids, vec!["a1", "a2", "a3", "a4", "a5"]);
}

#[tokio::test]
async fn test_rejected_save_leaves_store_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(
        temp_dir.path(),
        Arc::new(UnreachableBackend),
        CannedGenerator::new("{}"),
    );
    let csv = write_csv(temp_dir.path(), "export.csv", &sample_rows());

    let err = ctx
        .import_service
        .import(&csv, ImportMode::Replace)
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert!(ctx.store.is_empty());
}

#[tokio::test]
async fn test_subscribers_see_import() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(
        temp_dir.path(),
        duckdb_backend(temp_dir.path()),
        CannedGenerator::new("{}"),
    );
    let mut updates = ctx.store.subscribe();
    let csv = write_csv(temp_dir.path(), "export.csv", &sample_rows());

    ctx.import_service.import(&csv, ImportMode::Replace).await.unwrap();

    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().len(), 5);
}

// ============================================================================
// Aggregation Scenarios
// ============================================================================

#[test]
fn test_monthly_summary_scenario() {
    let transactions = vec![
        Transaction::new("20250101", TransactionType::Expense, "food", Decimal::new(100, 0)),
        Transaction::new("20250201", TransactionType::Expense, "food", Decimal::new(150, 0)),
    ];

    let january = monthly_summary(&transactions, "202501".parse::<Month>().unwrap());
    let february = monthly_summary(&transactions, "202502".parse::<Month>().unwrap());

    assert_eq!(january.total_expense, Decimal::new(100, 0));
    assert_eq!(february.total_expense, Decimal::new(150, 0));
}

#[test]
fn test_compare_against_empty_period() {
    assert_eq!(
        compare_totals(Decimal::new(100, 0), Decimal::ZERO).percent_change,
        Decimal::ONE_HUNDRED
    );
    assert_eq!(
        compare_totals(Decimal::ZERO, Decimal::ZERO).percent_change,
        Decimal::ZERO
    );
}

#[test]
fn test_expense_sum_is_order_independent() {
    let mut transactions: Vec<Transaction> = [1, 10, 100, 1000]
        .iter()
        .map(|cents| {
            Transaction::new("20250101", TransactionType::Expense, "x", Decimal::new(*cents, 2))
        })
        .collect();
    let forward = sum_by_type(&transactions, TransactionType::Expense);
    transactions.reverse();

    assert_eq!(forward, Decimal::new(1111, 2));
    assert_eq!(sum_by_type(&transactions, TransactionType::Expense), forward);
    assert_eq!(sum_by_type(&[], TransactionType::Expense), Decimal::ZERO);
}

// ============================================================================
// Fail-open Search
// ============================================================================

/// An unparsable translation yields the empty filter, which keeps every record
#[tokio::test]
async fn test_unparsable_translation_fails_open() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(
        temp_dir.path(),
        duckdb_backend(temp_dir.path()),
        CannedGenerator::new("Sorry, I can't help with that."),
    );
    let csv = write_csv(temp_dir.path(), "export.csv", &sample_rows());
    ctx.import_service.import(&csv, ImportMode::Replace).await.unwrap();
    let snapshot = ctx.store.snapshot();

    let translator = QueryTranslator::new(CannedGenerator::new("<<garbage>>"));
    let spec = translator
        .translate("how much did I spend?", &snapshot, date("2025-12-01"))
        .await;
    assert_eq!(spec, FilterSpec::default());
    assert_eq!(filter(&snapshot, &spec), *snapshot);

    let answer = ctx
        .search_service
        .ask_as_of("how much did I spend?", date("2025-12-01"))
        .await
        .unwrap();
    assert!(answer.filter.is_empty());
    assert_eq!(answer.match_count, snapshot.len());
}

#[tokio::test]
async fn test_search_with_translated_filter() {
    let temp_dir = TempDir::new().unwrap();
    let generator = CannedGenerator::new(
        r#"```json
{"category": "午餐", "startDate": "2025-11-01", "endDate": "2025-11-30"}
```"#,
    );
    let ctx = create_context(
        temp_dir.path(),
        duckdb_backend(temp_dir.path()),
        generator.clone(),
    );
    let csv = write_csv(temp_dir.path(), "export.csv", &sample_rows());
    ctx.import_service.import(&csv, ImportMode::Replace).await.unwrap();

    let answer = ctx
        .search_service
        .ask_as_of("上個月午餐花多少?", date("2025-12-01"))
        .await
        .unwrap();

    assert_eq!(answer.match_count, 1);
    assert_eq!(answer.related[0].uuid, "a3");
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn test_search_without_matches() {
    let temp_dir = TempDir::new().unwrap();
    let generator = CannedGenerator::new(r#"{"startDate": "2020-01-01", "endDate": "2020-12-31"}"#);
    let ctx = create_context(
        temp_dir.path(),
        duckdb_backend(temp_dir.path()),
        generator.clone(),
    );
    let csv = write_csv(temp_dir.path(), "export.csv", &sample_rows());
    ctx.import_service.import(&csv, ImportMode::Replace).await.unwrap();

    let answer = ctx
        .search_service
        .ask_as_of("2020 年花了多少?", date("2025-12-01"))
        .await
        .unwrap();

    assert_eq!(answer.match_count, 0);
    assert_eq!(answer.answer, NO_MATCH_ANSWER);
    assert_eq!(generator.calls(), 1);
}

// ============================================================================
// Analysis
// ============================================================================

#[tokio::test]
async fn test_month_over_month_report() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(
        temp_dir.path(),
        duckdb_backend(temp_dir.path()),
        CannedGenerator::new("Spending rose by 110."),
    );
    let csv = write_csv(temp_dir.path(), "export.csv", &sample_rows());
    ctx.import_service.import(&csv, ImportMode::Replace).await.unwrap();

    let november = Month::new(2025, 11).unwrap();
    let report = ctx
        .analysis_service
        .compare(november, ComparisonKind::MonthOverMonth, true)
        .await;

    assert_eq!(report.current.total_expense, Decimal::new(420, 0));
    assert_eq!(report.previous.total_expense, Decimal::new(200, 0));
    assert_eq!(report.comparison.diff, Decimal::new(220, 0));
    assert_eq!(report.comparison.percent_change, Decimal::new(110, 0));
    assert_eq!(report.narrative.as_deref(), Some("Spending rose by 110."));

    let overview = ctx.analysis_service.overview(november);
    assert_eq!(overview.balance, Decimal::new(49580, 0));
    assert_eq!(overview.count, 3);
}

// ============================================================================
// Context Wiring
// ============================================================================

#[tokio::test]
async fn test_context_from_settings_uses_local_storage() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("settings.json"),
        r#"{"storage": {"mode": "local"}}"#,
    )
    .unwrap();
    let csv = write_csv(temp_dir.path(), "export.csv", &sample_rows());

    {
        let ctx = LedgerContext::new(temp_dir.path()).unwrap();
        assert_eq!(ctx.store.backend_name(), "local");
        assert!(!ctx.needs_login());
        ctx.import_service.import(&csv, ImportMode::Replace).await.unwrap();
    }

    assert!(temp_dir.path().join(DB_FILENAME).exists());
    let ctx = LedgerContext::new(temp_dir.path()).unwrap();
    assert_eq!(ctx.store.reload().await.unwrap(), 5);
}
