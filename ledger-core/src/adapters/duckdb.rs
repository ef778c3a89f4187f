//! DuckDB local storage
//!
//! Keeps the transaction set in `ledger.duckdb` when `storage.mode` is `local`. The table is
//! rewritten wholesale inside one database transaction on every save.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use duckdb::{params, Connection};
use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::result::{Error, Result};
use crate::domain::{parse_amount, Transaction};
use crate::ports::TransactionBackend;

/// File name inside the data directory
pub const DB_FILENAME: &str = "ledger.duckdb";

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transactions (
    position      BIGINT NOT NULL,
    date          VARCHAR NOT NULL,
    category      VARCHAR NOT NULL,
    main_category VARCHAR NOT NULL,
    amount        VARCHAR NOT NULL,
    currency      VARCHAR NOT NULL,
    member        VARCHAR NOT NULL,
    account       VARCHAR NOT NULL,
    tags          VARCHAR NOT NULL,
    note          VARCHAR NOT NULL,
    type          VARCHAR NOT NULL,
    last_updated  VARCHAR NOT NULL,
    uuid          VARCHAR NOT NULL
);
";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB-backed transaction storage
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbBackend {
    /// Open (creating if needed) the database at `db_path`.
    ///
    /// Retries with exponential backoff while another process holds the file lock.
    pub fn open(db_path: &Path) -> Result<Self> {
        let mut attempt = 0;
        let conn = loop {
            match Self::try_open_connection(db_path) {
                Ok(conn) => break conn,
                Err(e) if is_retryable_error(&e.to_string()) && attempt < MAX_RETRIES - 1 => {
                    let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                    warn!(
                        "Database busy, retrying in {}ms (attempt {}/{}): {}",
                        delay.as_millis(),
                        attempt + 1,
                        MAX_RETRIES,
                        e
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: db_path.to_path_buf(),
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::storage("database connection lock poisoned"))
    }

    fn read_all(&self) -> Result<Vec<Transaction>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT date, category, main_category, amount, currency, member, account,
                    tags, note, type, last_updated, uuid
             FROM transactions
             ORDER BY position",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                Transaction {
                    date: row.get(0)?,
                    category: row.get(1)?,
                    main_category: row.get(2)?,
                    amount: Decimal::ZERO,
                    currency: row.get(4)?,
                    member: row.get(5)?,
                    account: row.get(6)?,
                    tags: row.get(7)?,
                    note: row.get(8)?,
                    kind: Default::default(),
                    last_updated: row.get(10)?,
                    uuid: row.get(11)?,
                },
                row.get::<_, String>(3)?,
                row.get::<_, String>(9)?,
            ))
        })?;

        let mut transactions = Vec::new();
        for row in rows {
            let (mut tx, amount, kind) = row?;
            tx.amount = parse_amount(&amount).unwrap_or(Decimal::ZERO);
            tx.kind = kind.parse().unwrap_or_default();
            transactions.push(tx);
        }
        Ok(transactions)
    }

    fn write_all(&self, transactions: &[Transaction]) -> Result<()> {
        let mut conn = self.lock()?;
        let db_tx = conn.transaction()?;
        db_tx.execute("DELETE FROM transactions", [])?;
        {
            let mut stmt = db_tx.prepare(
                "INSERT INTO transactions (position, date, category, main_category, amount, currency,
                                           member, account, tags, note, type, last_updated, uuid)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )?;
            for (position, tx) in transactions.iter().enumerate() {
                stmt.execute(params![
                    position as i64,
                    tx.date,
                    tx.category,
                    tx.main_category,
                    tx.amount.to_string(),
                    tx.currency,
                    tx.member,
                    tx.account,
                    tx.tags,
                    tx.note,
                    tx.kind.tag(),
                    tx.last_updated,
                    tx.uuid,
                ])?;
            }
        }
        db_tx.commit()?;
        Ok(())
    }
}

#[async_trait]
impl TransactionBackend for DuckDbBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn load(&self) -> Result<Vec<Transaction>> {
        self.read_all()
    }

    async fn save(&self, transactions: &[Transaction]) -> Result<()> {
        self.write_all(transactions)
    }
}
