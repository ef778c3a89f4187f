//! Persistence backend port

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::Transaction;

/// Where the transaction set is persisted
///
/// The set is always stored and fetched whole; there is no per-record operation.
/// Implementations: the remote HTTP API and local DuckDB storage.
#[async_trait]
pub trait TransactionBackend: Send + Sync {
    /// Short name for status output (e.g. "remote", "local")
    fn name(&self) -> &str;

    /// Fetch the complete stored set
    async fn load(&self) -> Result<Vec<Transaction>>;

    /// Replace the stored set with `transactions`
    async fn save(&self, transactions: &[Transaction]) -> Result<()>;
}
