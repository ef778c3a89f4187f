//! Transaction store
//!
//! The single source of truth for the current transaction set. Readers take cheap
//! snapshots or subscribe to change notifications; writers replace the set wholesale
//! after the persistence backend accepted it. Last writer wins.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::domain::result::Result;
use crate::domain::Transaction;
use crate::ports::TransactionBackend;

/// Shared, immutable view of the set at one point in time
pub type Snapshot = Arc<Vec<Transaction>>;

pub struct TransactionStore {
    backend: Arc<dyn TransactionBackend>,
    state: watch::Sender<Snapshot>,
}

impl TransactionStore {
    pub fn new(backend: Arc<dyn TransactionBackend>) -> Self {
        let (state, _) = watch::channel(Arc::new(Vec::new()));
        Self { backend, state }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Current contents
    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive a notification every time the set is replaced
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    /// Fetch the stored set from the backend and publish it.
    ///
    /// On failure the store keeps its previous contents.
    pub async fn reload(&self) -> Result<usize> {
        let transactions = self.backend.load().await?;
        let count = transactions.len();
        self.publish(transactions);
        info!("Loaded {} transactions from {} storage", count, self.backend.name());
        Ok(count)
    }

    /// Persist `transactions` as the complete set, then publish it
    pub async fn replace_all(&self, transactions: Vec<Transaction>) -> Result<usize> {
        self.backend.save(&transactions).await?;
        let count = transactions.len();
        self.publish(transactions);
        info!("Saved {} transactions to {} storage", count, self.backend.name());
        Ok(count)
    }

    /// Persist the current set followed by `transactions`, then publish it.
    ///
    /// Returns the new size of the set.
    pub async fn append(&self, transactions: Vec<Transaction>) -> Result<usize> {
        let mut combined = self.snapshot().as_ref().clone();
        combined.extend(transactions);
        self.replace_all(combined).await
    }

    fn publish(&self, transactions: Vec<Transaction>) {
        self.state.send_replace(Arc::new(transactions));
    }
}
