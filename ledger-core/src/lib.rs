//! Ledger Core - Business logic for Ledger Lens, a personal bookkeeping assistant
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Transaction, FilterSpec, summaries)
//! - **ports**: Trait definitions for external dependencies (TransactionBackend, TextGenerator)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (backend API, DuckDB, Gemini, token file)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::{DuckDbBackend, DB_FILENAME};
use adapters::gemini::GeminiClient;
use adapters::remote::RemoteClient;
use adapters::token_store::FileTokenStore;
use config::{Config, StorageMode};
use ports::{SessionStore, TextGenerator, TransactionBackend};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{
    ComparisonKind, FilterSpec, Month, MonthOverview, MonthlySummary, PeriodComparison,
    Transaction, TransactionType, TypeFilter,
};
pub use services::{LogEntry, LogEvent, LoggingService};

/// Main context for Ledger Lens operations
///
/// This is the primary entry point for all business logic. It holds the
/// configuration, the shared transaction store, and all services.
pub struct LedgerContext {
    pub config: Config,
    pub store: Arc<TransactionStore>,
    pub import_service: ImportService,
    pub search_service: SearchService,
    pub analysis_service: AnalysisService,
    pub session_service: SessionService,
    data_dir: PathBuf,
}

impl LedgerContext {
    /// Create a context from the settings in `data_dir`
    ///
    /// Nothing is loaded yet; call [`TransactionStore::reload`] on `store` first.
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let config = Config::load(data_dir)?;

        let session = Arc::new(FileTokenStore::open(data_dir)?);
        let remote = Arc::new(RemoteClient::new(
            &config.api_base_url,
            config.request_timeout,
            session.clone(),
        )?);

        let backend: Arc<dyn TransactionBackend> = match config.storage_mode {
            StorageMode::Remote => remote.clone(),
            StorageMode::Local => Arc::new(DuckDbBackend::open(&data_dir.join(DB_FILENAME))?),
        };

        let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(
            config.ai_api_key.as_deref(),
            &config.ai_model,
            &config.ai_base_url,
            config.request_timeout,
        )?);

        Ok(Self::assemble(data_dir, config, session, remote, backend, generator))
    }

    /// Wire services around explicit collaborators
    pub fn assemble(
        data_dir: &Path,
        config: Config,
        session: Arc<dyn SessionStore>,
        remote: Arc<RemoteClient>,
        backend: Arc<dyn TransactionBackend>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let store = Arc::new(TransactionStore::new(backend));
        let narrator = Arc::new(InsightNarrator::new(
            Arc::clone(&generator),
            config.reply_language.as_deref(),
        ));
        let translator = Arc::new(QueryTranslator::new(generator));

        let import_service = ImportService::new(Arc::clone(&store));
        let search_service =
            SearchService::new(Arc::clone(&store), translator, Arc::clone(&narrator));
        let analysis_service = AnalysisService::new(Arc::clone(&store), narrator);
        let session_service = SessionService::new(remote, session);

        Self {
            config,
            store,
            import_service,
            search_service,
            analysis_service,
            session_service,
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// True when the store needs a login before it can load or save
    pub fn needs_login(&self) -> bool {
        self.config.storage_mode == StorageMode::Remote && !self.session_service.is_authenticated()
    }
}
