//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod aggregate;
mod analysis;
pub mod fallback;
pub mod import;
pub mod logging;
pub mod narrator;
mod search;
mod session;
pub mod store;
pub mod translator;

pub use analysis::{AnalysisService, ComparisonReport};
pub use import::{ImportMode, ImportResult, ImportService, ParsedCsv};
pub use logging::{LogEntry, LogEvent, LoggingService};
pub use narrator::InsightNarrator;
pub use search::{SearchAnswer, SearchService, NO_MATCH_ANSWER, RELATED_LIMIT};
pub use session::SessionService;
pub use store::{Snapshot, TransactionStore};
pub use translator::{DatasetDigest, QueryTranslator};
