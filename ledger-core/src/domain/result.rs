//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// The CSV file could not be tokenized at all. Aborts the import.
    #[error("Import failed: {0}")]
    ImportParse(String),

    /// A single field of a CSV row could not be read. Always recovered by defaulting the field.
    #[error("Row {row}, field '{field}': {message}")]
    RowField {
        row: usize,
        field: String,
        message: String,
    },

    /// Transient failure talking to the backend. The user may retry.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend rejected our credential (HTTP 401).
    #[error("Your session has expired. Please log in again.")]
    AuthExpired,

    /// No credential is stored yet.
    #[error("Not logged in. Run 'lens login' first.")]
    NotLoggedIn,

    /// The text-generation service failed or answered with something unusable.
    #[error("AI service error: {0}")]
    AiService(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A request for the same view is still in flight.
    #[error("Another request is still being processed")]
    Busy,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an AI service error
    pub fn ai(msg: impl Into<String>) -> Self {
        Self::AiService(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the user can reasonably retry the same action later
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Busy)
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Self::ImportParse(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
