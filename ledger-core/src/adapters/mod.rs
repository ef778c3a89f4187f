//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Backend HTTP API for TransactionBackend (default)
//! - DuckDB for TransactionBackend (local mode)
//! - Gemini HTTP client for TextGenerator
//! - Local filesystem for SessionStore

pub mod duckdb;
pub mod gemini;
pub mod remote;
pub mod token_store;

#[cfg(test)]
pub mod mock_server;
