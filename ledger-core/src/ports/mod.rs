//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod backend;
pub(crate) mod generator;
mod session;

pub use backend::TransactionBackend;
pub use generator::TextGenerator;
pub use session::SessionStore;
