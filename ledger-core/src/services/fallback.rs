//! Attempt-with-fallback
//!
//! The recovery policy shared by the translator, the narrator and CSV row parsing: a
//! recoverable failure is logged and replaced by a safe default instead of propagating.

use std::fmt::Display;
use std::future::Future;

use tracing::warn;

/// Return the value of `result`, or `fallback()` after logging the error
pub fn recover<T, E, F>(operation: &str, result: Result<T, E>, fallback: F) -> T
where
    E: Display,
    F: FnOnce() -> T,
{
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("{} failed, using fallback: {}", operation, e);
            fallback()
        }
    }
}

/// Await `fut` and recover its error the same way as [`recover`]
pub async fn attempt<T, E, Fut, F>(operation: &str, fut: Fut, fallback: F) -> T
where
    E: Display,
    Fut: Future<Output = Result<T, E>>,
    F: FnOnce() -> T,
{
    recover(operation, fut.await, fallback)
}
