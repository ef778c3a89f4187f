//! Session credential port

use crate::domain::result::Result;

/// Holds the bearer credential issued by the backend
pub trait SessionStore: Send + Sync {
    /// Current token, if logged in
    fn token(&self) -> Option<String>;

    fn set_token(&self, token: &str) -> Result<()>;

    /// Forget the token. Clearing an absent token is not an error.
    fn clear(&self) -> Result<()>;

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}
