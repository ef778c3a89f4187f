//! Account session: login, registration, logout

use std::sync::Arc;

use tracing::info;

use crate::adapters::remote::{RegisterResponse, RemoteClient};
use crate::domain::result::{Error, Result};
use crate::ports::SessionStore;

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(Error::validation("Email and password are required"));
    }
    if !email.contains('@') {
        return Err(Error::validation(format!("'{}' is not an email address", email.trim())));
    }
    Ok(())
}

/// Service for managing the backend session
pub struct SessionService {
    client: Arc<RemoteClient>,
    session: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(client: Arc<RemoteClient>, session: Arc<dyn SessionStore>) -> Self {
        Self { client, session }
    }

    /// Log in and persist the issued token
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        validate_credentials(email, password)?;
        let token = self.client.login(email.trim(), password).await?;
        self.session.set_token(&token)?;
        info!("Logged in to {}", self.client.base_url());
        Ok(())
    }

    /// Create an account. Does not log in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<RegisterResponse> {
        validate_credentials(email, password)?;
        let display_name = display_name.map(str::trim).filter(|name| !name.is_empty());
        self.client.register(email.trim(), password, display_name).await
    }

    pub fn logout(&self) -> Result<()> {
        self.session.clear()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn api_base_url(&self) -> &str {
        self.client.base_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock_server::{MockConfig, MockServer, MOCK_PASSWORD, MOCK_TOKEN};
    use crate::adapters::token_store::FileTokenStore;
    use std::time::Duration;
    use tempfile::TempDir;

    fn service(server: &MockServer, dir: &TempDir) -> (SessionService, Arc<FileTokenStore>) {
        let session = Arc::new(FileTokenStore::open(dir.path()).unwrap());
        let client = Arc::new(
            RemoteClient::new(&server.api_url(), Duration::from_secs(5), session.clone()).unwrap(),
        );
        (SessionService::new(client, session.clone()), session)
    }

    #[test]
    fn test_validate_credentials() {
        assert!(validate_credentials("amy@example.com", "pw").is_ok());
        assert!(validate_credentials("", "pw").is_err());
        assert!(validate_credentials("amy@example.com", "").is_err());
        assert!(validate_credentials("amy", "pw").is_err());
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let server = MockServer::start(MockConfig::default()).unwrap();
        let dir = TempDir::new().unwrap();
        let (service, session) = service(&server, &dir);

        assert!(!service.is_authenticated());
        service.login(" amy@example.com ", MOCK_PASSWORD).await.unwrap();
        assert!(service.is_authenticated());
        assert_eq!(session.token().as_deref(), Some(MOCK_TOKEN));

        service.logout().unwrap();
        assert!(!service.is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_login_keeps_logged_out() {
        let server = MockServer::start(MockConfig::default()).unwrap();
        let dir = TempDir::new().unwrap();
        let (service, _) = service(&server, &dir);

        assert!(service.login("amy@example.com", "wrong").await.is_err());
        assert!(!service.is_authenticated());
    }

    #[tokio::test]
    async fn test_register_sends_display_name() {
        let server = MockServer::start(MockConfig::default()).unwrap();
        let dir = TempDir::new().unwrap();
        let (service, _) = service(&server, &dir);

        let reply = service
            .register("new@example.com", "pw", Some(" New User "))
            .await
            .unwrap();
        assert_eq!(reply.user_id, "user-1");

        let request = server.requests().pop().unwrap();
        assert_eq!(request.path, "/api/register");
        assert_eq!(request.body["display_name"], "New User");
        assert!(!service.is_authenticated());
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_request() {
        let server = MockServer::start(MockConfig::default()).unwrap();
        let dir = TempDir::new().unwrap();
        let (service, _) = service(&server, &dir);

        assert!(matches!(
            service.register("", "pw", None).await,
            Err(Error::Validation(_))
        ));
        assert!(server.requests().is_empty());
    }
}
