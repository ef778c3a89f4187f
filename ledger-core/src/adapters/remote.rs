//! Ledger Lens backend API client
//!
//! Persists the transaction set on the backend and handles account login/registration.
//!
//! - `GET  /transactions` returns `{ transactions: [...] }`
//! - `POST /transactions` accepts `{ transactions: [...] }` and replaces the stored set
//! - `POST /login` returns `{ token }`
//! - `POST /register` returns `{ message, user_id }`
//!
//! Transaction endpoints need `Authorization: Bearer <token>`. A 401 there means the
//! session expired: the stored token is dropped and [`Error::AuthExpired`] is returned.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::domain::Transaction;
use crate::ports::{SessionStore, TransactionBackend};

/// Default API root when nothing is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:9000/api";

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Option<Vec<Transaction>>,
}

#[derive(Debug, Serialize)]
struct TransactionsRequest<'a> {
    transactions: &'a [Transaction],
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

/// Backend reply to a successful registration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: String,
}

/// Backend API client
pub struct RemoteClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    session: Arc<dyn SessionStore>,
}

impl RemoteClient {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<dyn SessionStore>) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(Error::Config("API base URL cannot be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            timeout,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a bearer token
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let url = format!("{}/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::validation("Invalid email or password"));
        }
        let response = self.check_response_status(response).await?;

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| Error::network(format!("Failed to parse login response: {}", e)))?;
        Ok(body.token)
    }

    /// Create an account. The caller logs in afterwards.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<RegisterResponse> {
        let url = format!("{}/register", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&RegisterRequest {
                email,
                password,
                display_name,
            })
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let response = self.check_response_status(response).await?;
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read register response: {}", e);
                return Ok(RegisterResponse::default());
            }
        };
        match serde_json::from_str(&body) {
            Ok(reply) => Ok(reply),
            Err(e) => {
                warn!("Unexpected register response ({}): {}", e, body);
                Ok(RegisterResponse::default())
            }
        }
    }

    fn bearer(&self) -> Result<String> {
        self.session
            .token()
            .map(|token| format!("Bearer {}", token))
            .ok_or(Error::NotLoggedIn)
    }

    /// Drop the stored token when the backend no longer accepts it
    fn expire_session(&self) -> Error {
        warn!("Backend rejected the session token, logging out");
        if let Err(e) = self.session.clear() {
            warn!("Failed to clear session token: {}", e);
        }
        Error::AuthExpired
    }

    /// Map reqwest errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::network(format!(
                "Connection timed out after {} seconds",
                self.timeout.as_secs()
            ))
        } else if error.is_connect() {
            Error::network(format!("Unable to connect to {}", self.base_url))
        } else {
            Error::network(format!("Request failed: {}", error))
        }
    }

    /// Check response status and return appropriate errors
    async fn check_response_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body);
        debug!("Backend returned HTTP {}: {}", status.as_u16(), body);

        match status.as_u16() {
            401 => Err(self.expire_session()),
            400 | 409 | 422 => Err(Error::validation(
                detail.unwrap_or_else(|| format!("Request rejected (HTTP {})", status.as_u16())),
            )),
            403 => Err(Error::network("Access denied by the backend")),
            404 => Err(Error::network(format!(
                "Endpoint not found. Check storage.apiBaseUrl ({})",
                self.base_url
            ))),
            code => Err(Error::network(match detail {
                Some(detail) => format!("Backend error: HTTP {} ({})", code, detail),
                None => format!("Backend error: HTTP {}", code),
            })),
        }
    }
}

#[async_trait]
impl TransactionBackend for RemoteClient {
    fn name(&self) -> &str {
        "remote"
    }

    async fn load(&self) -> Result<Vec<Transaction>> {
        let url = format!("{}/transactions", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.bearer()?)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let response = self.check_response_status(response).await?;
        let body: TransactionsResponse = response
            .json()
            .await
            .map_err(|e| Error::network(format!("Failed to parse transactions response: {}", e)))?;

        Ok(body.transactions.unwrap_or_default())
    }

    async fn save(&self, transactions: &[Transaction]) -> Result<()> {
        let url = format!("{}/transactions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.bearer()?)
            .json(&TransactionsRequest { transactions })
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        self.check_response_status(response).await?;
        Ok(())
    }
}

/// Pull a human-readable message out of an error body like `{"error": "..."}`
fn error_detail(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    ["error", "message", "detail"]
        .iter()
        .find_map(|key| value.get(key).and_then(JsonValue::as_str))
        .map(str::to_string)
}
