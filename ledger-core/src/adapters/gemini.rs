//! Gemini API client
//!
//! Calls `POST {base}/models/{model}:generateContent`. When a JSON schema is supplied the
//! request asks for `application/json` output constrained by it; the service does not
//! guarantee conformance, so callers still validate what comes back.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::ports::TextGenerator;

/// Production endpoint root
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Placeholder shipped in sample configuration files
const PLACEHOLDER_KEY: &str = "YOUR_API_KEY_HERE";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_json_schema: &'a JsonValue,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Gemini API client
#[derive(Debug)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client. A missing key is allowed; [`TextGenerator::is_configured`] reports it.
    pub fn new(api_key: Option<&str>, model: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let api_key = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_KEY)
            .map(str::to_string);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::network("Gemini request timed out")
        } else if error.is_connect() {
            Error::network("Unable to connect to the Gemini API")
        } else {
            Error::network(format!("Gemini request failed: {}", error))
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, schema: Option<&JsonValue>) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::ai("API key is not configured"))?;

        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: schema.map(|schema| GenerationConfig {
                response_mime_type: "application/json",
                response_json_schema: schema,
            }),
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_request_error(e))?;

        if !status.is_success() {
            debug!("Gemini returned HTTP {}: {}", status.as_u16(), body);
            return Err(match status.as_u16() {
                401 | 403 => Error::ai("Gemini rejected the API key"),
                429 => Error::ai("Gemini quota exceeded, try again later"),
                code => Error::ai(match api_error_message(&body) {
                    Some(message) => format!("HTTP {}: {}", code, message),
                    None => format!("HTTP {}", code),
                }),
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| Error::ai(format!("Unexpected Gemini response: {}", e)))?;

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(Error::ai(format!("Prompt blocked: {}", reason)));
        }

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::ai("Gemini returned no candidates"))?;

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::ai(format!(
                "Gemini returned an empty answer (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// `{"error": {"message": "..."}}` as returned by Google APIs
fn api_error_message(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}
