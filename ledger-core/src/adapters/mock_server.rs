//! Mock HTTP server for testing
//!
//! Simulates both external services on one port:
//! - the backend API under `/api` (`/login`, `/register`, `/transactions`)
//! - the Gemini API under `/v1beta` (`/models/{model}:generateContent`)
//!
//! Every parsed request is recorded so tests can inspect what the clients sent.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{json, Value as JsonValue};

use crate::domain::Transaction;

/// Token issued by `/api/login`
pub const MOCK_TOKEN: &str = "test_token";
/// The only password `/api/login` accepts
pub const MOCK_PASSWORD: &str = "secret";
/// The only Gemini key the server accepts
pub const MOCK_API_KEY: &str = "test_gemini_key";
/// `/api/register` refuses this address
pub const TAKEN_EMAIL: &str = "taken@example.com";
/// `/api/register` answers this address with a bare string instead of an object
pub const TERSE_EMAIL: &str = "terse@example.com";

/// Configuration for the mock server
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Initial contents of the backend store
    pub transactions: Vec<Transaction>,
    /// Text of the single Gemini candidate; `None` answers with no candidates
    pub gemini_reply: Option<String>,
    /// Answer every `/api/transactions` call with HTTP 500
    pub fail_backend: bool,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            transactions: Vec::new(),
            gemini_reply: Some("OK".to_string()),
            fail_backend: false,
            delay_ms: 0,
        }
    }
}

/// A request as received by the server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: JsonValue,
}

#[derive(Debug)]
struct MockState {
    config: MockConfig,
    stored: JsonValue,
    requests: Vec<RecordedRequest>,
}

/// Mock backend + Gemini server
pub struct MockServer {
    port: u16,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<MockState>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl MockServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let stored = serde_json::to_value(&config.transactions)?;
        let state = Arc::new(Mutex::new(MockState {
            config,
            stored,
            requests: Vec::new(),
        }));
        let state_clone = state.clone();

        // Set listener to non-blocking for graceful shutdown
        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let state = state_clone.clone();
                        thread::spawn(move || handle_connection(stream, &state));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            state,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Root for `RemoteClient`
    pub fn api_url(&self) -> String {
        format!("{}/api", self.base_url())
    }

    /// Root for `GeminiClient`
    pub fn gemini_url(&self) -> String {
        format!("{}/v1beta", self.base_url())
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Current contents of the backend store
    pub fn stored(&self) -> JsonValue {
        self.state.lock().unwrap().stored.clone()
    }

    /// Overwrite the backend store with raw JSON records
    pub fn set_stored(&self, records: JsonValue) {
        self.state.lock().unwrap().stored = records;
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read one request: the header block, then `Content-Length` bytes of body
fn read_request(stream: &mut TcpStream) -> Option<(String, Vec<u8>)> {
    let mut data = Vec::new();
    let mut buffer = [0; 4096];

    let header_end = loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
    }

    let body = data[header_end..].to_vec();
    Some((head, body))
}

fn handle_connection(mut stream: TcpStream, state: &Mutex<MockState>) {
    let _ = stream.set_nonblocking(false);

    let Some((head, body)) = read_request(&mut stream) else {
        return;
    };

    let first_line = head.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        send_response(&mut stream, 400, "Bad Request", r#"{"error": "Invalid request"}"#);
        return;
    }

    let method = parts[0].to_string();
    let path = parts[1].split('?').next().unwrap_or(parts[1]).to_string();
    let body: JsonValue = serde_json::from_slice(&body).unwrap_or(JsonValue::Null);
    let head_lower = head.to_lowercase();

    let (status, payload) = {
        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            body: body.clone(),
        });
        if state.config.delay_ms > 0 {
            thread::sleep(std::time::Duration::from_millis(state.config.delay_ms));
        }
        route(&mut state, &method, &path, &head_lower, &body)
    };

    let status_text = match status {
        200 => "OK",
        201 => "Created",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        _ => "Internal Server Error",
    };
    send_response(&mut stream, status, status_text, &payload.to_string());
}

fn route(
    state: &mut MockState,
    method: &str,
    path: &str,
    head_lower: &str,
    body: &JsonValue,
) -> (u16, JsonValue) {
    match (method, path) {
        ("POST", "/api/login") => {
            if body["password"] == MOCK_PASSWORD {
                (200, json!({ "token": MOCK_TOKEN }))
            } else {
                (401, json!({ "error": "Invalid credentials" }))
            }
        }
        ("POST", "/api/register") => {
            if body["email"] == TAKEN_EMAIL {
                (409, json!({ "error": "Email already registered" }))
            } else if body["email"] == TERSE_EMAIL {
                (201, json!("created"))
            } else {
                (201, json!({ "message": "User registered successfully", "user_id": "user-1" }))
            }
        }
        (_, "/api/transactions") => {
            let authorized = head_lower.contains(&format!("authorization: bearer {}", MOCK_TOKEN));
            if !authorized {
                return (401, json!({ "error": "Invalid or expired token" }));
            }
            if state.config.fail_backend {
                return (500, json!({ "error": "database unavailable" }));
            }
            match method {
                "GET" => (200, json!({ "transactions": state.stored })),
                "POST" => {
                    state.stored = body["transactions"].clone();
                    let count = state.stored.as_array().map_or(0, Vec::len);
                    (200, json!({ "message": "Transactions saved", "count": count }))
                }
                _ => (405, json!({ "error": "Method not allowed" })),
            }
        }
        ("POST", p) if p.starts_with("/v1beta/models/") && p.ends_with(":generateContent") => {
            let authorized = head_lower.contains(&format!("x-goog-api-key: {}", MOCK_API_KEY));
            if !authorized {
                return (
                    403,
                    json!({ "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" } }),
                );
            }
            match &state.config.gemini_reply {
                Some(text) => (
                    200,
                    json!({
                        "candidates": [{
                            "content": { "role": "model", "parts": [{ "text": text }] },
                            "finishReason": "STOP"
                        }]
                    }),
                ),
                None => (200, json!({ "candidates": [] })),
            }
        }
        _ => (404, json!({ "error": "Endpoint not found" })),
    }
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_request(server: &MockServer, request: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", server.port)).unwrap();
        stream.write_all(request.as_bytes()).unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    #[test]
    fn test_unknown_endpoint() {
        let server = MockServer::start(MockConfig::default()).unwrap();
        let response = raw_request(&server, "GET /nowhere HTTP/1.1\r\nHost: x\r\n\r\n");
        assert!(response.starts_with("HTTP/1.1 404"));
        assert_eq!(server.requests().len(), 1);
    }

    #[test]
    fn test_transactions_need_token() {
        let server = MockServer::start(MockConfig::default()).unwrap();
        let response = raw_request(&server, "GET /api/transactions HTTP/1.1\r\nHost: x\r\n\r\n");
        assert!(response.starts_with("HTTP/1.1 401"));
    }
}
