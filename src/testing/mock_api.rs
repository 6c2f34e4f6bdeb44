//! Mock reasoning server for tests
//!
//! Provides a [`MockLlmServer`] that emulates both the OpenAI-compatible
//! `/chat/completions` endpoint and the Anthropic `/messages` endpoint, so
//! the client and the end-to-end pipeline can be exercised without a live
//! service.
//!
//! # Example
//! ```ignore
//! let server = MockLlmServer::builder()
//!     .with_response(r#"{"probable_causes": []}"#)
//!     .with_latency(50)
//!     .build()
//!     .await;
//! let endpoint = format!("{}/v1", server.url());
//! // ... point the client at `endpoint` ...
//! server.stop().await;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};

/// Describes how the mock server should respond to the next request.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Assistant text, wrapped in the envelope of whichever endpoint was hit.
    Text(String),
    /// Raw HTTP error with the given status code and body.
    Error { status: u16, body: String },
}

/// A request as received by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn json_body(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone)]
pub struct MockServerConfig {
    /// Each request pops the next response; afterwards `default_response` is used.
    pub responses: Vec<MockResponse>,
    pub default_response: MockResponse,
    pub latency_ms: u64,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            responses: Vec::new(),
            default_response: MockResponse::Text(r#"{"probable_causes": []}"#.to_string()),
            latency_ms: 0,
        }
    }
}

#[derive(Default)]
pub struct MockLlmServerBuilder {
    config: MockServerConfig,
}

impl MockLlmServerBuilder {
    pub fn with_response(mut self, text: impl Into<String>) -> Self {
        self.config.responses.push(MockResponse::Text(text.into()));
        self
    }

    pub fn with_error(mut self, status: u16, body: impl Into<String>) -> Self {
        self.config.responses.push(MockResponse::Error {
            status,
            body: body.into(),
        });
        self
    }

    pub fn with_latency(mut self, ms: u64) -> Self {
        self.config.latency_ms = ms;
        self
    }

    pub fn with_default_response(mut self, resp: MockResponse) -> Self {
        self.config.default_response = resp;
        self
    }

    pub async fn build(self) -> MockLlmServer {
        MockLlmServer::start(self.config).await
    }
}

struct SharedState {
    config: MockServerConfig,
    next: Mutex<usize>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct MockLlmServer {
    url: String,
    state: Arc<SharedState>,
    shutdown_tx: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockLlmServer {
    pub fn builder() -> MockLlmServerBuilder {
        MockLlmServerBuilder::default()
    }

    /// Binds to `127.0.0.1:0` and serves from a background task.
    pub async fn start(config: MockServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock server");
        let addr = listener.local_addr().expect("failed to get local addr");
        let url = format!("http://{}", addr);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = Arc::new(SharedState {
            config,
            next: Mutex::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let handle = tokio::spawn(accept_loop(listener, Arc::clone(&state), shutdown_rx));

        Self {
            url,
            state,
            shutdown_tx,
            handle,
        }
    }

    /// Base URL without a path, e.g. `http://127.0.0.1:54321`.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().await.clone()
    }

    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}

async fn accept_loop(
    listener: TcpListener,
    state: Arc<SharedState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _addr)) => {
                        let state = Arc::clone(&state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, state).await {
                                tracing::debug!("mock server connection error: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        tracing::debug!("mock server accept error: {}", e);
                    }
                }
            }
        }
    }
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> std::io::Result<Option<RecordedRequest>> {
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(body_start + content_length);
    let body = String::from_utf8_lossy(&buf[body_start..body_end]).to_string();

    Ok(Some(RecordedRequest {
        method,
        path,
        headers,
        body,
    }))
}

async fn handle_connection(
    mut stream: tokio::net::TcpStream,
    state: Arc<SharedState>,
) -> std::io::Result<()> {
    let Some(request) = read_request(&mut stream).await? else {
        return Ok(());
    };

    let is_openai = request.path.ends_with("/chat/completions");
    let is_anthropic = request.path.ends_with("/messages");
    if request.method != "POST" || !(is_openai || is_anthropic) {
        return write_http_response(&mut stream, 404, "").await;
    }

    state.requests.lock().await.push(request);

    if state.config.latency_ms > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(state.config.latency_ms)).await;
    }

    let mock_response = {
        let mut idx = state.next.lock().await;
        if *idx < state.config.responses.len() {
            let resp = state.config.responses[*idx].clone();
            *idx += 1;
            resp
        } else {
            state.config.default_response.clone()
        }
    };

    match mock_response {
        MockResponse::Text(text) => {
            let body = if is_openai {
                serde_json::json!({
                    "id": "mock-resp-1",
                    "object": "chat.completion",
                    "model": "mock-model",
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": text},
                        "finish_reason": "stop"
                    }],
                    "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
                })
            } else {
                serde_json::json!({
                    "id": "msg_mock",
                    "type": "message",
                    "content": [{"type": "text", "text": text}],
                    "stop_reason": "end_turn"
                })
            };
            write_http_response(&mut stream, 200, &body.to_string()).await
        }
        MockResponse::Error { status, body } => {
            write_http_response(&mut stream, status, &body).await
        }
    }
}

async fn write_http_response(
    stream: &mut tokio::net::TcpStream,
    status: u16,
    body: &str,
) -> std::io::Result<()> {
    let status_text = match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Error",
    };

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body,
    );

    stream.write_all(response.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_starts_and_returns_url() {
        let server = MockLlmServer::builder().build().await;
        assert!(server.url().starts_with("http://127.0.0.1:"));
        server.stop().await;
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let server = MockLlmServer::builder().build().await;
        let resp = reqwest::Client::new()
            .post(format!("{}/v1/embeddings", server.url()))
            .body("{}")
            .send()
            .await
            .expect("request failed");
        assert_eq!(resp.status().as_u16(), 404);
        assert!(server.requests().await.is_empty());
        server.stop().await;
    }

    #[tokio::test]
    async fn test_queue_then_default() {
        let server = MockLlmServer::builder()
            .with_error(500, "boom")
            .with_default_response(MockResponse::Text("fallback".into()))
            .build()
            .await;
        let client = reqwest::Client::new();
        let url = format!("{}/v1/chat/completions", server.url());

        let first = client.post(&url).body("{}").send().await.unwrap();
        assert_eq!(first.status().as_u16(), 500);

        let second: serde_json::Value = client
            .post(&url)
            .body("{}")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(second["choices"][0]["message"]["content"], "fallback");
        assert_eq!(server.requests().await.len(), 2);
        server.stop().await;
    }
}
