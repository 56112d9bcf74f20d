//! Shared HTTP execution
//!
//! A thin, crate-owned wrapper around one `reqwest::Client`. It adds what
//! every upstream here needs and nothing else: retry with exponential
//! backoff on transport failures, a per-call timeout override, form-encoded
//! bodies, explicit cookie maps on requests, `Set-Cookie` capture on
//! responses, and JSON sniffing — the clinical backend routinely serves
//! JSON labeled `text/html`, so parsing falls back to the raw text.
//!
//! HTTP status codes are returned, never turned into errors: each caller
//! classifies the outcome against its own contract. Only transport-level
//! failures become [`FetchError`]s, and those are retried.

use crate::config::RetryConfig;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Transport-level fetch failure
///
/// Deliberately free of `reqwest` types; adapters translate these into
/// their own domain variants.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection could not be established or broke mid-flight
    #[error("transport failure: {0}")]
    Transport(String),

    /// The call exceeded its deadline
    #[error("timed out: {0}")]
    Timeout(String),

    /// The request could not be constructed
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// HTTP method subset used by the upstreams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One outgoing request
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub cookies: BTreeMap<String, String>,
    pub form: Option<Vec<(String, String)>>,
    pub raw_body: Option<String>,
    /// Overrides the client-wide timeout for unusually slow endpoints
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            cookies: BTreeMap::new(),
            form: None,
            raw_body: None,
            timeout: None,
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn cookies(mut self, cookies: &BTreeMap<String, String>) -> Self {
        self.cookies = cookies.clone();
        self
    }

    pub fn form_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }

    pub fn raw_body(mut self, body: impl Into<String>) -> Self {
        self.raw_body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// One upstream response, fully buffered
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    /// Cookies the upstream set on this response (name → value)
    pub set_cookies: BTreeMap<String, String>,
    /// Raw body bytes (registry archives are binary)
    pub bytes: Vec<u8>,
    /// Body decoded as text, lossy for binary payloads
    pub text: String,
    /// Body parsed as JSON when the content type or the text allows it
    pub json: Option<Value>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Truncated body for diagnostics, keeping logs bounded
    pub fn text_preview(&self) -> &str {
        match self.text.char_indices().nth(500) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}

/// Retrying HTTP executor shared by all adapters
pub struct HttpExecutor {
    client: Client,
    retry: RetryConfig,
}

impl HttpExecutor {
    /// Build an executor with a client-wide timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be constructed.
    pub fn new(timeout_seconds: u64, tls_verify: bool, retry: RetryConfig) -> Result<Self, FetchError> {
        let mut builder = ClientBuilder::new()
            .timeout(Duration::from_secs(timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::InvalidRequest(format!("client construction failed: {e}")))?;

        Ok(Self { client, retry })
    }

    /// Execute one request, retrying transport failures with backoff
    ///
    /// Non-2xx statuses are *not* retried and not errors; the caller owns
    /// that classification.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let max_retries = self.retry.max_retries.max(1);
        let mut attempt = 0;

        loop {
            match self.execute_once(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries {
                        return Err(e);
                    }

                    let delay_ms = self.retry.initial_delay_ms
                        * (self.retry.backoff_multiplier.powf((attempt - 1) as f64) as u64).max(1);
                    let delay_ms = delay_ms.min(self.retry.max_delay_ms);

                    tracing::warn!(
                        attempt = attempt,
                        max_retries = max_retries,
                        delay_ms = delay_ms,
                        url = %request.url,
                        error = %e,
                        "Retrying request after transport failure"
                    );

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    async fn execute_once(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if !request.cookies.is_empty() {
            builder = builder.header("Cookie", cookie_header(&request.cookies));
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }
        if let Some(body) = &request.raw_body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(classify_transport_error)?;

        let status = response.status().as_u16();
        let set_cookies = extract_set_cookies(response.headers());
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        let bytes = response
            .bytes()
            .await
            .map_err(classify_transport_error)?
            .to_vec();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let json = sniff_json(&content_type, &text);

        Ok(FetchResponse {
            status,
            set_cookies,
            bytes,
            text,
            json,
        })
    }
}

fn classify_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(e.to_string())
    } else if e.is_builder() || e.is_request() {
        FetchError::InvalidRequest(e.to_string())
    } else {
        FetchError::Transport(e.to_string())
    }
}

/// Assemble a `Cookie` header from a name→value map
fn cookie_header(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Pull `name=value` pairs out of `Set-Cookie` headers, dropping attributes
fn extract_set_cookies(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();
    for value in headers.get_all(reqwest::header::SET_COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        let pair = raw.split(';').next().unwrap_or("");
        if let Some((name, val)) = pair.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                cookies.insert(name.to_string(), val.trim().to_string());
            }
        }
    }
    cookies
}

/// Parse the body as JSON when the upstream says so, or when it mislabels
/// JSON as `text/html`
fn sniff_json(content_type: &str, text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    if content_type.contains("application/json") {
        match serde_json::from_str(text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "Content-Type is JSON but the body does not parse");
                None
            }
        }
    } else if content_type.contains("text/html") {
        // Not an error when it fails: most HTML bodies are just HTML.
        serde_json::from_str(text).ok()
    } else {
        None
    }
}
