//! HTTP client for the Upstage document-intelligence API.
//!
//! [`ApiClient`] performs one logical remote call per invocation against one
//! of four fixed endpoints, with transparent bounded retry. Two request modes
//! exist: JSON chat-completion bodies carrying the document as a base64 data
//! URI, and multipart form uploads for the document-digitization endpoint.
//!
//! The retry loop is an explicit state machine driven by
//! [`RetryPolicy`](crate::config::RetryPolicy): attempt, classify the error,
//! back off, try again. Client errors in the 4xx range other than 429 fail
//! immediately without consuming the remaining attempts; 429, 5xx, and
//! transport errors are retried until the budget runs out, at which point the
//! last error surfaces.

use std::path::Path;
use std::sync::Arc;

use base64::prelude::*;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::error::{Result, UpstageError};

/// Client-identification header sent on every request.
const CLIENT_HEADER: &str = "x-upstage-client";

/// The four remote operations the adapter fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    DocumentParse,
    InformationExtract,
    SchemaGeneration,
    DocumentClassify,
}

impl Endpoint {
    /// Path under the configured base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::DocumentParse => "/document-digitization",
            Endpoint::InformationExtract => "/information-extraction/chat/completions",
            Endpoint::SchemaGeneration => {
                "/information-extraction/schema-generation/chat/completions"
            }
            Endpoint::DocumentClassify => "/document-classification/chat/completions",
        }
    }

    /// Model identifier the endpoint expects.
    pub fn model(&self) -> &'static str {
        match self {
            Endpoint::DocumentParse => "document-parse",
            Endpoint::InformationExtract | Endpoint::SchemaGeneration => "information-extract",
            Endpoint::DocumentClassify => "document-classify",
        }
    }
}

enum Payload {
    Json(Value),
    Multipart {
        file_name: String,
        mime: String,
        data: Vec<u8>,
        fields: Vec<(String, String)>,
    },
}

/// Upstage API client with bounded exponential-backoff retry.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ServerConfig>,
}

impl ApiClient {
    /// Build a client from shared configuration.
    ///
    /// The bearer token and client-identification headers are attached to
    /// every request; the per-attempt timeout comes from
    /// `config.request_timeout`.
    pub fn new(config: Arc<ServerConfig>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", config.api_key);
        let mut auth = HeaderValue::from_str(&bearer)
            .map_err(|err| UpstageError::config(format!("invalid API key: {}", err)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            CLIENT_HEADER,
            HeaderValue::from_static(concat!("upstage-mcp/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| UpstageError::config(format!("failed to build HTTP client: {}", err)))?;

        Ok(Self { http, config })
    }

    /// Send a JSON request to an endpoint, with retry.
    pub async fn post_json(&self, endpoint: Endpoint, body: &Value) -> Result<Value> {
        self.request_with_retry(endpoint, Payload::Json(body.clone()))
            .await
    }

    /// Upload a file as a multipart form to an endpoint, with retry.
    ///
    /// The file is read into memory once (inputs are already bounded by the
    /// validator's size ceiling) and a fresh form is assembled per attempt.
    pub async fn post_multipart(
        &self,
        endpoint: Endpoint,
        file_path: &Path,
        fields: Vec<(String, String)>,
    ) -> Result<Value> {
        let data = tokio::fs::read(file_path).await?;
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        let mime = mime_guess::from_path(file_path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        self.request_with_retry(
            endpoint,
            Payload::Multipart {
                file_name,
                mime,
                data,
                fields,
            },
        )
        .await
    }

    async fn request_with_retry(&self, endpoint: Endpoint, payload: Payload) -> Result<Value> {
        let retry = &self.config.retry;
        let mut attempt: u32 = 1;

        loop {
            debug!(endpoint = endpoint.path(), attempt, "sending API request");
            match self.send_once(endpoint, &payload).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if !is_retryable(&err) {
                        debug!(error = %err, "error is not retryable, failing immediately");
                        return Err(err);
                    }
                    if attempt >= retry.max_attempts {
                        warn!(
                            attempts = retry.max_attempts,
                            error = %err,
                            "request failed after exhausting retries"
                        );
                        return Err(err);
                    }
                    let delay = retry.delay_for_attempt(attempt);
                    debug!(error = %err, delay_ms = delay.as_millis() as u64, "retrying after backoff");
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn send_once(&self, endpoint: Endpoint, payload: &Payload) -> Result<Value> {
        let url = format!("{}{}", self.config.base_url, endpoint.path());
        let request = match payload {
            Payload::Json(body) => self.http.post(&url).json(body),
            Payload::Multipart {
                file_name,
                mime,
                data,
                fields,
            } => {
                let mut form = Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                let part = Part::bytes(data.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime)
                    .map_err(|err| {
                        UpstageError::api(format!("invalid multipart payload: {}", err), None)
                    })?;
                form = form.part("document", part);
                self.http.post(&url).multipart(form)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|err| UpstageError::api(format!("request failed: {}", err), None))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<Value>()
                .await
                .map_err(|err| UpstageError::invalid_response(format!("body is not JSON: {}", err)))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(UpstageError::api(
                upstream_error_message(status, &body),
                Some(status.as_u16()),
            ))
        }
    }
}

/// Whether an error is worth another attempt.
///
/// Rate limiting (429), server errors (5xx), and transport failures are
/// transient; any other 4xx means the request itself is wrong and a retry
/// would only repeat the failure.
pub(crate) fn is_retryable(err: &UpstageError) -> bool {
    match err {
        UpstageError::Api { status: Some(status), .. } => {
            *status == 429 || *status >= 500
        }
        UpstageError::Api { status: None, .. } => true,
        _ => false,
    }
}

/// Pull a useful message out of a non-success response body.
fn upstream_error_message(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| value.get("message").and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                trimmed.chars().take(500).collect()
            }
        });
    format!("HTTP {}: {}", status.as_u16(), detail)
}

/// Encode a file as a `data:` URI for JSON request bodies.
///
/// MIME type is guessed from the extension, falling back to
/// `application/octet-stream`.
pub async fn file_to_data_uri(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(format!(
        "data:{};base64,{}",
        mime.essence_str(),
        BASE64_STANDARD.encode(&bytes)
    ))
}

/// Build the chat-completion body shared by the JSON-mode endpoints.
pub fn chat_completion_body(model: &str, data_uri: &str, response_format: Option<Value>) -> Value {
    let mut body = json!({
        "model": model,
        "messages": [{
            "role": "user",
            "content": [{
                "type": "image_url",
                "image_url": { "url": data_uri }
            }]
        }]
    });
    if let Some(format) = response_format {
        body["response_format"] = format;
    }
    body
}

/// Extract `choices[0].message.content` from a chat-completion response.
pub fn message_content(response: &Value) -> Result<&str> {
    let choice = response
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .ok_or_else(|| UpstageError::invalid_response("response is missing 'choices'"))?;
    choice
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| UpstageError::invalid_response("response is missing 'message.content'"))
}
