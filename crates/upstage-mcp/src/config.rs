//! Server configuration.
//!
//! Configuration is constructed once at startup (normally via
//! [`ServerConfig::from_env`]) and passed into every component that needs it
//! behind an `Arc`. No other module reads process environment state, which
//! keeps components substitutable in tests: point `base_url` at a mock server
//! and `output_dir` at a scratch directory.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, UpstageError};

/// Production Upstage API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.upstage.ai/v1";

/// Per-attempt request timeout. There is no end-to-end deadline across
/// retries, so the worst case is `max_attempts` times this plus backoff.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Retry policy for outbound API requests.
///
/// Delays grow exponentially from `initial_delay`, doubling per attempt, and
/// are capped at `max_delay`. The defaults match the service's documented
/// client behavior: 3 attempts with 1s, 2s, 4s backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(4000),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay to wait after a failed attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let delay = self.initial_delay.saturating_mul(factor);
        delay.min(self.max_delay)
    }
}

/// Shared server configuration.
///
/// Read-only after startup; cloned or shared via `Arc` into the API client,
/// tool registry, and transports.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Upstage API key, forwarded as a bearer token on every request.
    pub api_key: String,
    /// API base URL without a trailing slash.
    pub base_url: String,
    /// Base directory for persisted tool outputs.
    pub output_dir: PathBuf,
    /// Timeout applied to each individual request attempt.
    pub request_timeout: Duration,
    /// Retry policy for the API client.
    pub retry: RetryPolicy,
}

impl ServerConfig {
    /// Build a configuration from the process environment.
    ///
    /// `UPSTAGE_API_KEY` is required; a missing or empty value is a fatal
    /// startup error. `UPSTAGE_API_BASE` optionally overrides the API base
    /// URL, which is useful behind proxies.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("UPSTAGE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                UpstageError::config(
                    "UPSTAGE_API_KEY environment variable is not set. \
                     Get an API key from the Upstage console and export it before starting the server.",
                )
            })?;

        let mut config = Self::new(api_key);
        if let Ok(base) = std::env::var("UPSTAGE_API_BASE") {
            let base = base.trim();
            if !base.is_empty() {
                tracing::info!("Using API base URL override: {}", base);
                config.base_url = base.trim_end_matches('/').to_string();
            }
        }
        Ok(config)
    }

    /// Build a configuration with defaults for everything except the API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: default_output_dir(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the API base URL (trailing slashes stripped).
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = base_url.as_ref().trim_end_matches('/').to_string();
        self
    }

    /// Override the output base directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Per-user application data directory for persisted outputs.
fn default_output_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("upstage-mcp")
        .join("outputs")
}
