//! Error types for the Upstage MCP server.
//!
//! All fallible operations in the library return [`Result`], with
//! [`UpstageError`] as the shared error type. Errors follow a small taxonomy:
//!
//! - Validation failures (`FileNotFound`, `NotAFile`, `UnsupportedFormat`,
//!   `FileTooLarge`) are local and abort a tool call before any network
//!   request is made.
//! - `Schema` and `NoSchema` cover malformed or missing extraction schemas,
//!   also local.
//! - `Api` is a terminal remote failure, after the client has exhausted its
//!   retry budget. `InvalidResponse` is distinct: the remote call succeeded at
//!   the HTTP level but the body did not have the expected shape.
//! - `Io` bubbles up unchanged so file-system problems stay diagnosable.
use thiserror::Error;

/// Result type alias using `UpstageError`.
pub type Result<T> = std::result::Result<T, UpstageError>;

/// Main error type for all Upstage MCP operations.
#[derive(Debug, Error)]
pub enum UpstageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Not a regular file: {path}")]
    NotAFile { path: String },

    #[error("Unsupported format '{extension}' for {purpose}; supported extensions: {allowed}")]
    UnsupportedFormat {
        extension: String,
        purpose: String,
        allowed: String,
    },

    #[error("File too large: {actual_bytes} bytes exceeds the {max_bytes} byte limit")]
    FileTooLarge { actual_bytes: u64, max_bytes: u64 },

    #[error("Schema error: {message}")]
    Schema {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(
        "No extraction schema available: provide schema_json or schema_path, or enable auto_generate_schema"
    )]
    NoSchema,

    #[error("API error: {message}")]
    Api { message: String, status: Option<u16> },

    #[error("Invalid API response: {message}")]
    InvalidResponse { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl From<serde_json::Error> for UpstageError {
    fn from(err: serde_json::Error) -> Self {
        UpstageError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl UpstageError {
    /// Create a Schema error.
    pub fn schema<S: Into<String>>(message: S) -> Self {
        Self::Schema {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Schema error with source.
    pub fn schema_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Schema {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an Api error.
    pub fn api<S: Into<String>>(message: S, status: Option<u16>) -> Self {
        Self::Api {
            message: message.into(),
            status,
        }
    }

    /// Create an InvalidResponse error.
    pub fn invalid_response<S: Into<String>>(message: S) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Create a Config error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: UpstageError = io_err.into();
        assert!(matches!(err, UpstageError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_schema_error() {
        let err = UpstageError::schema("missing discriminator");
        assert_eq!(err.to_string(), "Schema error: missing discriminator");
    }

    #[test]
    fn test_schema_error_with_source() {
        let source = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = UpstageError::schema_with_source("malformed JSON", source);
        assert_eq!(err.to_string(), "Schema error: malformed JSON");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_api_error_carries_status() {
        let err = UpstageError::api("HTTP 429: rate limited", Some(429));
        assert!(matches!(err, UpstageError::Api { status: Some(429), .. }));
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_file_too_large_reports_both_sizes() {
        let err = UpstageError::FileTooLarge {
            actual_bytes: 100,
            max_bytes: 50,
        };
        let message = err.to_string();
        assert!(message.contains("100"));
        assert!(message.contains("50"));
    }

    #[test]
    fn test_no_schema_mentions_every_source() {
        let message = UpstageError::NoSchema.to_string();
        assert!(message.contains("schema_json"));
        assert!(message.contains("schema_path"));
        assert!(message.contains("auto_generate_schema"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: UpstageError = json_err.into();
        assert!(matches!(err, UpstageError::Serialization { .. }));
    }

    #[test]
    fn test_invalid_response_distinct_from_api() {
        let api = UpstageError::api("boom", Some(500));
        let shape = UpstageError::invalid_response("missing 'choices'");
        assert!(matches!(api, UpstageError::Api { .. }));
        assert!(matches!(shape, UpstageError::InvalidResponse { .. }));
    }
}
