//! Error types for WebScout.
//!
//! Library crates use [`WebScoutError`] via `thiserror`.
//! The server crate wraps this with `color-eyre` for rich diagnostics and
//! ships [`ErrorEnvelope`] over the wire via [`format_error`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level error type for all WebScout operations.
#[derive(Debug, thiserror::Error)]
pub enum WebScoutError {
    /// Request validation error, carrying a reason per offending field.
    #[error("invalid request parameters: {fields:?}")]
    Validation { fields: BTreeMap<String, String> },

    /// Search-provider failure with an HTTP-like status and the raw body.
    #[error("search provider error (HTTP {status}): {message}")]
    Provider {
        status: u16,
        message: String,
        body: serde_json::Value,
    },

    /// A result could not be made transmittable.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Result-store or ledger persistence error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Catch-all for unclassified failures.
    #[error("unknown error ({type_name}): {detail}")]
    Unknown { type_name: String, detail: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WebScoutError>;

impl WebScoutError {
    /// Create a validation error from a field → reason mapping.
    pub fn validation(fields: BTreeMap<String, String>) -> Self {
        Self::Validation { fields }
    }

    /// Create a provider error with a status code and raw response body.
    pub fn provider(status: u16, message: impl Into<String>, body: serde_json::Value) -> Self {
        Self::Provider {
            status,
            message: message.into(),
            body,
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify a foreign error as unknown, keeping its type name and detail.
    pub fn unknown<E: std::error::Error>(source: &E) -> Self {
        Self::Unknown {
            type_name: std::any::type_name::<E>().to_string(),
            detail: source.to_string(),
        }
    }

    /// Short kind name used as the error ledger's counting key.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::Provider { .. } => "ProviderError",
            Self::Serialization(_) => "SerializationError",
            Self::Config { .. } => "ConfigError",
            Self::Storage(_) => "StorageError",
            Self::Io { .. } => "IoError",
            Self::Unknown { .. } => "UnknownError",
        }
    }

    /// Machine-readable code for the wire envelope.
    pub fn error_code(&self) -> String {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR".into(),
            Self::Provider { status, .. } => format!("API_{status}"),
            Self::Serialization(_) => "SERIALIZATION_ERROR".into(),
            Self::Config { .. } => "CONFIG_ERROR".into(),
            Self::Storage(_) => "STORAGE_ERROR".into(),
            Self::Io { .. } => "IO_ERROR".into(),
            Self::Unknown { .. } => "UNKNOWN_ERROR".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire envelope
// ---------------------------------------------------------------------------

/// Structured error response shipped across the module boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always `"error"`.
    pub status: String,
    /// Human-readable message.
    pub message: String,
    /// Machine-readable code, e.g. `VALIDATION_ERROR` or `API_422`.
    pub error_code: String,
    /// Diagnostic detail for operators.
    pub details: serde_json::Value,
    /// When the envelope was produced.
    pub timestamp: DateTime<Utc>,
}

impl ErrorEnvelope {
    /// Minimal fixed-shape envelope for when detail construction itself fails.
    fn minimal(message: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: message.into(),
            error_code: error_code.into(),
            details: serde_json::Value::Null,
            timestamp: Utc::now(),
        }
    }
}

/// Format an error into the standardized response envelope.
///
/// Fail-safe: if the diagnostic details cannot be represented as JSON, the
/// envelope degrades to a minimal fixed shape instead of propagating the
/// serialization failure.
pub fn format_error(err: &WebScoutError) -> ErrorEnvelope {
    let details = error_details(err);

    // The envelope must be transmittable as-is; refuse to ship details that
    // cannot round-trip through the serializer.
    if serde_json::to_string(&details).is_err() {
        tracing::error!(code = %err.error_code(), "error details not serializable");
        return ErrorEnvelope::minimal(
            "Internal server error - response not serializable",
            "SERIALIZATION_ERROR",
        );
    }

    ErrorEnvelope {
        status: "error".into(),
        message: err.to_string(),
        error_code: err.error_code(),
        details,
        timestamp: Utc::now(),
    }
}

/// Diagnostic detail payload per error kind.
fn error_details(err: &WebScoutError) -> serde_json::Value {
    match err {
        WebScoutError::Validation { fields } => serde_json::json!({
            "invalid_fields": fields,
        }),
        WebScoutError::Provider { status, body, .. } => serde_json::json!({
            "status_code": status,
            "response_body": body,
        }),
        WebScoutError::Serialization(detail) => serde_json::json!({
            "detail": detail,
        }),
        WebScoutError::Config { message } => serde_json::json!({
            "detail": message,
        }),
        WebScoutError::Storage(detail) => serde_json::json!({
            "detail": detail,
        }),
        WebScoutError::Io { path, source } => serde_json::json!({
            "path": path.display().to_string(),
            "detail": source.to_string(),
        }),
        WebScoutError::Unknown { type_name, detail } => serde_json::json!({
            "type": type_name,
            "detail": detail,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = WebScoutError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = WebScoutError::provider(404, "No results found", serde_json::json!({}));
        assert!(err.to_string().contains("HTTP 404"));
        assert!(err.to_string().contains("No results found"));
    }

    #[test]
    fn error_codes() {
        let mut fields = BTreeMap::new();
        fields.insert("query".to_string(), "too short".to_string());
        assert_eq!(
            WebScoutError::validation(fields).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            WebScoutError::provider(422, "bad", serde_json::Value::Null).error_code(),
            "API_422"
        );
        assert_eq!(
            WebScoutError::Serialization("oops".into()).error_code(),
            "SERIALIZATION_ERROR"
        );
    }

    #[test]
    fn format_validation_error_carries_fields() {
        let mut fields = BTreeMap::new();
        fields.insert("depth".to_string(), "Depth must be between 1 and 5".into());
        let envelope = format_error(&WebScoutError::validation(fields));

        assert_eq!(envelope.status, "error");
        assert_eq!(envelope.error_code, "VALIDATION_ERROR");
        assert_eq!(
            envelope.details["invalid_fields"]["depth"],
            "Depth must be between 1 and 5"
        );
    }

    #[test]
    fn format_provider_error_attaches_body() {
        let body = serde_json::json!({"error": "rate limited"});
        let envelope = format_error(&WebScoutError::provider(429, "Too Many Requests", body));

        assert_eq!(envelope.error_code, "API_429");
        assert_eq!(envelope.details["status_code"], 429);
        assert_eq!(envelope.details["response_body"]["error"], "rate limited");
    }

    #[test]
    fn kind_names() {
        assert_eq!(
            WebScoutError::Storage("db".into()).kind_name(),
            "StorageError"
        );
        assert_eq!(
            WebScoutError::Unknown {
                type_name: "T".into(),
                detail: "d".into()
            }
            .kind_name(),
            "UnknownError"
        );
    }
}
