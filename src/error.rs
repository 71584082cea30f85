//! Error types for the Gemini chat client

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`ClientError`]
pub type Result<T> = std::result::Result<T, ClientError>;

/// Main error type for the Gemini chat client
///
/// Nothing in this crate recovers from these; every variant is handed back to
/// the caller as-is.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration parse error
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// Configuration that cannot be turned into a working client
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error reported by the Gemini API (non-success status or an error payload)
    #[error("Gemini API error (HTTP {status}{}): {message}", code_suffix(.code))]
    Api {
        status: u16,
        /// Gemini status string such as `INVALID_ARGUMENT` or `PERMISSION_DENIED`
        code: Option<String>,
        message: String,
    },

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed event stream
    #[error("Stream error: {0}")]
    Stream(String),
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(", {c}")).unwrap_or_default()
}

impl ClientError {
    /// HTTP status carried by the error, if Gemini answered at all
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether Gemini rejected the credentials (missing or invalid API key)
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}
