//! Error types for metric sources.

use quinta_domain::InvalidRecord;
use thiserror::Error;

/// Errors raised while fetching a metric
#[derive(Debug, Error)]
pub enum SourceError {
    /// Credential acquisition or impersonation failed
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network failure or timeout
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// Non-success HTTP status
    #[error("HTTP {status} from {url}")]
    Http {
        /// Status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// The response did not have the expected shape
    #[error("Unexpected response: {0}")]
    DataShape(String),

    /// The response violated a record invariant
    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] InvalidRecord),

    /// HTTP client could not be constructed
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_status() {
            SourceError::Http {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else if e.is_decode() {
            SourceError::DataShape(e.to_string())
        } else if e.is_timeout() {
            SourceError::Unavailable(format!("Request timeout: {}", e))
        } else {
            SourceError::Unavailable(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::DataShape(format!("JSON parsing error: {}", e))
    }
}
