//! Error types for customerio-core

use thiserror::Error;

/// Main error type for the customerio-core library
#[derive(Error, Debug)]
pub enum Error {
    /// A required argument or attribute was absent. Raised before any request is sent.
    #[error("{0}")]
    MissingRequiredField(String),

    /// The transport gave up without producing a response
    #[error("{message} from {url}: {reason}")]
    NoResponse {
        message: String,
        /// URL the request was sent to
        url: String,
        /// Outbound payload, when the request had one
        data: Option<serde_json::Value>,
        /// Transport error text
        reason: String,
    },

    /// The Track API answered with a status other than 200
    #[error("Track API responded with HTTP {code}: {body}")]
    Http {
        code: u16,
        /// Response body, parsed as JSON
        body: serde_json::Value,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status code, when the failure came from the remote service
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Attempted URL, when the transport produced no response
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::NoResponse { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Result type alias for customerio-core
pub type Result<T> = std::result::Result<T, Error>;
