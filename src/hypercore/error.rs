//! HyperCore API errors
//!
//! A single error type shared by every client operation. HTTP status codes are
//! folded into it by [`Error::from_status`] so callers can match on the kind
//! of failure instead of inspecting raw responses.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by HyperCore client operations
#[derive(Error, Debug)]
pub enum Error {
    /// Credentials were rejected, or a session is no longer valid
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The cluster reported an internal error
    #[error("the cluster reported an internal error: {0}")]
    Server(String),

    /// A name, uuid, LAN IP or tag did not resolve to anything
    #[error("not found: {0}")]
    NotFound(String),

    /// A bulk selector (such as a tag) matched no virtual machines
    #[error("no virtual machines matched: {0}")]
    EmptyResult(String),

    /// A selector, method or kind string was not recognised
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A task did not reach a terminal state before the deadline
    #[error("task {tag} did not finish within {}s", .timeout.as_secs())]
    Timeout { tag: String, timeout: Duration },

    /// Any other non-success HTTP status
    #[error("API request failed: {status}")]
    Api { status: StatusCode },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

impl Error {
    /// Map a non-success HTTP status onto the error taxonomy
    pub fn from_status(status: StatusCode, what: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Authentication(what.to_string()),
            StatusCode::NOT_FOUND => Self::NotFound(what.to_string()),
            StatusCode::INTERNAL_SERVER_ERROR => Self::Server(what.to_string()),
            status => Self::Api { status },
        }
    }
}

/// Result alias for HyperCore client operations
pub type Result<T> = std::result::Result<T, Error>;
