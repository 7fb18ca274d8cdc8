//! Error types shared by the backend client and the action handlers.

use thiserror::Error;

/// Anything that turns a backend call into a `Failure` outcome.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed with status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid backend url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("cannot build endpoint from {0}")]
    Endpoint(String),
}

/// Rejections raised before any request is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("sign in required")]
    SignedOut,
    #[error("comment text is empty")]
    EmptyText,
    #[error("no video is bound to the overlay")]
    Unbound,
    #[error("unknown sort mode {0:?}")]
    UnknownSort(String),
}
