use std::io;
use thiserror::Error;
use serde::{Serialize, Deserialize};

#[derive(Error, Debug, Serialize, Deserialize)]
pub enum GramtuiError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Anyhow error: {0}")]
    Anyhow(String),
}

/// Failures reported by the remote collaborator (or refused before a request
/// leaves the client).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    #[error("Not authorized, please log in")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Remote failure: {0}")]
    Remote(String),
}

impl From<io::Error> for GramtuiError {
    fn from(err: io::Error) -> Self {
        GramtuiError::Io(err.to_string())
    }
}

impl From<anyhow::Error> for GramtuiError {
    fn from(err: anyhow::Error) -> Self {
        GramtuiError::Anyhow(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Remote(err.to_string())
    }
}
