use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Opaque bearer token handed out by the login route.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep tokens out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Gate applied before a guarded request leaves the client.
///
/// The token itself is opaque here; the backend does the real verification.
/// This only refuses requests that could never be authorized: no token, or one
/// that cannot be sent as a bearer header value.
pub fn is_authenticated(credential: Option<&Credential>) -> Result<&Credential, ApiError> {
    match credential {
        Some(c) if !c.0.is_empty() && c.0.chars().all(|ch| ch.is_ascii_graphic()) => Ok(c),
        _ => Err(ApiError::Unauthorized),
    }
}
