//! Wire types for the backend REST API.
//!
//! ERROR HANDLING
//! ==============
//! The backend reports failures as `{"message": ...}`, `{"error": ...}`, or a
//! plain-text/HTML body. [`decode_error`] sniffs that shape once, at the HTTP
//! boundary, and callers match on [`ApiError`] variants instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::{Session, User};
use crate::store::StoreError;

const MAX_ERROR_BODY_CHARS: usize = 200;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ApiError {
    /// 401/403 on an API call: the session is no longer accepted.
    #[error("session rejected (status {status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Any other non-success status.
    #[error("request failed (status {status}): {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// A success body did not match the expected schema.
    #[error("response parse failed: {0}")]
    Decode(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),

    /// Login succeeded but the session could not be persisted.
    #[error("session could not be stored: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// True for the statuses that invalidate a session.
#[must_use]
pub fn is_session_rejection(status: u16) -> bool {
    status == 401 || status == 403
}

/// Build the error for a non-success response.
#[must_use]
pub fn decode_error(status: u16, body: &str) -> ApiError {
    let message = error_message(body).unwrap_or_else(|| format!("HTTP {status}"));
    if is_session_rejection(status) {
        ApiError::Unauthorized { status, message }
    } else {
        ApiError::Status { status, message }
    }
}

fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => ["message", "error"]
            .iter()
            .filter_map(|key| value.get(key).and_then(Value::as_str))
            .map(str::trim)
            .find(|msg| !msg.is_empty())
            .map(str::to_owned),
        Err(_) => Some(body.chars().take(MAX_ERROR_BODY_CHARS).collect()),
    }
}

// =============================================================================
// LOGIN
// =============================================================================

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Login response. The backend either nests the profile under `user` or
/// returns it flattened next to the token; `accessToken` is accepted for
/// `token`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Nested {
        #[serde(alias = "accessToken")]
        token: String,
        user: User,
    },
    Flat {
        #[serde(alias = "accessToken")]
        token: String,
        #[serde(flatten)]
        user: User,
    },
}

impl LoginResponse {
    /// Session to store. Role tags were normalized when the user decoded.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] when the response carries no token or no
    /// usable role.
    pub fn into_session(self) -> Result<Session, ApiError> {
        let (token, mut user) = match self {
            Self::Nested { token, user } | Self::Flat { token, user } => (token, user),
        };
        // Transport metadata the flat shape drags along.
        user.profile.remove("type");
        user.profile.remove("tokenType");

        let session = Session { token, user };
        if !session.is_valid() {
            return Err(ApiError::Decode("login response carried no token or role".to_owned()));
        }
        Ok(session)
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
