//! Outbound request policy: bearer attachment and session-rejection handling.
//!
//! The interceptor is transport-agnostic. The HTTP client asks it for the
//! `Authorization` value before sending and reports every response status
//! after receiving. A 401/403 from an API path is forwarded to the gate,
//! whose logout latch turns any number of concurrent rejections into one
//! redirect.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::gate::AccessGate;

use super::types::is_session_rejection;

#[derive(Clone)]
pub struct Interceptor {
    gate: Arc<AccessGate>,
    base_url: String,
    api_prefix: String,
    login_endpoint: String,
}

impl Interceptor {
    #[must_use]
    pub fn new(gate: Arc<AccessGate>, config: &ApiConfig) -> Self {
        Self {
            gate,
            base_url: config.base_url.clone(),
            api_prefix: config.api_prefix.clone(),
            login_endpoint: config.login_endpoint.clone(),
        }
    }

    #[must_use]
    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// True when `url` (absolute, or a path on the API origin) targets the API.
    #[must_use]
    pub fn is_api_request(&self, url: &str) -> bool {
        let path = if url.starts_with('/') {
            url
        } else if let Some(rest) = url.strip_prefix(self.base_url.as_str()) {
            rest
        } else {
            return false;
        };
        path == self.api_prefix || path.starts_with(&format!("{}/", self.api_prefix))
    }

    fn is_login_request(&self, url: &str) -> bool {
        let path = url.strip_prefix(self.base_url.as_str()).unwrap_or(url);
        crate::routes::strip_query(path) == self.login_endpoint
    }

    /// `Authorization` header value for `url`, if any. The session is read
    /// fresh on every call.
    #[must_use]
    pub fn authorization(&self, url: &str) -> Option<String> {
        if !self.is_api_request(url) || self.is_login_request(url) {
            return None;
        }
        self.gate.oracle().token().map(|token| format!("Bearer {token}"))
    }

    /// Inspect a response status. Returns `true` when it was reported to the
    /// gate as a session rejection.
    pub fn observe(&self, url: &str, status: u16) -> bool {
        if !is_session_rejection(status) {
            return false;
        }
        if !self.is_api_request(url) || self.is_login_request(url) {
            debug!(%url, status, "rejection outside session scope ignored");
            return false;
        }
        warn!(%url, status, "backend rejected session");
        self.gate.session_revoked();
        true
    }
}

#[cfg(test)]
#[path = "interceptor_test.rs"]
mod tests;
