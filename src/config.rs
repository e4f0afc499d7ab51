//! Gate configuration: storage keys, public pages, role dashboards.
//!
//! DESIGN
//! ======
//! `GateConfig::default()` carries the EcoleGest values. Pages that need a
//! different layout ship a JSON blob and load it with [`GateConfig::from_json`];
//! missing fields fall back to the defaults. [`GateConfig::validate`] rejects
//! layouts that would let the gate loop (a protected login page, or relative
//! targets that never compare equal to the browser's absolute pathname) or
//! strand a user (a fallback role without a dashboard).

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::routes::{RouteClassifier, RouteKind};

pub const DEFAULT_TOKEN_KEY: &str = "token";
pub const DEFAULT_USER_KEY: &str = "user";
pub const DEFAULT_LOGIN_PATH: &str = "/login.html";
pub const DEFAULT_FALLBACK_ROLE: &str = "ADMIN";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_API_PREFIX: &str = "/api";
pub const DEFAULT_LOGIN_ENDPOINT: &str = "/api/auth/login";
pub const DEFAULT_API_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_API_CONNECT_TIMEOUT_SECS: u64 = 10;

const DEFAULT_PUBLIC_PAGES: &[&str] =
    &["login.html", "register.html", "inscription.html", "test-api.html", "diagnostic.html"];

const DEFAULT_DASHBOARDS: &[(&str, &str)] = &[
    ("ADMIN", "/dashboard.html"),
    ("COMPTABLE", "/dashboard-comptable.html"),
    ("ENSEIGNANT", "/dashboard-enseignant.html"),
    ("PARENT", "/dashboard-parent.html"),
];

const DEFAULT_PAGE_ROLES: &[(&str, &[&str])] = &[
    ("dashboard.html", &["ADMIN"]),
    ("dashboard-comptable.html", &["COMPTABLE", "ADMIN"]),
    ("dashboard-enseignant.html", &["ENSEIGNANT"]),
    ("dashboard-parent.html", &["PARENT"]),
];

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The JSON blob could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),

    /// The login page is not on the public allow-list.
    #[error("login path {0} is not a public page")]
    LoginNotPublic(String),

    /// The fallback role has no dashboard entry.
    #[error("fallback role {0} has no dashboard")]
    MissingFallbackDashboard(String),

    /// A navigation target is not an absolute path.
    #[error("path {0} must start with '/'")]
    RelativePath(String),

    /// Storage keys are empty or collide.
    #[error("invalid storage keys: token={token:?} user={user:?}")]
    StorageKeys { token: String, user: String },
}

// =============================================================================
// GATE CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Storage key holding the bearer token.
    pub token_key: String,
    /// Storage key holding the serialized user profile.
    pub user_key: String,
    /// Where unauthenticated visitors are sent.
    pub login_path: String,
    /// Final path segments reachable without a session.
    pub public_pages: Vec<String>,
    /// Primary role tag -> landing page.
    pub dashboards: BTreeMap<String, String>,
    /// Role used when a session carries no usable role, and whose dashboard
    /// is the default for unrecognized roles.
    pub fallback_role: String,
    /// Final path segment -> roles allowed on that page, for pages that do not
    /// declare their own requirement.
    pub page_roles: BTreeMap<String, Vec<String>>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            token_key: DEFAULT_TOKEN_KEY.to_owned(),
            user_key: DEFAULT_USER_KEY.to_owned(),
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            public_pages: DEFAULT_PUBLIC_PAGES.iter().map(|p| (*p).to_owned()).collect(),
            dashboards: DEFAULT_DASHBOARDS
                .iter()
                .map(|(role, path)| ((*role).to_owned(), (*path).to_owned()))
                .collect(),
            fallback_role: DEFAULT_FALLBACK_ROLE.to_owned(),
            page_roles: DEFAULT_PAGE_ROLES
                .iter()
                .map(|(page, roles)| ((*page).to_owned(), roles.iter().map(|r| (*r).to_owned()).collect()))
                .collect(),
        }
    }
}

impl GateConfig {
    /// Parse and validate a JSON config blob. Absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, or any
    /// [`GateConfig::validate`] error.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the gate relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_key.is_empty() || self.user_key.is_empty() || self.token_key == self.user_key {
            return Err(ConfigError::StorageKeys { token: self.token_key.clone(), user: self.user_key.clone() });
        }
        if let Some(path) = std::iter::once(&self.login_path)
            .chain(self.dashboards.values())
            .find(|path| !path.starts_with('/'))
        {
            return Err(ConfigError::RelativePath(path.clone()));
        }
        if RouteClassifier::new(&self.public_pages).classify(&self.login_path) != RouteKind::Public {
            return Err(ConfigError::LoginNotPublic(self.login_path.clone()));
        }
        if !self.dashboards.contains_key(&self.fallback_role) {
            return Err(ConfigError::MissingFallbackDashboard(self.fallback_role.clone()));
        }
        Ok(())
    }

    /// Landing page for `role`, or the fallback role's page when unknown.
    #[must_use]
    pub fn dashboard_for(&self, role: &str) -> &str {
        self.dashboards
            .get(role)
            .or_else(|| self.dashboards.get(&self.fallback_role))
            .map_or(self.login_path.as_str(), String::as_str)
    }
}

// =============================================================================
// API CONFIG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Where the backend lives and how requests to it are shaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Scheme and authority, no trailing slash (`http://localhost:8080`).
    pub base_url: String,
    /// Path prefix of requests that carry the bearer token.
    pub api_prefix: String,
    /// Credential exchange endpoint. Its 401s mean "bad password", not
    /// "session expired".
    pub login_endpoint: String,
    pub timeouts: ApiTimeouts,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_API_BASE_URL)
    }
}

impl ApiConfig {
    /// Default layout against a specific origin.
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_prefix: DEFAULT_API_PREFIX.to_owned(),
            login_endpoint: DEFAULT_LOGIN_ENDPOINT.to_owned(),
            timeouts: ApiTimeouts {
                request_secs: DEFAULT_API_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_API_CONNECT_TIMEOUT_SECS,
            },
        }
    }

    /// Build from environment variables, for native hosts.
    ///
    /// Optional:
    /// - `ECOLEGEST_API_BASE_URL`: default `http://localhost:8080`
    /// - `ECOLEGEST_API_PREFIX`: default `/api`
    /// - `ECOLEGEST_LOGIN_ENDPOINT`: default `/api/auth/login`
    /// - `ECOLEGEST_API_TIMEOUT_SECS`: default 30
    /// - `ECOLEGEST_API_CONNECT_TIMEOUT_SECS`: default 10
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("ECOLEGEST_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned());
        let mut config = Self::with_base_url(&base_url);
        if let Ok(prefix) = std::env::var("ECOLEGEST_API_PREFIX") {
            config.api_prefix = prefix.trim_end_matches('/').to_owned();
        }
        if let Ok(endpoint) = std::env::var("ECOLEGEST_LOGIN_ENDPOINT") {
            config.login_endpoint = endpoint;
        }
        config.timeouts = ApiTimeouts {
            request_secs: env_parse_u64("ECOLEGEST_API_TIMEOUT_SECS", DEFAULT_API_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("ECOLEGEST_API_CONNECT_TIMEOUT_SECS", DEFAULT_API_CONNECT_TIMEOUT_SECS),
        };
        config
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
