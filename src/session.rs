//! Session model and the oracle that answers questions about it.
//!
//! DESIGN
//! ======
//! A session is valid only when a token and a user with at least one role are
//! both stored. The oracle re-reads the credential store on every question;
//! another tab may log out between two page events, so nothing is cached.
//!
//! Older pages stored `{"role": "parent"}` instead of `{"roles": [...]}`. The
//! user record is normalized to a canonical `roles` list when it is decoded,
//! so no caller has to handle either the old shape or the old tag spelling.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::roles;
use crate::store::CredentialStore;

/// Top-level user record keys owned by [`User`] itself. A profile entry with
/// one of these names would not survive a save/load cycle.
pub const RESERVED_PROFILE_KEYS: &[&str] = &["username", "roles", "role"];

// =============================================================================
// DATA MODEL
// =============================================================================

/// Stored user profile. Fields other than `username`/`roles` (`nom`,
/// `prenom`, `matiere`, ...) are kept verbatim in `profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "UserRecord")]
pub struct User {
    pub username: String,
    /// Ordered role tags; the first is the primary role.
    pub roles: Vec<String>,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

/// Wire shape accepted when decoding a stored user.
#[derive(Deserialize)]
struct UserRecord {
    username: String,
    #[serde(default)]
    roles: Option<Vec<String>>,
    #[serde(default)]
    role: Option<String>,
    #[serde(flatten)]
    profile: Map<String, Value>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        let roles = match (record.roles, record.role) {
            (Some(roles), _) if !roles.is_empty() => roles,
            (_, Some(role)) if !role.is_empty() => vec![role],
            _ => Vec::new(),
        };
        Self { username: record.username, roles: roles::normalize_all(&roles), profile: record.profile }
    }
}

impl User {
    #[must_use]
    pub fn new(username: impl Into<String>, roles: Vec<String>) -> Self {
        Self { username: username.into(), roles: roles::normalize_all(&roles), profile: Map::new() }
    }

    /// First profile key that collides with a user record field, if any.
    #[must_use]
    pub fn reserved_profile_key(&self) -> Option<&str> {
        RESERVED_PROFILE_KEYS.iter().copied().find(|key| self.profile.contains_key(*key))
    }

    /// Display name from the `prenom`/`nom` profile fields, else the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let field = |key: &str| self.profile.get(key).and_then(Value::as_str).unwrap_or("").trim();
        let full = format!("{} {}", field("prenom"), field("nom"));
        let full = full.trim();
        if full.is_empty() { self.username.clone() } else { full.to_owned() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.token.is_empty() && !self.user.roles.is_empty()
    }

    /// First role tag, if the user has any.
    #[must_use]
    pub fn primary_role(&self) -> Option<&str> {
        self.user.roles.first().map(String::as_str)
    }

    /// Exact-match test of `candidates` against the user's roles.
    #[must_use]
    pub fn has_any_role<S: AsRef<str>>(&self, candidates: &[S]) -> bool {
        candidates
            .iter()
            .any(|c| self.user.roles.iter().any(|r| r == c.as_ref()))
    }
}

// =============================================================================
// SESSION ORACLE
// =============================================================================

#[derive(Clone)]
pub struct SessionOracle {
    store: CredentialStore,
    fallback_role: String,
}

impl SessionOracle {
    #[must_use]
    pub fn new(store: CredentialStore, fallback_role: impl Into<String>) -> Self {
        Self { store, fallback_role: fallback_role.into() }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.session().is_some()
    }

    /// One consistent read of the stored session, when it is valid. Callers
    /// that make several decisions about the same page use this snapshot so a
    /// logout in another tab cannot land between them.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.store.load().filter(Session::is_valid)
    }

    /// First role of the stored user, or the fallback role when there is no
    /// session or the user has no roles.
    #[must_use]
    pub fn primary_role(&self) -> String {
        self.store
            .load()
            .and_then(|s| s.primary_role().map(str::to_owned))
            .unwrap_or_else(|| self.fallback_role.clone())
    }

    /// Exact-match test of `candidates` against the stored roles. Callers
    /// normalize tags first (see [`crate::roles::normalize`]).
    #[must_use]
    pub fn has_any_role<S: AsRef<str>>(&self, candidates: &[S]) -> bool {
        self.store.load().is_some_and(|s| s.has_any_role(candidates))
    }

    /// The stored user when the session is valid.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.session().map(|s| s.user)
    }

    /// Bearer token of a valid session.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session().map(|s| s.token)
    }

    #[must_use]
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
