//! Credential store: the only reader and writer of persisted session state.
//!
//! ARCHITECTURE
//! ============
//! Two storage keys hold the session: the raw bearer token and the user
//! profile as JSON. Storage access goes through the [`Storage`] trait so the
//! same store runs over browser `localStorage` (see `crate::browser`) and
//! over [`MemoryStorage`] natively.
//!
//! ERROR HANDLING
//! ==============
//! Reads never fail: backend errors and corrupt JSON degrade to "no session"
//! and the corrupt record is cleared. Only `save` reports errors, because the
//! login flow has to tell the user their session could not be stored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::config::GateConfig;
use crate::session::{Session, User};

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// The storage backend rejected the operation (quota, private mode, ...).
    #[error("storage backend failed: {0}")]
    Backend(String),

    /// The user profile could not be serialized.
    #[error("user serialization failed: {0}")]
    Serialize(String),
}

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Key/value string storage with the `localStorage` method set.
pub trait Storage: Send + Sync {
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the value cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the key cannot be removed.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local storage. Sharing one `Arc<MemoryStorage>` between several
/// stores models several tabs of the same origin.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items().remove(key);
        Ok(())
    }
}

// =============================================================================
// CREDENTIAL STORE
// =============================================================================

#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn Storage>,
    token_key: String,
    user_key: String,
}

impl CredentialStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, config: &GateConfig) -> Self {
        Self { storage, token_key: config.token_key.clone(), user_key: config.user_key.clone() }
    }

    /// Persist token and user together. On failure neither is left behind.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialize`] if the user cannot be encoded or its
    /// profile shadows a record field (`username`, `roles`, `role`), or
    /// [`StoreError::Backend`] if either write fails. Nothing is written in
    /// the `Serialize` case.
    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        if let Some(key) = session.user.reserved_profile_key() {
            return Err(StoreError::Serialize(format!("profile key {key:?} is reserved")));
        }
        let user_json = serde_json::to_string(&session.user).map_err(|e| StoreError::Serialize(e.to_string()))?;

        let written = self
            .storage
            .set_item(&self.user_key, &user_json)
            .and_then(|()| self.storage.set_item(&self.token_key, &session.token));
        if let Err(e) = written {
            warn!(error = %e, "session save failed; clearing partial state");
            self.clear();
            return Err(e);
        }
        debug!(username = %session.user.username, "session saved");
        Ok(())
    }

    /// Current session, or `None` when absent, partial, or corrupt.
    #[must_use]
    pub fn load(&self) -> Option<Session> {
        let user = match self.read(&self.user_key) {
            None => None,
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, key = %self.user_key, "corrupt user record; clearing session");
                    self.clear();
                    return None;
                }
            },
        };
        let token = self.read(&self.token_key).filter(|t| !t.is_empty());

        match (token, user) {
            (Some(token), Some(user)) => Some(Session { token, user }),
            (None, None) => None,
            (token, user) => {
                debug!(has_token = token.is_some(), has_user = user.is_some(), "partial session ignored");
                None
            }
        }
    }

    /// Remove token and user. Safe to call when nothing is stored.
    pub fn clear(&self) {
        for key in [&self.token_key, &self.user_key] {
            if let Err(e) = self.storage.remove_item(key) {
                warn!(error = %e, %key, "storage remove failed");
            }
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, %key, "storage read failed");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
