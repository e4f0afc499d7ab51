//! Access gate: the sole decision point for auth-driven navigation.
//!
//! ARCHITECTURE
//! ============
//! One gate per page load. [`AccessGate::check`] runs the state machine once:
//!
//! ```text
//! UNCHECKED -> ALLOWED             public page, or session ok
//!           -> DENIED_NO_SESSION   protected page, no valid session -> login
//!           -> DENIED_WRONG_ROLE   role mismatch -> primary role dashboard
//! ```
//!
//! Later calls return the recorded state. The gate never asks the redirect
//! channel to go to the page being shown; a wrong-role visitor whose own
//! dashboard is the current page is sent to the login page instead.
//!
//! Other components that need a forced navigation (the API client on 401/403,
//! the logout button, the login page) call the gate rather than the channel.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::config::GateConfig;
use crate::redirect::{Navigator, RedirectChannel};
use crate::roles;
use crate::routes::{RouteClassifier, RouteKind, final_segment, same_page};
use crate::session::SessionOracle;
use crate::store::{CredentialStore, Storage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    Unchecked,
    Allowed,
    DeniedNoSession,
    DeniedWrongRole,
}

/// The page being gated and the roles it declares, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub path: String,
    pub required_roles: Option<Vec<String>>,
}

impl PageContext {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), required_roles: None }
    }

    /// Declare the roles allowed on this page. Tags are normalized.
    #[must_use]
    pub fn requiring<S: AsRef<str>>(mut self, roles: &[S]) -> Self {
        self.required_roles = Some(roles::normalize_all(roles));
        self
    }
}

/// Outcome of evaluating a page, before any navigation happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub state: AccessState,
    pub redirect: Option<String>,
}

// =============================================================================
// ACCESS GATE
// =============================================================================

pub struct AccessGate {
    config: GateConfig,
    classifier: RouteClassifier,
    oracle: SessionOracle,
    channel: RedirectChannel,
    state: Mutex<AccessState>,
}

impl AccessGate {
    /// Wire a gate, its credential store, oracle and redirect channel over the
    /// given storage and navigator.
    #[must_use]
    pub fn new(config: GateConfig, storage: Arc<dyn Storage>, navigator: Arc<dyn Navigator>) -> Self {
        let store = CredentialStore::new(storage, &config);
        let channel = RedirectChannel::new(navigator, store.clone(), config.login_path.clone());
        let oracle = SessionOracle::new(store, config.fallback_role.clone());
        let classifier = RouteClassifier::new(&config.public_pages);
        Self { config, classifier, oracle, channel, state: Mutex::new(AccessState::Unchecked) }
    }

    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    #[must_use]
    pub fn oracle(&self) -> &SessionOracle {
        &self.oracle
    }

    #[must_use]
    pub fn store(&self) -> &CredentialStore {
        self.oracle.store()
    }

    #[must_use]
    pub fn channel(&self) -> &RedirectChannel {
        &self.channel
    }

    #[must_use]
    pub fn state(&self) -> AccessState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Roles the page requires: its own declaration if non-empty, else the
    /// configured table entry for its final path segment.
    #[must_use]
    pub fn required_roles(&self, page: &PageContext) -> Option<Vec<String>> {
        match &page.required_roles {
            Some(declared) if !declared.is_empty() => Some(declared.clone()),
            _ => self.config.page_roles.get(final_segment(&page.path)).cloned(),
        }
    }

    /// Decide what should happen on `page` without navigating. The session is
    /// read once; every rule sees the same snapshot.
    #[must_use]
    pub fn evaluate(&self, page: &PageContext) -> Verdict {
        if self.classifier.classify(&page.path) == RouteKind::Public {
            return Verdict { state: AccessState::Allowed, redirect: None };
        }

        let Some(session) = self.oracle.session() else {
            let redirect = destination(&self.config.login_path, &page.path);
            return Verdict { state: AccessState::DeniedNoSession, redirect };
        };

        if let Some(required) = self.required_roles(page) {
            if !session.has_any_role(&required) {
                let primary = session.primary_role().unwrap_or(self.config.fallback_role.as_str());
                let dashboard = self.config.dashboard_for(primary).to_owned();
                let redirect = if same_page(&dashboard, &page.path) {
                    destination(&self.config.login_path, &page.path)
                } else {
                    Some(dashboard)
                };
                return Verdict { state: AccessState::DeniedWrongRole, redirect };
            }
        }

        Verdict { state: AccessState::Allowed, redirect: None }
    }

    /// Evaluate `page` once and issue the resulting redirect, if any. Later
    /// calls return the first result and do nothing.
    pub fn check(&self, page: &PageContext) -> AccessState {
        let verdict = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != AccessState::Unchecked {
                return *state;
            }
            let verdict = self.evaluate(page);
            *state = verdict.state;
            verdict
        };

        debug!(path = %page.path, state = ?verdict.state, redirect = ?verdict.redirect, "page gated");
        if let Some(target) = &verdict.redirect {
            self.channel.go(target);
        }
        verdict.state
    }

    /// Gate the page the navigator is showing, using the configured role table.
    pub fn check_current_page(&self) -> AccessState {
        self.check(&PageContext::new(self.channel.current_path()))
    }

    /// The backend rejected the session (401/403). Clears it and goes to login
    /// once, however many requests report it.
    pub fn session_revoked(&self) -> bool {
        let first = self.channel.logout();
        if first {
            info!("session revoked by backend");
        }
        first
    }

    /// User-initiated logout.
    pub fn sign_out(&self) -> bool {
        self.channel.logout()
    }

    /// Send a freshly logged-in user to their role's landing page.
    pub fn enter_dashboard(&self) -> bool {
        match self.oracle.session() {
            Some(session) => {
                let primary = session.primary_role().unwrap_or(self.config.fallback_role.as_str());
                let target = self.config.dashboard_for(primary).to_owned();
                self.channel.go(&target)
            }
            None => self.channel.go(&self.config.login_path),
        }
    }
}

fn destination(target: &str, current: &str) -> Option<String> {
    if same_page(target, current) { None } else { Some(target.to_owned()) }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
