//! Redirect channel: the single place that performs forced navigation.
//!
//! The channel decides *how* to navigate, never *whether*; that policy lives
//! in [`crate::gate`]. Two latches keep navigation single-shot per page
//! context:
//! - `navigated`: once a navigation is issued the page is going away, so later
//!   `go` calls are dropped instead of racing the first one.
//! - `logging_out`: concurrent 401/403 responses collapse into one logout.
//!
//! Both are reset by [`RedirectChannel::rearm`] after a successful login.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use crate::routes::same_page;
use crate::store::CredentialStore;

/// Browser location primitives.
pub trait Navigator: Send + Sync {
    /// Path of the page currently displayed.
    fn current_path(&self) -> String;

    /// Navigate to `path`.
    fn assign(&self, path: &str);
}

/// Navigator that records navigations instead of performing them. Used by
/// native hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    current: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    #[must_use]
    pub fn at(path: &str) -> Self {
        Self { current: Mutex::new(path.to_owned()), history: Mutex::new(Vec::new()) }
    }

    /// Every path passed to [`Navigator::assign`], in order.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn assign(&self, path: &str) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_owned());
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = path.to_owned();
    }
}

// =============================================================================
// REDIRECT CHANNEL
// =============================================================================

pub struct RedirectChannel {
    navigator: Arc<dyn Navigator>,
    store: CredentialStore,
    login_path: String,
    navigated: AtomicBool,
    logging_out: AtomicBool,
}

impl RedirectChannel {
    #[must_use]
    pub fn new(navigator: Arc<dyn Navigator>, store: CredentialStore, login_path: impl Into<String>) -> Self {
        Self {
            navigator,
            store,
            login_path: login_path.into(),
            navigated: AtomicBool::new(false),
            logging_out: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn current_path(&self) -> String {
        self.navigator.current_path()
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Navigate to `path` once. Returns `false` when suppressed: the target is
    /// the current page, or a navigation was already issued.
    pub fn go(&self, path: &str) -> bool {
        let current = self.navigator.current_path();
        if same_page(path, &current) {
            warn!(%path, "redirect to current page suppressed");
            return false;
        }
        if self.navigated.swap(true, Ordering::SeqCst) {
            warn!(%path, "navigation already issued; redirect dropped");
            return false;
        }
        info!(from = %current, to = %path, "redirecting");
        self.navigator.assign(path);
        true
    }

    /// Clear the session and go to the login page. Only the first call since
    /// the last [`rearm`](Self::rearm) has any effect.
    pub fn logout(&self) -> bool {
        if self.logging_out.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!("logging out");
        self.store.clear();
        self.go(&self.login_path);
        true
    }

    /// Re-enable navigation and logout after a fresh login.
    pub fn rearm(&self) {
        self.navigated.store(false, Ordering::SeqCst);
        self.logging_out.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "redirect_test.rs"]
mod tests;
