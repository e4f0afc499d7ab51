//! Browser bindings: `localStorage`, `window.location`, page declarations.
//!
//! Requires the `hydrate` feature. A page wires the gate once, before any of
//! its own scripts run:
//!
//! ```ignore
//! let gate = browser::gate(GateConfig::default());
//! if browser::guard_current_page(&gate) != AccessState::Allowed {
//!     return; // navigation already issued
//! }
//! let api = browser::api_client(gate.clone())?;
//! ```
//!
//! Pages declare their roles on the body element:
//! `<body data-required-roles="ENSEIGNANT, ADMIN">`.

use std::sync::Arc;

use tracing::warn;

use crate::config::{ApiConfig, GateConfig};
use crate::gate::{AccessGate, AccessState, PageContext};
use crate::net::api::ApiClient;
use crate::net::types::ApiError;
use crate::redirect::Navigator;
use crate::roles;
use crate::store::{Storage, StoreError};

const REQUIRED_ROLES_ATTR: &str = "data-required-roles";

// =============================================================================
// STORAGE
// =============================================================================

/// `window.localStorage`, shared by every tab of the origin.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

fn local_storage() -> Result<web_sys::Storage, StoreError> {
    let window = web_sys::window().ok_or_else(|| StoreError::Backend("no window".to_owned()))?;
    window
        .local_storage()
        .map_err(|e| StoreError::Backend(format!("{e:?}")))?
        .ok_or_else(|| StoreError::Backend("localStorage unavailable".to_owned()))
}

impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        local_storage()?
            .get_item(key)
            .map_err(|e| StoreError::Backend(format!("{e:?}")))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        local_storage()?
            .set_item(key, value)
            .map_err(|e| StoreError::Backend(format!("{e:?}")))
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        local_storage()?
            .remove_item(key)
            .map_err(|e| StoreError::Backend(format!("{e:?}")))
    }
}

// =============================================================================
// NAVIGATION
// =============================================================================

/// `window.location`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocationNavigator;

impl Navigator for LocationNavigator {
    fn current_path(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_default()
    }

    fn assign(&self, path: &str) {
        let Some(window) = web_sys::window() else {
            warn!(%path, "no window; navigation skipped");
            return;
        };
        if let Err(e) = window.location().set_href(path) {
            warn!(%path, error = ?e, "navigation failed");
        }
    }
}

// =============================================================================
// PAGE WIRING
// =============================================================================

/// Build the page's gate over `localStorage` and `window.location`.
#[must_use]
pub fn gate(config: GateConfig) -> Arc<AccessGate> {
    Arc::new(AccessGate::new(config, Arc::new(LocalStorage), Arc::new(LocationNavigator)))
}

/// Current path plus the roles declared on `<body>`, if any.
#[must_use]
pub fn page_context() -> PageContext {
    let page = PageContext::new(LocationNavigator.current_path());
    let declared = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
        .and_then(|body| body.get_attribute(REQUIRED_ROLES_ATTR));
    match declared {
        Some(raw) => page.requiring(&roles::parse_declaration(&raw)),
        None => page,
    }
}

/// Run the gate for the page being loaded. Call at the earliest point the
/// DOM is queryable; anything but `Allowed` means a redirect is under way.
pub fn guard_current_page(gate: &AccessGate) -> AccessState {
    gate.check(&page_context())
}

/// API client for the page's own origin.
///
/// # Errors
///
/// Returns [`ApiError::ClientBuild`] if the origin cannot be read or the
/// client cannot be built.
pub fn api_client(gate: Arc<AccessGate>) -> Result<ApiClient, ApiError> {
    let origin = web_sys::window()
        .ok_or_else(|| ApiError::ClientBuild("no window".to_owned()))?
        .location()
        .origin()
        .map_err(|e| ApiError::ClientBuild(format!("{e:?}")))?;
    ApiClient::new(ApiConfig::with_base_url(&origin), gate)
}
