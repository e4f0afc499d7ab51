//! Login and logout flows.
//!
//! SYSTEM CONTEXT
//! ==============
//! The login page calls [`AuthService::login`] and then
//! [`AuthService::enter_dashboard`]; the logout button calls
//! [`AuthService::logout`]. Both navigate through the gate so the redirect
//! channel stays the only place that moves the browser.

use tracing::{info, warn};

use crate::net::api::ApiClient;
use crate::net::types::ApiError;

#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Exchange credentials, replace the stored session, and return the
    /// landing page for the user's primary role.
    ///
    /// # Errors
    ///
    /// Returns the exchange error (bad credentials arrive as
    /// [`ApiError::Unauthorized`]) or [`ApiError::Store`] when the session
    /// cannot be persisted. The previous session is untouched on exchange
    /// failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let username = username.trim();
        let session = match self.api.exchange_credentials(username, password).await {
            Ok(session) => session,
            Err(e) => {
                warn!(%username, error = %e, "login failed");
                return Err(e);
            }
        };

        let gate = self.api.gate();
        gate.store().save(&session)?;
        gate.channel().rearm();

        let primary = session.primary_role().unwrap_or(gate.config().fallback_role.as_str());
        let landing = gate.config().dashboard_for(primary).to_owned();
        info!(username = %session.user.username, role = %primary, %landing, "logged in");
        Ok(landing)
    }

    /// Navigate a logged-in user to their landing page.
    pub fn enter_dashboard(&self) -> bool {
        self.api.gate().enter_dashboard()
    }

    /// Clear the session and return to the login page.
    pub fn logout(&self) -> bool {
        self.api.gate().sign_out()
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
