//! # ecolegest-gate
//!
//! Session and navigation guard for the EcoleGest school management frontend.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page load runs the [`gate::AccessGate`] once before any page script
//! renders user data. The gate reads the session through
//! [`session::SessionOracle`], which reads [`store::CredentialStore`], and it
//! navigates only through [`redirect::RedirectChannel`]. The outbound API
//! client in [`net::api`] attaches the bearer token and reports 401/403
//! responses back to the gate.
//!
//! Browser bindings (`localStorage`, `window.location`, page markup) live in
//! [`browser`] behind the `hydrate` feature. Everything else is plain Rust and
//! runs natively in tests.

pub mod auth;
#[cfg(feature = "hydrate")]
pub mod browser;
pub mod config;
pub mod gate;
pub mod net;
pub mod redirect;
pub mod roles;
pub mod routes;
pub mod session;
pub mod store;
