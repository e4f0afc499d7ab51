//! Networking modules for the backend REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `interceptor` holds the per-request auth policy, `api` is the HTTP client
//! that applies it, and `types` defines the error and login wire schema.

pub mod api;
pub mod interceptor;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
