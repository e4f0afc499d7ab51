//! REST client for the EcoleGest backend.
//!
//! Every request goes through the [`Interceptor`]: the bearer token is
//! attached on the way out and 401/403 responses are reported on the way
//! back. The client never retries; the caller gets the original failure as
//! an [`ApiError`] after the logout has been triggered.
//!
//! ERROR HANDLING
//! ==============
//! Non-success responses are decoded once into `ApiError::Unauthorized` or
//! `ApiError::Status`. Transport failures become `ApiError::Transport`.

use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::interceptor::Interceptor;
use super::types::{ApiError, LoginRequest, LoginResponse, decode_error};
use crate::config::ApiConfig;
use crate::gate::AccessGate;
use crate::session::Session;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    interceptor: Interceptor,
}

impl ApiClient {
    /// Build a client that reports session rejections to `gate`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: ApiConfig, gate: Arc<AccessGate>) -> Result<Self, ApiError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder
            .timeout(std::time::Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(std::time::Duration::from_secs(config.timeouts.connect_secs));
        let http = builder.build().map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        let interceptor = Interceptor::new(gate, &config);
        Ok(Self { http, config, interceptor })
    }

    #[must_use]
    pub fn gate(&self) -> &AccessGate {
        self.interceptor.gate()
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Absolute URL for a path on the API origin (`/api/eleves`).
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// `GET path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns any [`ApiError`]; 401/403 also logs the session out.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.execute(Method::GET, path, None::<&()>).await?;
        parse_body(&body)
    }

    /// `POST path` with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns any [`ApiError`]; 401/403 also logs the session out.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let text = self.execute(Method::POST, path, Some(body)).await?;
        parse_body(&text)
    }

    /// `PUT path` with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns any [`ApiError`]; 401/403 also logs the session out.
    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let text = self.execute(Method::PUT, path, Some(body)).await?;
        parse_body(&text)
    }

    /// `DELETE path`, ignoring any response body.
    ///
    /// # Errors
    ///
    /// Returns any [`ApiError`]; 401/403 also logs the session out.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    /// Exchange credentials for a session at the configured login endpoint.
    /// Does not store anything; see [`crate::auth::AuthService::login`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for rejected credentials (without
    /// logging anyone out), or [`ApiError::Decode`] for an unusable response.
    pub async fn exchange_credentials(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let path = self.config.login_endpoint.clone();
        let response: LoginResponse = self.post_json(&path, &LoginRequest { username, password }).await?;
        response.into_session()
    }

    async fn execute<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: Option<&B>) -> Result<String, ApiError> {
        let url = self.url(path);
        let mut request: RequestBuilder = self.http.request(method.clone(), url.as_str());
        if let Some(value) = self.interceptor.authorization(path) {
            request = request.header(AUTHORIZATION, value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        debug!(%method, %path, status, "api response");

        if (200..300).contains(&status) {
            return Ok(text);
        }
        self.interceptor.observe(path, status);
        Err(decode_error(status, &text))
    }
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
