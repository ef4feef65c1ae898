//! HTTP client for a running snipshell server.
//!
//! Configuration is via environment variables:
//! - `SNIPSHELL_URL` - Base URL (default: `http://127.0.0.1:3000/api/v1`)

use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::SESSION_COOKIE;
use crate::config::ENV_URL;
use crate::models::{EvaluationRequest, EvaluationResult};

/// Default URL for local development.
const DEFAULT_URL: &str = "http://127.0.0.1:3000/api/v1";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// Client that keeps one server-side session across calls.
#[derive(Debug, Clone)]
pub struct EvalClient {
    base_url: String,
    session: Option<String>,
    client: Client,
}

impl EvalClient {
    /// Create client from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var(ENV_URL).unwrap_or_else(|_| DEFAULT_URL.to_string());
        Self::new(base_url)
    }

    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
            client: Client::new(),
        }
    }

    /// The session id the server assigned, once a request has been made.
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// Build a request carrying the session cookie, if any.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref id) = self.session {
            req = req.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, id));
        }
        req
    }

    /// Remember the session id from a `Set-Cookie` header.
    fn remember_session(&mut self, response: &reqwest::Response) {
        let prefix = format!("{}=", SESSION_COOKIE);
        let id = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .find_map(|pair| pair.trim().strip_prefix(prefix.as_str()));
        if let Some(id) = id {
            self.session = Some(id.to_string());
        }
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(status_error(status, response).await)
        }
    }

    // ============================================================
    // Evaluation
    // ============================================================

    /// Submit code and commands to the session.
    pub async fn eval(&mut self, code: &str) -> Result<EvaluationResult, ClientError> {
        let input = EvaluationRequest {
            code: code.to_string(),
        };
        let response = self
            .request(reqwest::Method::POST, "/go")
            .json(&input)
            .send()
            .await?;
        self.remember_session(&response);
        self.handle_response(response).await
    }

    /// End the session on the server.
    pub async fn end(&mut self) -> Result<(), ClientError> {
        if self.session.is_none() {
            return Ok(());
        }
        let response = self
            .request(reqwest::Method::DELETE, "/session")
            .send()
            .await?;
        self.session = None;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(status, response).await)
        }
    }
}

async fn status_error(status: StatusCode, response: reqwest::Response) -> ClientError {
    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(body),
        StatusCode::BAD_REQUEST => ClientError::BadRequest(body),
        _ => ClientError::Server(format!("{}: {}", status, body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = EvalClient::new("http://localhost:3000/api/v1/");
        assert_eq!(client.base_url, "http://localhost:3000/api/v1");
        assert!(client.session().is_none());
    }
}
