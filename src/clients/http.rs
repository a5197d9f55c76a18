//! Shared HTTP plumbing for the remote service clients.

use reqwest::{Client, Response};
use std::time::Duration;

use crate::error::{MelodyError, Result};

/// Longest error body kept in an error message.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Base URL and credential shared by all clients.
#[derive(Clone)]
pub struct ApiEndpoint {
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for ApiEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiEndpoint")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ApiEndpoint {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Joins `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Creates the HTTP client shared by all remote calls.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("melody-maker/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| MelodyError::invalid_config(format!("Failed to create HTTP client: {e}")))
}

/// Reads an error response body, capped for use in messages.
pub async fn error_body(response: Response) -> String {
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error body".to_string());

    if body.len() > MAX_ERROR_BODY_LEN {
        let mut end = MAX_ERROR_BODY_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &body[..end])
    } else {
        body
    }
}
