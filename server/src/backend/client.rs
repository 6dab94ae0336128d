//! Shared HTTP client for the backend service.

use super::{current_access_token, BackendError};
use crate::config::BackendConfig;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;

/// Base client: one connection pool, the project URL and the anon key.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    anon_key: String,
}

/// Error body returned by PostgREST and the auth service.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig, timeout: Duration) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    /// Start a request to `path` with the project headers set.
    ///
    /// The bearer token is the caller's access token when one is in scope,
    /// the anon key otherwise.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let token = current_access_token().unwrap_or_else(|| self.anon_key.clone());
        self.request_as(method, path, &token)
    }

    /// Start a request authenticated with an explicit token.
    pub fn request_as(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "backend request");
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }
}

/// Turn a non-success response into [`BackendError::Status`].
pub(crate) async fn check_status(resp: Response) -> Result<Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.message.or(b.msg).or(b.error_description).or(b.error))
        .unwrap_or_else(|| {
            if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                text
            }
        });

    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}
