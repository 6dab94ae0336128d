//! Auth service client: session lookup and sign-up.

use super::client::check_status;
use super::{BackendClient, BackendError};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use storefront_engine::User;

/// Result of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUp {
    pub user: User,
    /// `false` when the service waits for the email link to be followed
    pub confirmed: bool,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<String>,
    #[serde(default)]
    confirmed_at: Option<String>,
}

impl AuthUser {
    fn into_sign_up(self) -> SignUp {
        let confirmed = self.email_confirmed_at.is_some() || self.confirmed_at.is_some();
        SignUp {
            user: User {
                id: self.id,
                email: self.email,
            },
            confirmed,
        }
    }
}

/// Client for the backend's auth endpoints.
#[derive(Debug, Clone)]
pub struct SupabaseAuth {
    client: BackendClient,
}

impl SupabaseAuth {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// The user owning `access_token`, or `None` for an invalid or expired
    /// token.
    pub async fn user(&self, access_token: &str) -> Result<Option<User>, BackendError> {
        let resp = self
            .client
            .request_as(Method::GET, "/auth/v1/user", access_token)
            .send()
            .await?;

        if matches!(
            resp.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        let user: AuthUser = check_status(resp).await?.json().await?;
        Ok(Some(User {
            id: user.id,
            email: user.email,
        }))
    }

    /// Register a new account.
    ///
    /// The username and full name default to the local part of the email.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<SignUp, BackendError> {
        let handle = email.split('@').next().unwrap_or(email);
        let body = json!({
            "email": email,
            "password": password,
            "data": {
                "username": handle,
                "full_name": handle,
            },
        });

        let mut request = self.client.request(Method::POST, "/auth/v1/signup");
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }

        let resp = check_status(request.json(&body).send().await?).await?;
        let value: Value = resp.json().await?;

        // With auto-confirm the service answers with a session wrapping the
        // user; otherwise with the bare user.
        let user = match value.get("user") {
            Some(user) if user.is_object() => user.clone(),
            _ => value,
        };
        let user: AuthUser =
            serde_json::from_value(user).map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(user.into_sign_up())
    }
}
