//! Session extraction.
//!
//! The caller's session is the access token issued by the backend's auth
//! service, sent as a Bearer token. A request without one is anonymous; the
//! stores decide whether that is allowed.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use storefront_engine::{AuthError, AuthProvider, User};

use crate::backend::SupabaseAuth;
use crate::AppState;

/// The caller's session, possibly anonymous.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.token.is_none()
    }

    /// Resolve this session's user through `auth`.
    pub fn provider(&self, auth: Option<&SupabaseAuth>) -> SessionAuth {
        SessionAuth {
            auth: auth.cloned(),
            token: self.token.clone(),
        }
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        match auth_header {
            Some(header) if header.starts_with("Bearer ") => {
                let token = header.trim_start_matches("Bearer ").trim().to_string();
                if token.is_empty() {
                    return Err((StatusCode::UNAUTHORIZED, "Empty bearer token"));
                }
                Ok(Session { token: Some(token) })
            }
            Some(_) => Err((
                StatusCode::UNAUTHORIZED,
                "Invalid authorization header format",
            )),
            None => Ok(Session::anonymous()),
        }
    }
}

/// [`AuthProvider`] backed by the auth service for one session.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    auth: Option<SupabaseAuth>,
    token: Option<String>,
}

#[async_trait]
impl AuthProvider for SessionAuth {
    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        let (Some(auth), Some(token)) = (&self.auth, &self.token) else {
            return Ok(None);
        };
        auth.user(token)
            .await
            .map_err(|e| AuthError(e.to_string()))
    }
}
