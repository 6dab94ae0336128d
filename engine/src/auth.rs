//! Authentication guard for mutations.
//!
//! The engine never authenticates anyone itself. It asks an
//! [`AuthProvider`] for the current user and, under
//! [`AuthPolicy::RequireUser`], refuses every mutation without one.

use crate::{error::Result, Error};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default page an unauthenticated caller is sent to.
pub const DEFAULT_LOGIN_REDIRECT: &str = "/login";

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Error)]
#[error("auth check failed: {0}")]
pub struct AuthError(pub String);

/// Source of the current user.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_user(&self) -> std::result::Result<Option<User>, AuthError>;
}

/// Nobody is signed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

#[async_trait]
impl AuthProvider for Anonymous {
    async fn current_user(&self) -> std::result::Result<Option<User>, AuthError> {
        Ok(None)
    }
}

/// A fixed, already known user.
#[derive(Debug, Clone)]
pub struct SignedIn(pub User);

#[async_trait]
impl AuthProvider for SignedIn {
    async fn current_user(&self) -> std::result::Result<Option<User>, AuthError> {
        Ok(Some(self.0.clone()))
    }
}

/// Which mutations require a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPolicy {
    /// No check at all
    Open,
    /// Every mutation requires a user; otherwise redirect
    RequireUser { redirect_to: String },
}

impl Default for AuthPolicy {
    fn default() -> Self {
        AuthPolicy::RequireUser {
            redirect_to: DEFAULT_LOGIN_REDIRECT.to_string(),
        }
    }
}

impl AuthPolicy {
    pub fn require_user(redirect_to: impl Into<String>) -> Self {
        AuthPolicy::RequireUser {
            redirect_to: redirect_to.into(),
        }
    }

    /// Check the provider. A failing provider counts as signed out.
    pub async fn check(&self, auth: &dyn AuthProvider) -> Result<()> {
        let AuthPolicy::RequireUser { redirect_to } = self else {
            return Ok(());
        };

        match auth.current_user().await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(Error::Unauthenticated {
                redirect_to: redirect_to.clone(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "treating failed auth check as signed out");
                Err(Error::Unauthenticated {
                    redirect_to: redirect_to.clone(),
                })
            }
        }
    }
}
