//! Register handler - creates an account with the auth service.

use crate::backend::{BackendError, SupabaseAuth};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use storefront_engine::{schema::is_valid_email, Error, User, ValidationErrors};

/// Shortest password the auth service accepts by default.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Response for registration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user: User,
    /// The account is usable only after the emailed link is followed
    pub confirmation_required: bool,
    pub message: String,
}

fn validate(request: &RegisterRequest) -> std::result::Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let email = request.email.trim();
    if email.is_empty() {
        errors.push("email", "is required");
    } else if !is_valid_email(email) {
        errors.push("email", "must be a valid email address");
    }

    if request.password.is_empty() {
        errors.push("password", "is required");
    } else if request.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Register a new account.
pub async fn handle_register(
    auth: Option<&SupabaseAuth>,
    signup_redirect: Option<&str>,
    request: RegisterRequest,
) -> Result<RegisterResponse> {
    validate(&request).map_err(Error::Validation)?;
    let auth = auth.ok_or(BackendError::Unconfigured)?;

    let sign_up = auth
        .sign_up(request.email.trim(), &request.password, signup_redirect)
        .await?;
    tracing::info!(user_id = %sign_up.user.id, confirmed = sign_up.confirmed, "registered account");

    let message = if sign_up.confirmed {
        "registration complete".to_string()
    } else {
        "registration complete, check your email to verify the account".to_string()
    };

    Ok(RegisterResponse {
        user: sign_up.user,
        confirmation_required: !sign_up.confirmed,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn validation_reports_each_field() {
        let errors = validate(&request("not-an-email", "123")).unwrap_err();
        assert_eq!(errors.for_field("email"), Some("must be a valid email address"));
        assert_eq!(
            errors.for_field("password"),
            Some("must be at least 6 characters")
        );

        let errors = validate(&request(" ", "")).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test]
    async fn register_without_backend_is_unconfigured() {
        let err = handle_register(None, None, request("a@x.com", "secret123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Backend(BackendError::Unconfigured)));
    }
}
