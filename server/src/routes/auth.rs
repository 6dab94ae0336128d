//! Account routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use storefront_engine::{AuthProvider, Error, User};

use crate::auth::Session;
use crate::error::{AppError, Result};
use crate::handlers::{handle_register, RegisterRequest, RegisterResponse};
use crate::AppState;

#[derive(Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// Create account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/user", get(user_handler))
}

/// POST /api/auth/register - Sign up with email and password.
async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let response = handle_register(
        state.auth(),
        state.config.signup_redirect.as_deref(),
        request,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/auth/user - The signed-in user, or 401 with the login redirect.
async fn user_handler(State(state): State<AppState>, session: Session) -> Result<Json<UserResponse>> {
    let user = session
        .provider(state.auth())
        .current_user()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    match user {
        Some(user) => Ok(Json(UserResponse { user })),
        None => Err(Error::Unauthenticated {
            redirect_to: state.config.login_redirect.clone(),
        }
        .into()),
    }
}
