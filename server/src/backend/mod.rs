//! Client for the hosted backend service (PostgREST tables and auth).

mod auth;
mod client;
mod table;

pub use auth::*;
pub use client::*;
pub use table::*;

use std::future::Future;

/// Backend service errors.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("remote service not configured")]
    Unconfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response, with the service's message when it sent one
    #[error("{status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

tokio::task_local! {
    static ACCESS_TOKEN: Option<String>;
}

/// Run `fut` with `token` as the caller's access token.
///
/// Backend calls made inside the future send it instead of the anon key.
pub async fn with_access_token<F>(token: Option<String>, fut: F) -> F::Output
where
    F: Future,
{
    ACCESS_TOKEN.scope(token, fut).await
}

pub(crate) fn current_access_token() -> Option<String> {
    ACCESS_TOKEN.try_with(Clone::clone).ok().flatten()
}
