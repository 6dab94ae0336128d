//! Resource list routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use std::future::Future;
use storefront_engine::{Fields, RecordId};

use crate::auth::Session;
use crate::backend::with_access_token;
use crate::error::{AppError, Result};
use crate::handlers::{
    create_record, delete_record, list_records, reload_records, update_record, DeleteQuery,
    ListResponse, MutationResponse,
};
use crate::AppState;

/// Create resource routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/{resource}", get(list_handler).post(create_handler))
        .route("/api/{resource}/reload", post(reload_handler))
        .route(
            "/api/{resource}/{id}",
            put(update_handler).delete(delete_handler),
        )
}

/// Run `fut` on its own task with the caller's token in scope.
///
/// The task keeps going when the request is dropped, so a mutation that
/// reached the backend always lands in the list and the snapshot too.
async fn run_detached<F, T>(token: Option<String>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(with_access_token(token, fut))
        .await
        .map_err(|e| AppError::Internal(format!("store task failed: {e}")))?
}

/// GET /api/{resource} - Current list.
async fn list_handler(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Json<ListResponse>> {
    let store = state.store(&resource)?;
    Ok(Json(list_records(&store).await))
}

/// POST /api/{resource}/reload - Load again from the backend or the snapshot.
async fn reload_handler(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    session: Session,
) -> Result<Json<ListResponse>> {
    let store = state.store(&resource)?;
    let response =
        run_detached(session.token, async move { Ok(reload_records(&store).await) }).await?;
    Ok(Json(response))
}

/// POST /api/{resource} - Create a record.
async fn create_handler(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    session: Session,
    Json(input): Json<Fields>,
) -> Result<(StatusCode, Json<MutationResponse>)> {
    let store = state.store(&resource)?;
    let auth = session.provider(state.auth());
    let response = run_detached(session.token, async move {
        create_record(&store, &auth, input).await
    })
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// PUT /api/{resource}/{id} - Update the submitted fields of a record.
async fn update_handler(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, RecordId)>,
    session: Session,
    Json(input): Json<Fields>,
) -> Result<Json<MutationResponse>> {
    let store = state.store(&resource)?;
    let auth = session.provider(state.auth());
    let response = run_detached(session.token, async move {
        update_record(&store, &auth, id, input).await
    })
    .await?;
    Ok(Json(response))
}

/// DELETE /api/{resource}/{id}?confirm=true - Delete a record.
async fn delete_handler(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, RecordId)>,
    Query(query): Query<DeleteQuery>,
    session: Session,
) -> Result<Json<MutationResponse>> {
    let store = state.store(&resource)?;
    let auth = session.provider(state.auth());
    let response = run_detached(session.token, async move {
        delete_record(&store, &auth, id, query).await
    })
    .await?;
    Ok(Json(response))
}
