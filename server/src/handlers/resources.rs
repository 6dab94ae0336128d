//! Resource handlers - drive one store per request.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront_engine::{
    AuthProvider, Deletion, Fields, LoadReport, Notice, OpKind, Outcome, Record, RecordId,
    ResourceStore, Severity,
};
use tokio::sync::Mutex;

/// Response for list and reload requests.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub resource: String,
    /// Rows in display order, identifier under the resource's id column
    pub records: Vec<Value>,
    pub loaded: bool,
    pub last_load: Option<LoadReport>,
}

/// The notice shown after a mutation.
#[derive(Debug, Serialize)]
pub struct NoticeBody {
    pub kind: OpKind,
    pub severity: Severity,
    pub degraded: bool,
    pub message: String,
}

impl From<&Notice> for NoticeBody {
    fn from(notice: &Notice) -> Self {
        Self {
            kind: notice.kind,
            severity: notice.severity(),
            degraded: notice.is_degraded(),
            message: notice.message(),
        }
    }
}

/// Response for create, update and delete.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub record: Value,
    pub notice: NoticeBody,
}

impl MutationResponse {
    fn new(store: &ResourceStore, outcome: &Outcome<Record>) -> Self {
        Self {
            record: outcome.value.to_row(&store.schema().id_column),
            notice: NoticeBody::from(&outcome.notice),
        }
    }
}

/// Query string of a delete request.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    /// The caller's answer to the confirmation prompt
    #[serde(default)]
    pub confirm: bool,
}

fn list_response(store: &ResourceStore) -> ListResponse {
    let id_column = &store.schema().id_column;
    ListResponse {
        resource: store.name().to_string(),
        records: store.records().iter().map(|r| r.to_row(id_column)).collect(),
        loaded: store.is_loaded(),
        last_load: store.last_load().cloned(),
    }
}

/// Current list of a resource.
pub async fn list_records(store: &Mutex<ResourceStore>) -> ListResponse {
    let store = store.lock().await;
    list_response(&store)
}

/// Re-run the load and return the fresh list.
pub async fn reload_records(store: &Mutex<ResourceStore>) -> ListResponse {
    let mut store = store.lock().await;
    store.load().await;
    list_response(&store)
}

pub async fn create_record(
    store: &Mutex<ResourceStore>,
    auth: &dyn AuthProvider,
    input: Fields,
) -> Result<MutationResponse> {
    let mut store = store.lock().await;
    let outcome = store.create(auth, input).await?;
    Ok(MutationResponse::new(&store, &outcome))
}

pub async fn update_record(
    store: &Mutex<ResourceStore>,
    auth: &dyn AuthProvider,
    id: RecordId,
    input: Fields,
) -> Result<MutationResponse> {
    let mut store = store.lock().await;
    let outcome = store.update(auth, id, input).await?;
    Ok(MutationResponse::new(&store, &outcome))
}

/// Delete a record. An unconfirmed request changes nothing.
pub async fn delete_record(
    store: &Mutex<ResourceStore>,
    auth: &dyn AuthProvider,
    id: RecordId,
    query: DeleteQuery,
) -> Result<MutationResponse> {
    let mut store = store.lock().await;
    let confirmed = query.confirm;
    match store.delete(auth, id, |_: &str| confirmed).await? {
        Deletion::Removed(outcome) => Ok(MutationResponse::new(&store, &outcome)),
        Deletion::Cancelled => Err(AppError::DeletionNotConfirmed),
    }
}
