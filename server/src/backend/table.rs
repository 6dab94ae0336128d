//! PostgREST table client.

use super::client::check_status;
use super::{BackendClient, BackendError};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use storefront_engine::{Fields, RecordId, RemoteError, RemoteResult, RemoteTable, SortOrder};

/// One table of the backend service.
#[derive(Debug, Clone)]
pub struct SupabaseTable {
    client: BackendClient,
    table: String,
}

impl SupabaseTable {
    pub fn new(client: BackendClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn path(&self) -> String {
        format!("/rest/v1/{}", self.table)
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client.request(method, &self.path())
    }

    async fn rows(&self, request: RequestBuilder) -> Result<Vec<Value>, BackendError> {
        let resp = check_status(request.send().await?).await?;
        match resp.json::<Value>().await? {
            Value::Array(rows) => Ok(rows),
            other => Err(BackendError::Decode(format!(
                "expected an array of rows, got {other}"
            ))),
        }
    }

    /// The single row of a `return=representation` response.
    async fn returned_row(&self, request: RequestBuilder) -> Result<Value, BackendError> {
        self.rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode("no row returned".to_string()))
    }

    async fn fetch(&self, order: &SortOrder, limit: usize) -> Result<Vec<Value>, BackendError> {
        let direction = if order.ascending { "asc" } else { "desc" };
        let request = self.request(Method::GET).query(&[
            ("select", "*".to_string()),
            ("order", format!("{}.{direction}", order.column)),
            ("limit", limit.to_string()),
        ]);
        self.rows(request).await
    }

    async fn create(&self, fields: &Fields) -> Result<Value, BackendError> {
        let request = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .json(fields);
        self.returned_row(request).await
    }

    async fn patch(&self, id_column: &str, id: RecordId, fields: &Fields) -> Result<Value, BackendError> {
        let request = self
            .request(Method::PATCH)
            .query(&[(id_column, format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(fields);
        self.returned_row(request).await
    }

    async fn remove(&self, id_column: &str, id: RecordId) -> Result<(), BackendError> {
        let request = self
            .request(Method::DELETE)
            .query(&[(id_column, format!("eq.{id}"))]);
        check_status(request.send().await?).await?;
        Ok(())
    }
}

fn remote_error(table: &str, err: BackendError) -> RemoteError {
    tracing::debug!(table, error = %err, "backend call failed");
    RemoteError::new(err.to_string())
}

#[async_trait]
impl RemoteTable for SupabaseTable {
    async fn select(&self, order: &SortOrder, limit: usize) -> RemoteResult<Vec<Value>> {
        self.fetch(order, limit)
            .await
            .map_err(|e| remote_error(&self.table, e))
    }

    async fn insert(&self, fields: &Fields) -> RemoteResult<Value> {
        self.create(fields)
            .await
            .map_err(|e| remote_error(&self.table, e))
    }

    async fn update(
        &self,
        id_column: &str,
        id: RecordId,
        fields: &Fields,
    ) -> RemoteResult<Value> {
        self.patch(id_column, id, fields)
            .await
            .map_err(|e| remote_error(&self.table, e))
    }

    async fn delete(&self, id_column: &str, id: RecordId) -> RemoteResult<()> {
        self.remove(id_column, id)
            .await
            .map_err(|e| remote_error(&self.table, e))
    }
}
