//! Remote service collaborator.
//!
//! A [`RemoteTable`] is one row-oriented table of a hosted backend. The store
//! treats every failure the same way: it falls back to the local tiers.
//! Rows come back untyped and are decoded by the store through its schema.

use crate::schema::SortOrder;
use crate::{Fields, RecordId};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use thiserror::Error;

/// Failure reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// One remote table.
#[async_trait]
pub trait RemoteTable: Send + Sync {
    /// All rows ordered by `order`, at most `limit` of them.
    async fn select(&self, order: &SortOrder, limit: usize) -> RemoteResult<Vec<Value>>;

    /// Insert one row and return it as stored, including its identifier.
    async fn insert(&self, fields: &Fields) -> RemoteResult<Value>;

    /// Update the row whose `id_column` equals `id` and return it as stored.
    async fn update(&self, id_column: &str, id: RecordId, fields: &Fields)
        -> RemoteResult<Value>;

    /// Delete the row whose `id_column` equals `id`.
    async fn delete(&self, id_column: &str, id: RecordId) -> RemoteResult<()>;
}

/// An in-process table with server-assigned serial identifiers.
///
/// Useful for running the stores without a backend and for exercising the
/// fallback paths: [`MemoryTable::fail_with`] makes every call fail.
#[derive(Debug)]
pub struct MemoryTable {
    id_column: String,
    state: Mutex<TableState>,
}

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<Value>,
    next_id: RecordId,
    failure: Option<String>,
    calls: usize,
}

impl MemoryTable {
    pub fn new(id_column: impl Into<String>) -> Self {
        Self {
            id_column: id_column.into(),
            state: Mutex::new(TableState {
                next_id: 1,
                ..TableState::default()
            }),
        }
    }

    /// Seed rows. Serial identifiers continue after the highest seeded one.
    pub fn with_rows(self, rows: Vec<Value>) -> Self {
        {
            let mut state = self.lock();
            let max = rows
                .iter()
                .filter_map(|r| r.get(&self.id_column).and_then(Value::as_i64))
                .max()
                .unwrap_or(0);
            state.next_id = state.next_id.max(max + 1);
            state.rows = rows;
        }
        self
    }

    /// Make every following call fail with `message`, or recover with `None`.
    pub fn fail_with(&self, message: Option<&str>) {
        self.lock().failure = message.map(str::to_string);
    }

    /// Current rows in insertion order.
    pub fn rows(&self) -> Vec<Value> {
        self.lock().rows.clone()
    }

    /// Whether a row with `id` exists.
    pub fn contains(&self, id: RecordId) -> bool {
        self.lock().rows.iter().any(|r| self.row_id(r) == Some(id))
    }

    /// Number of calls received, failed ones included.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TableState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self) -> RemoteResult<std::sync::MutexGuard<'_, TableState>> {
        let mut state = self.lock();
        state.calls += 1;
        if let Some(message) = state.failure.clone() {
            return Err(RemoteError::new(message));
        }
        Ok(state)
    }

    fn row_id(&self, row: &Value) -> Option<RecordId> {
        row.get(&self.id_column).and_then(Value::as_i64)
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl RemoteTable for MemoryTable {
    async fn select(&self, order: &SortOrder, limit: usize) -> RemoteResult<Vec<Value>> {
        let state = self.begin()?;
        let mut rows = state.rows.clone();
        rows.sort_by(|a, b| {
            let ord = compare(a.get(&order.column), b.get(&order.column));
            if order.ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        rows.truncate(limit);
        Ok(rows)
    }

    async fn insert(&self, fields: &Fields) -> RemoteResult<Value> {
        let mut state = self.begin()?;
        let id = state.next_id;
        state.next_id += 1;

        let mut row = fields.clone();
        row.insert(self.id_column.clone(), Value::from(id));
        let row = Value::Object(row);
        state.rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        id_column: &str,
        id: RecordId,
        fields: &Fields,
    ) -> RemoteResult<Value> {
        let mut state = self.begin()?;
        let row = state
            .rows
            .iter_mut()
            .find(|r| r.get(id_column).and_then(Value::as_i64) == Some(id))
            .ok_or_else(|| RemoteError::new(format!("no row with {id_column} = {id}")))?;

        if let Value::Object(map) = row {
            for (name, value) in fields {
                map.insert(name.clone(), value.clone());
            }
        }
        Ok(row.clone())
    }

    async fn delete(&self, id_column: &str, id: RecordId) -> RemoteResult<()> {
        let mut state = self.begin()?;
        state
            .rows
            .retain(|r| r.get(id_column).and_then(Value::as_i64) != Some(id));
        Ok(())
    }
}
