//! Local snapshot of a resource list.
//!
//! The snapshot is the fallback cache kept in local storage: a JSON array of
//! flat row objects, in list order, stored under the collection name. A
//! missing or unreadable snapshot is never fatal; the store treats it as an
//! empty list.

use crate::local::LocalStorage;
use crate::{error::Result, Error, Record, ResourceSchema};
use serde_json::Value;

/// A point-in-time copy of one resource list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub records: Vec<Record>,
}

impl Snapshot {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Serialize to a JSON array of rows.
    pub fn to_json(&self, schema: &ResourceSchema) -> String {
        let rows: Vec<Value> = self
            .records
            .iter()
            .map(|r| r.to_row(&schema.id_column))
            .collect();
        Value::Array(rows).to_string()
    }

    /// Deserialize from a JSON array of rows.
    ///
    /// One malformed row makes the whole snapshot invalid.
    pub fn from_json(json: &str, schema: &ResourceSchema) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| Error::PersistenceRead(e.to_string()))?;

        let Value::Array(rows) = value else {
            return Err(Error::PersistenceRead(
                "snapshot is not a JSON array".to_string(),
            ));
        };

        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                schema
                    .decode_row(row)
                    .map_err(|e| Error::PersistenceRead(format!("row {i}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { records })
    }

    /// Read the snapshot for `schema` from storage.
    ///
    /// Returns `None` when nothing usable is stored. Read and parse failures
    /// are logged, never returned.
    pub fn read(storage: &dyn LocalStorage, schema: &ResourceSchema) -> Option<Self> {
        let raw = match storage.get(&schema.name) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(resource = %schema.name, error = %e, "failed to read local snapshot");
                return None;
            }
        };

        match Self::from_json(&raw, schema) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(resource = %schema.name, error = %e, "ignoring corrupt local snapshot");
                None
            }
        }
    }

    /// Write the snapshot for `schema` to storage. Failures are logged.
    pub fn write(&self, storage: &dyn LocalStorage, schema: &ResourceSchema) {
        let json = self.to_json(schema);
        if let Err(e) = storage.set(&schema.name, &json) {
            tracing::warn!(resource = %schema.name, error = %e, "failed to write local snapshot");
        }
    }
}
