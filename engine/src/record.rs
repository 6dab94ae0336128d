//! Record type for one row of a resource list.

use crate::{Fields, RecordId};
use serde_json::Value;

/// A row of a resource list.
///
/// The identifier is kept apart from the other columns because its column
/// name differs between resources (`id`, `orders_id`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Unique identifier within the list
    pub id: RecordId,
    /// All other columns, scalar values only
    pub fields: Fields,
}

impl Record {
    /// Create a new record.
    pub fn new(id: RecordId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Get a column value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Overlay `fields` onto this record. The identifier never changes.
    pub fn merge(&mut self, fields: &Fields) {
        for (name, value) in fields {
            self.fields.insert(name.clone(), value.clone());
        }
    }

    /// Flatten into a row object with the identifier under `id_column`.
    pub fn to_row(&self, id_column: &str) -> Value {
        let mut row = self.fields.clone();
        row.insert(id_column.to_string(), Value::from(self.id));
        Value::Object(row)
    }

    /// Parse a flat row object.
    ///
    /// The row must be an object with an integer `id_column`, and every other
    /// value must be a scalar. Field types are checked by the schema, not here.
    pub fn from_row(row: Value, id_column: &str) -> Result<Self, String> {
        let Value::Object(mut fields) = row else {
            return Err("row is not an object".to_string());
        };

        let id = match fields.remove(id_column) {
            Some(value) => value
                .as_i64()
                .ok_or_else(|| format!("identifier '{id_column}' is not an integer"))?,
            None => return Err(format!("missing identifier '{id_column}'")),
        };

        if let Some((name, _)) = fields
            .iter()
            .find(|(_, v)| matches!(v, Value::Array(_) | Value::Object(_)))
        {
            return Err(format!("column '{name}' is not a scalar"));
        }

        Ok(Self { id, fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn create_record() {
        let record = Record::new(1, fields(json!({"name": "Alice"})));
        assert_eq!(record.id, 1);
        assert_eq!(record.get("name"), Some(&json!("Alice")));
        assert_eq!(record.get("email"), None);
    }

    #[test]
    fn merge_overlays_fields() {
        let mut record = Record::new(
            7,
            fields(json!({"customer_id": 3, "total": 120.5})),
        );
        record.merge(&fields(json!({"total": 999})));

        assert_eq!(record.id, 7);
        assert_eq!(record.get("customer_id"), Some(&json!(3)));
        assert_eq!(record.get("total"), Some(&json!(999)));
    }

    #[test]
    fn row_uses_custom_id_column() {
        let record = Record::new(5, fields(json!({"total": 10})));
        let row = record.to_row("orders_id");
        assert_eq!(row, json!({"orders_id": 5, "total": 10}));

        let parsed = Record::from_row(row, "orders_id").unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn from_row_rejects_malformed() {
        assert!(Record::from_row(json!([1, 2]), "id").is_err());
        assert!(Record::from_row(json!({"name": "x"}), "id").is_err());
        assert!(Record::from_row(json!({"id": "abc"}), "id").is_err());

        let err = Record::from_row(json!({"id": 1, "tags": ["a"]}), "id").unwrap_err();
        assert_eq!(err, "column 'tags' is not a scalar");
    }

    #[test]
    fn from_row_keeps_extra_scalars() {
        let row = json!({"id": 1, "name": "A", "created_at": "2024-01-01T00:00:00Z", "note": null});
        let record = Record::from_row(row, "id").unwrap();
        assert_eq!(record.fields.len(), 3);
        assert_eq!(record.get("note"), Some(&Value::Null));
    }
}
