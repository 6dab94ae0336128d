//! Resource schema definition and validation.
//!
//! A schema describes one resource list: its collection name, identifier
//! column, field definitions, and how the remote select is ordered. It
//! validates form input before any side effect and decodes untyped rows
//! coming from the remote service or the local snapshot.

use crate::error::ValidationErrors;
use crate::{CollectionName, Fields, Record, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Field types supported in schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Integer,
    Decimal,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Text => write!(f, "Text"),
            FieldType::Integer => write!(f, "Integer"),
            FieldType::Decimal => write!(f, "Decimal"),
        }
    }
}

impl FieldType {
    /// Whether a stored (already normalized) value has this type.
    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Text => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Decimal => value.is_number(),
        }
    }
}

/// Constraints checked on a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rule {
    /// Present and, for text, non-empty after trimming
    Required,
    /// `local@domain.tld` shape
    Email,
    /// Strictly greater than zero
    Positive,
    /// No other record in the list holds the same value (case-insensitive)
    Unique,
}

/// Definition of a field in a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: FieldType,
    /// Constraints, checked in order
    pub rules: Vec<Rule>,
}

impl FieldDef {
    /// Create an unconstrained field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            rules: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Decimal)
    }

    /// Builder-style method to add a rule.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
        self
    }

    pub fn required(self) -> Self {
        self.with_rule(Rule::Required)
    }

    pub fn email(self) -> Self {
        self.with_rule(Rule::Email)
    }

    pub fn positive(self) -> Self {
        self.with_rule(Rule::Positive)
    }

    pub fn unique(self) -> Self {
        self.with_rule(Rule::Unique)
    }

    pub fn is_required(&self) -> bool {
        self.rules.contains(&Rule::Required)
    }

    /// Convert submitted input into the stored representation.
    ///
    /// Text is trimmed. Numbers may arrive as JSON numbers or as numeric
    /// strings typed into a form; blank strings become null.
    pub fn normalize(&self, value: &Value) -> Result<Value, String> {
        match (self.field_type, value) {
            (_, Value::Null) => Ok(Value::Null),
            (_, Value::Array(_) | Value::Object(_)) => Err("must be a single value".into()),
            (FieldType::Text, Value::String(s)) => Ok(Value::String(s.trim().to_string())),
            (FieldType::Text, _) => Err("must be text".into()),
            (FieldType::Integer, Value::Number(n)) => integer_from(n),
            (FieldType::Integer, Value::String(s)) => match s.trim() {
                "" => Ok(Value::Null),
                t => t
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| "must be a whole number".to_string()),
            },
            (FieldType::Decimal, Value::Number(n)) => Ok(Value::Number(n.clone())),
            (FieldType::Decimal, Value::String(s)) => match s.trim() {
                "" => Ok(Value::Null),
                t => t
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| "must be a number".to_string()),
            },
            (FieldType::Integer, _) => Err("must be a whole number".into()),
            (FieldType::Decimal, _) => Err("must be a number".into()),
        }
    }

    /// Check the rules against a normalized value.
    ///
    /// `others` are the records the value must be unique against.
    fn check<'a>(
        &self,
        value: Option<&Value>,
        mut others: impl Iterator<Item = &'a Record>,
    ) -> Result<(), String> {
        let value = match value {
            Some(v) if !is_blank(v) => v,
            _ if self.is_required() => return Err("is required".into()),
            _ => return Ok(()),
        };

        for rule in &self.rules {
            match rule {
                Rule::Required => {}
                Rule::Email => {
                    if !value.as_str().is_some_and(is_valid_email) {
                        return Err("must be a valid email address".into());
                    }
                }
                Rule::Positive => {
                    if !value.as_f64().is_some_and(|n| n > 0.0) {
                        return Err("must be greater than zero".into());
                    }
                }
                Rule::Unique => {
                    if others.any(|r| r.get(&self.name).is_some_and(|v| same_value(v, value))) {
                        return Err("already exists".into());
                    }
                }
            }
        }
        Ok(())
    }
}

fn integer_from(n: &Number) -> Result<Value, String> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::from(i));
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Value::from(f as i64)),
        _ => Err("must be a whole number".into()),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => a == b,
    }
}

/// Email shape check: no whitespace, one `@` with a non-empty local part,
/// and a domain containing a dot with text on both sides.
pub fn is_valid_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "Integer",
        Value::Number(_) => "Decimal",
        Value::String(_) => "Text",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

/// Ordering of the remote select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOrder {
    pub column: String,
    pub ascending: bool,
}

impl SortOrder {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// Where newly created records go in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Newest first
    Prepend,
    /// Newest last
    Append,
}

/// Default number of rows fetched from the remote service.
pub const DEFAULT_LIMIT: usize = 100;

/// Schema for one resource list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSchema {
    /// Collection name, used as remote table name and snapshot key
    pub name: CollectionName,
    /// Column holding the identifier
    pub id_column: String,
    /// Field definitions
    pub fields: Vec<FieldDef>,
    /// Ordering of the remote select
    pub order: SortOrder,
    /// Maximum number of rows fetched on load
    pub limit: usize,
}

impl ResourceSchema {
    /// Create a schema with an `id` identifier, ordered by `id` descending.
    pub fn new(name: impl Into<CollectionName>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            id_column: "id".to_string(),
            fields,
            order: SortOrder::descending("id"),
            limit: DEFAULT_LIMIT,
        }
    }

    /// Use a different identifier column. The default ordering follows it.
    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        if self.order.column == self.id_column {
            self.order.column = column.clone();
        }
        self.id_column = column;
        self
    }

    pub fn ordered_by(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Get a field definition by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// New records follow the list ordering: descending lists show the
    /// newest first, ascending lists show it last.
    pub fn placement(&self) -> Placement {
        if self.order.ascending {
            Placement::Append
        } else {
            Placement::Prepend
        }
    }

    /// Validate input for a new record, returning the normalized fields.
    pub fn validate_create(
        &self,
        input: &Fields,
        existing: &[Record],
    ) -> Result<Fields, ValidationErrors> {
        self.validate(input, None, existing)
    }

    /// Validate input for an update of `current`.
    ///
    /// Fields left out of `input` keep their current value, which still has
    /// to satisfy the rules. Only the submitted fields are returned. Input
    /// with no fields at all is rejected.
    pub fn validate_update(
        &self,
        input: &Fields,
        current: &Record,
        existing: &[Record],
    ) -> Result<Fields, ValidationErrors> {
        if input.is_empty() {
            let mut errors = ValidationErrors::new();
            errors.push("input", "has no fields to update");
            return Err(errors);
        }
        self.validate(input, Some(current), existing)
    }

    fn validate(
        &self,
        input: &Fields,
        base: Option<&Record>,
        existing: &[Record],
    ) -> Result<Fields, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut normalized = Fields::new();

        for name in input.keys() {
            if *name == self.id_column {
                errors.push(name, "is assigned by the store");
            } else if self.field(name).is_none() {
                errors.push(name, "is not a known field");
            }
        }

        let exclude: Option<RecordId> = base.map(|r| r.id);
        for def in &self.fields {
            let candidate = match input.get(&def.name) {
                Some(raw) => match def.normalize(raw) {
                    Ok(value) => {
                        normalized.insert(def.name.clone(), value.clone());
                        Some(value)
                    }
                    Err(message) => {
                        errors.push(&def.name, message);
                        continue;
                    }
                },
                None => base.and_then(|r| r.get(&def.name)).cloned(),
            };

            let others = existing.iter().filter(|r| Some(r.id) != exclude);
            if let Err(message) = def.check(candidate.as_ref(), others) {
                errors.push(&def.name, message);
            }
        }

        if errors.is_empty() {
            Ok(normalized)
        } else {
            Err(errors)
        }
    }

    /// Decode an untyped row into a record.
    ///
    /// Declared fields must have their declared type when present; other
    /// scalar columns pass through untouched.
    pub fn decode_row(&self, row: Value) -> Result<Record, String> {
        let record = Record::from_row(row, &self.id_column)?;
        for def in &self.fields {
            if let Some(value) = record.get(&def.name) {
                if !value.is_null() && !def.field_type.accepts(value) {
                    return Err(format!(
                        "type mismatch for field '{}': expected {}, got {}",
                        def.name,
                        def.field_type,
                        json_type_name(value)
                    ));
                }
            }
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn test_schema() -> ResourceSchema {
        ResourceSchema::new(
            "people",
            vec![
                FieldDef::text("name").required(),
                FieldDef::text("email").required().email().unique(),
                FieldDef::integer("age").positive(),
            ],
        )
    }

    fn input(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn record(id: RecordId, value: Value) -> Record {
        Record::new(id, input(value))
    }

    #[test]
    fn validate_valid_input() {
        let schema = test_schema();
        let fields = schema
            .validate_create(&input(json!({"name": " Alice ", "email": "a@x.com"})), &[])
            .unwrap();
        assert_eq!(fields["name"], json!("Alice"));
        assert_eq!(fields["email"], json!("a@x.com"));
        assert!(!fields.contains_key("age"));
    }

    #[test]
    fn validate_reports_every_field() {
        let schema = test_schema();
        let errors = schema
            .validate_create(&input(json!({"name": "", "email": "bad"})), &[])
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.for_field("name"), Some("is required"));
        assert_eq!(
            errors.for_field("email"),
            Some("must be a valid email address")
        );
    }

    #[test]
    fn validate_missing_required_field() {
        let schema = test_schema();
        let errors = schema
            .validate_create(&input(json!({"name": "Bob"})), &[])
            .unwrap_err();
        assert_eq!(errors.for_field("email"), Some("is required"));
    }

    #[test]
    fn validate_numeric_strings() {
        let schema = test_schema();
        let fields = schema
            .validate_create(
                &input(json!({"name": "A", "email": "a@x.com", "age": " 31 "})),
                &[],
            )
            .unwrap();
        assert_eq!(fields["age"], json!(31));

        let errors = schema
            .validate_create(
                &input(json!({"name": "A", "email": "a@x.com", "age": "3.5"})),
                &[],
            )
            .unwrap_err();
        assert_eq!(errors.for_field("age"), Some("must be a whole number"));

        let errors = schema
            .validate_create(
                &input(json!({"name": "A", "email": "a@x.com", "age": -2})),
                &[],
            )
            .unwrap_err();
        assert_eq!(errors.for_field("age"), Some("must be greater than zero"));
    }

    #[test]
    fn validate_optional_blank_is_allowed() {
        let schema = test_schema();
        let fields = schema
            .validate_create(
                &input(json!({"name": "A", "email": "a@x.com", "age": ""})),
                &[],
            )
            .unwrap();
        assert_eq!(fields["age"], Value::Null);
    }

    #[test]
    fn validate_rejects_unknown_and_identifier_fields() {
        let schema = test_schema();
        let errors = schema
            .validate_create(
                &input(json!({"id": 9, "name": "A", "email": "a@x.com", "vip": true})),
                &[],
            )
            .unwrap_err();
        assert_eq!(errors.for_field("id"), Some("is assigned by the store"));
        assert_eq!(errors.for_field("vip"), Some("is not a known field"));
    }

    #[test]
    fn validate_unique_is_case_insensitive() {
        let schema = test_schema();
        let existing = vec![record(1, json!({"name": "A", "email": "A@X.com"}))];
        let errors = schema
            .validate_create(&input(json!({"name": "B", "email": "a@x.com"})), &existing)
            .unwrap_err();
        assert_eq!(errors.for_field("email"), Some("already exists"));
    }

    #[test]
    fn validate_update_uses_current_values() {
        let schema = test_schema();
        let current = record(1, json!({"name": "A", "email": "a@x.com"}));
        let existing = vec![current.clone()];

        // Partial input is fine, and the record does not collide with itself.
        let fields = schema
            .validate_update(&input(json!({"age": 40})), &current, &existing)
            .unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["age"], json!(40));

        let fields = schema
            .validate_update(&input(json!({"email": "A@x.com"})), &current, &existing)
            .unwrap();
        assert_eq!(fields["email"], json!("A@x.com"));

        let errors = schema
            .validate_update(&input(json!({"name": "  "})), &current, &existing)
            .unwrap_err();
        assert_eq!(errors.for_field("name"), Some("is required"));

        let errors = schema
            .validate_update(&Fields::new(), &current, &existing)
            .unwrap_err();
        assert_eq!(errors.for_field("input"), Some("has no fields to update"));
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("bad"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@x."));
        assert!(!is_valid_email("a@b@x.com"));
        assert!(!is_valid_email("a b@x.com"));
    }

    #[test]
    fn decode_row_checks_declared_types() {
        let schema = test_schema();
        let record = schema
            .decode_row(json!({"id": 3, "name": "A", "email": "a@x.com", "created_at": "now"}))
            .unwrap();
        assert_eq!(record.id, 3);

        let err = schema
            .decode_row(json!({"id": 3, "name": "A", "age": "old"}))
            .unwrap_err();
        assert_eq!(
            err,
            "type mismatch for field 'age': expected Integer, got Text"
        );
    }

    #[test]
    fn custom_id_column_moves_default_order() {
        let schema = ResourceSchema::new("orders", vec![]).with_id_column("orders_id");
        assert_eq!(schema.id_column, "orders_id");
        assert_eq!(schema.order, SortOrder::descending("orders_id"));
        assert_eq!(schema.placement(), Placement::Prepend);

        let schema = schema.ordered_by(SortOrder::ascending("created_at"));
        assert_eq!(schema.placement(), Placement::Append);
    }

    #[test]
    fn field_type_display() {
        assert_eq!(FieldType::Text.to_string(), "Text");
        assert_eq!(FieldType::Integer.to_string(), "Integer");
        assert_eq!(FieldType::Decimal.to_string(), "Decimal");
    }

    #[test]
    fn schema_serialization() {
        let schema = test_schema();
        let json = serde_json::to_string(&schema).unwrap();
        let parsed: ResourceSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, parsed);
    }

    proptest! {
        #[test]
        fn validation_never_panics(name in ".*", email in ".*", age in ".*") {
            let schema = test_schema();
            let _ = schema.validate_create(
                &input(json!({"name": name, "email": email, "age": age})),
                &[],
            );
        }

        #[test]
        fn accepted_decimals_are_positive(total in -1.0e6f64..1.0e6) {
            let def = FieldDef::decimal("total").required().positive();
            let schema = ResourceSchema::new("t", vec![def]);
            let result = schema.validate_create(&input(json!({"total": total.to_string()})), &[]);
            prop_assert_eq!(result.is_ok(), total > 0.0);
        }
    }
}
