//! Error types for the storefront engine.

use crate::RecordId;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// All possible errors from a resource store.
///
/// Only `Validation`, `NotFound`, `Unauthenticated` and `NotLoaded` ever
/// escape a mutation; remote and persistence failures are absorbed by the
/// store and turned into degraded outcomes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Input errors
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("record not found: {0}")]
    NotFound(RecordId),

    // Remote tier
    #[error("remote service is not configured")]
    RemoteUnavailable,

    #[error("remote call failed: {0}")]
    RemoteCallFailed(String),

    // Local tier
    #[error("local snapshot unreadable: {0}")]
    PersistenceRead(String),

    // Store state
    #[error("authentication required, redirect to {redirect_to}")]
    Unauthenticated { redirect_to: String },

    #[error("store has not finished loading")]
    NotLoaded,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field error found while validating one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Record an error for `field`. Only the first error per field is kept.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        if self.for_field(&field).is_none() {
            self.0.push(FieldError {
                field,
                message: message.into(),
            });
        }
    }

    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}
