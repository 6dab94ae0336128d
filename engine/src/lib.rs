//! # Storefront Engine
//!
//! Sync and fallback logic for the storefront's resource lists.
//!
//! Each resource (customers, orders, products, vendors, VIP customers) is a
//! [`ResourceStore`]: an in-memory list kept in sync with two tiers.
//!
//! - A remote table ([`RemoteTable`]) on a hosted backend, the source of truth
//!   when it answers.
//! - A local snapshot ([`LocalStorage`]) that serves as the fallback cache.
//!
//! Every mutation tries the remote table first and degrades to local-only
//! when the table is missing or failing. The caller always learns which
//! tier was reached through a [`Notice`].
//!
//! ## Design Principles
//!
//! - **No IO**: the engine talks to collaborators through traits; HTTP and
//!   files live in the server crate
//! - **Never lose a change**: a failed remote call still updates the list
//!   and the snapshot
//! - **Testable**: in-memory collaborators ship with the crate
//!
//! ## Quick Start
//!
//! ```rust
//! use storefront_engine::{
//!     resources, LoadSource, MemoryStorage, ResourceStore, SignedIn, Tier, User,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! // 1. A store with no backend configured
//! let storage = Arc::new(MemoryStorage::new());
//! let mut store = ResourceStore::new(resources::customers(), storage);
//!
//! // 2. Load before mutating
//! let report = store.load().await;
//! assert_eq!(report.source, LoadSource::Empty);
//!
//! // 3. Create a record as a signed-in user
//! let user = SignedIn(User { id: "u-1".into(), email: None });
//! let input = json!({"name": "Alice", "email": "alice@example.com"});
//! let outcome = store
//!     .create(&user, input.as_object().cloned().unwrap())
//!     .await
//!     .unwrap();
//!
//! assert!(matches!(outcome.notice.tier, Tier::LocalOnly(_)));
//! assert_eq!(store.len(), 1);
//! # }
//! ```

pub mod auth;
pub mod clock;
pub mod error;
pub mod local;
pub mod notice;
pub mod reconcile;
pub mod record;
pub mod remote;
pub mod resources;
pub mod schema;
pub mod snapshot;
pub mod store;

// Re-export main types at crate root
pub use auth::{Anonymous, AuthError, AuthPolicy, AuthProvider, SignedIn, User};
pub use clock::{FixedClock, IdClock, SystemClock, TimeSource};
pub use error::{Error, FieldError, ValidationErrors};
pub use local::{LocalStorage, MemoryStorage, StorageError};
pub use notice::{DegradeReason, Deletion, Notice, OpKind, Outcome, Severity, Tier};
pub use record::Record;
pub use remote::{MemoryTable, RemoteError, RemoteResult, RemoteTable};
pub use schema::{FieldDef, FieldType, Placement, ResourceSchema, Rule, SortOrder};
pub use snapshot::Snapshot;
pub use store::{Confirm, LoadReport, LoadSource, LoadState, ResourceStore};

/// Type aliases for clarity
pub type RecordId = i64;
pub type CollectionName = String;
/// Milliseconds since the Unix epoch
pub type Timestamp = i64;
/// Field values of a record, without its identifier
pub type Fields = serde_json::Map<String, serde_json::Value>;
