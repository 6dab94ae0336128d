//! Storefront Server - back office API over the storefront's resource lists.
//!
//! Each of the five resources is served by one [`ResourceStore`] that syncs
//! with the hosted backend service when it is configured and reachable, and
//! falls back to a snapshot in the data directory otherwise.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod storage;

use crate::backend::{BackendClient, SupabaseAuth, SupabaseTable};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::storage::FileStorage;
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use storefront_engine::{resources, AuthPolicy, LocalStorage, ResourceStore};
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    stores: Arc<HashMap<String, Arc<Mutex<ResourceStore>>>>,
    auth: Option<SupabaseAuth>,
}

impl AppState {
    /// Build the stores with snapshots in the configured data directory.
    pub fn new(config: Config) -> Result<Self> {
        let storage = FileStorage::open(&config.data_dir)
            .map_err(|e| AppError::Internal(format!("cannot open data directory: {e}")))?;
        Self::with_storage(config, Arc::new(storage))
    }

    /// Build the stores over any local storage.
    ///
    /// With a backend configured every store gets a remote table and
    /// mutations require a signed-in user. Without one the stores run
    /// local-only and accept anonymous mutations.
    pub fn with_storage(config: Config, local: Arc<dyn LocalStorage>) -> Result<Self> {
        let client = match &config.backend {
            Some(backend) => Some(BackendClient::new(backend, config.request_timeout)?),
            None => None,
        };

        let policy = if client.is_some() {
            AuthPolicy::require_user(config.login_redirect.clone())
        } else {
            AuthPolicy::Open
        };

        let stores = resources::all()
            .into_iter()
            .map(|schema| {
                let name = schema.name.clone();
                let mut store = ResourceStore::new(schema, local.clone())
                    .with_auth_policy(policy.clone());
                if let Some(client) = &client {
                    store = store.with_remote(Arc::new(SupabaseTable::new(client.clone(), &name)));
                }
                (name, Arc::new(Mutex::new(store)))
            })
            .collect();

        Ok(Self {
            config: Arc::new(config),
            stores: Arc::new(stores),
            auth: client.map(SupabaseAuth::new),
        })
    }

    /// The store of `resource`.
    pub fn store(&self, resource: &str) -> Result<Arc<Mutex<ResourceStore>>> {
        self.stores
            .get(resource)
            .cloned()
            .ok_or_else(|| AppError::UnknownResource(resource.to_string()))
    }

    pub fn auth(&self) -> Option<&SupabaseAuth> {
        self.auth.as_ref()
    }

    /// Load every store once, with the anon key.
    pub async fn load_all(&self) {
        for name in resources::all().into_iter().map(|s| s.name) {
            if let Some(store) = self.stores.get(&name) {
                let report = store.lock().await.load().await;
                if let Some(error) = &report.remote_error {
                    tracing::warn!(resource = %name, %error, "backend unavailable at startup");
                }
            }
        }
    }
}

/// Build the application router with its middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}
