//! Storefront Server binary.

use storefront_server::config::Config;
use storefront_server::{build_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env first so RUST_LOG can come from it
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_server=debug,storefront_engine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting Storefront Server on {}:{}", config.host, config.port);
    match &config.backend {
        Some(backend) => tracing::info!("Backend service at {}", backend.url),
        None => tracing::warn!("No backend configured, running in local-only mode"),
    }
    tracing::info!("Local snapshots in {}", config.data_dir.display());

    let addr = format!("{}:{}", config.host, config.port);

    // Build application state and load every resource once
    let state = AppState::new(config)?;
    state.load_all().await;

    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
