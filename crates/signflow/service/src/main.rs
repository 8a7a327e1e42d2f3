//! SignFlow service entry point.
//!
//! Wires the engine to the in-memory storage adapter and the logging
//! notifier. A deployment with real Postgres/SMTP backends swaps the
//! adapters here; nothing else changes.

use signflow_engine::{NoopBlobFetcher, SignflowConfig, SignflowEngine};
use signflow_notify::LoggingNotifier;
use signflow_service::{create_router, AppState};
use signflow_storage::memory::InMemorySignflowStorage;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("SIGNFLOW_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let mut config = SignflowConfig::default();
    if let Ok(base_url) = std::env::var("SIGNFLOW_BASE_URL") {
        config = config.with_base_url(base_url);
    }
    if let Ok(days) = std::env::var("SIGNFLOW_TOKEN_EXPIRY_DAYS") {
        match days.parse() {
            Ok(days) => config = config.with_token_expiry_days(days),
            Err(_) => tracing::warn!(%days, "ignoring unparsable SIGNFLOW_TOKEN_EXPIRY_DAYS"),
        }
    }

    let storage = Arc::new(InMemorySignflowStorage::new());
    let engine = Arc::new(SignflowEngine::new(
        storage.clone(),
        Arc::new(LoggingNotifier::new()),
        Arc::new(NoopBlobFetcher::new()),
        config,
    ));
    let router = create_router(AppState::new(engine, storage));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "signflow service listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
