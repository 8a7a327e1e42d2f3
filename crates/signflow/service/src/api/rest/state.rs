//! Shared handler state.

use chrono::{DateTime, Utc};
use signflow_engine::SignflowEngine;
use signflow_storage::SignflowStorage;
use std::sync::Arc;

/// State handed to every handler. Mutations go through the engine; the
/// raw storage handle exists only for read endpoints (document detail,
/// listings).
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SignflowEngine>,
    pub storage: Arc<dyn SignflowStorage>,
    pub version: &'static str,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: Arc<SignflowEngine>, storage: Arc<dyn SignflowStorage>) -> Self {
        Self {
            engine,
            storage,
            version: env!("CARGO_PKG_VERSION"),
            started_at: Utc::now(),
        }
    }
}
