//! API router configuration.

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        // Documents (sender side)
        .route("/documents", get(handlers::list_documents))
        .route("/documents", post(handlers::create_document))
        .route("/documents/:id", get(handlers::get_document))
        .route("/documents/:id/send", post(handlers::send_document))
        .route("/documents/:id/void", post(handlers::void_document))
        .route(
            "/documents/:id/recipients/:recipient_id/remind",
            post(handlers::remind_recipient),
        )
        .route("/documents/:id/certificate", get(handlers::certificate))
        .route("/documents/:id/audit", get(handlers::audit_trail))
        .route(
            "/organizations/:id/audit",
            get(handlers::org_audit_feed),
        );

    // Public token-authenticated routes live outside the /api prefix so
    // emailed links stay short.
    Router::new()
        .route("/sign/:token", get(handlers::signing_room))
        .route("/sign/:token", post(handlers::submit_signature))
        .route("/sign/:token/decline", post(handlers::decline_signature))
        .route("/download/:token", get(handlers::download))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
