//! REST handlers.

mod documents;
mod signing;
mod system;

pub use documents::{
    audit_trail, certificate, create_document, get_document, list_documents, org_audit_feed,
    remind_recipient, send_document, void_document,
};
pub use signing::{decline_signature, download, signing_room, submit_signature};
pub use system::health_check;

use crate::api::rest::state::AppState;
use axum::http::HeaderMap;
use signflow_engine::{Actor, RequestMeta};
use signflow_types::UserId;

/// Network origin of the request, for audit attribution.
fn request_meta(headers: &HeaderMap) -> RequestMeta {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    RequestMeta::new(ip_address, user_agent)
}

/// Resolve the acting user from the `x-user-id` header, falling back to
/// the system actor. Authentication itself sits in front of this service.
async fn request_actor(state: &AppState, headers: &HeaderMap) -> Actor {
    let Some(user_id) = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(UserId::new)
    else {
        return Actor::System;
    };
    match state.storage.get_user(&user_id).await {
        Ok(Some(user)) => Actor::from_user(&user),
        _ => Actor::System,
    }
}
