//! Public (token-authenticated) signing and download handlers.

use super::request_meta;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use signflow_types::{Document, Field, FieldId, Recipient};
use std::collections::HashMap;

#[derive(Debug, Serialize)]
pub struct SigningRoomResponse {
    pub document: Document,
    pub recipient: Recipient,
    pub fields: Vec<Field>,
    pub participants: Vec<ParticipantBody>,
    pub pdf_url: Option<String>,
}

/// Progress line for the signing room sidebar. Deliberately excludes
/// email addresses: recipients should not see each other's contact data.
#[derive(Debug, Serialize)]
pub struct ParticipantBody {
    pub name: String,
    pub role: signflow_types::RecipientRole,
    pub status: signflow_types::RecipientStatus,
}

#[derive(Debug, Deserialize)]
pub struct SubmitPayload {
    #[serde(default)]
    pub values: HashMap<FieldId, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeclinePayload {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub document_completed: bool,
    pub notify_failures: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub filename: String,
    pub url: String,
    pub document_title: String,
}

/// Everything the signing room needs, authorized by the link token alone.
pub async fn signing_room(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<SigningRoomResponse>> {
    let meta = request_meta(&headers);
    let view = state.engine.sessions().signing_room(&token, &meta).await?;
    Ok(Json(SigningRoomResponse {
        participants: view
            .all_recipients
            .iter()
            .map(|r| ParticipantBody {
                name: r.name.clone(),
                role: r.role,
                status: r.status,
            })
            .collect(),
        pdf_url: view.pdf.map(|f| f.url),
        document: view.document,
        recipient: view.recipient,
        fields: view.fields,
    }))
}

/// Submit field values and the signature for the token's recipient.
pub async fn submit_signature(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<SubmitPayload>,
) -> ApiResult<Json<SubmitResponse>> {
    let meta = request_meta(&headers);
    let outcome = state
        .engine
        .signing()
        .submit_signature(&token, payload.values, &meta)
        .await?;
    Ok(Json(SubmitResponse {
        document_completed: outcome.document_completed,
        notify_failures: outcome.notify_failures.into_iter().map(|f| f.email).collect(),
    }))
}

/// Decline to sign on behalf of the token's recipient.
pub async fn decline_signature(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    payload: Option<Json<DeclinePayload>>,
) -> ApiResult<axum::http::StatusCode> {
    let meta = request_meta(&headers);
    let reason = payload.and_then(|Json(p)| p.reason);
    state
        .engine
        .signing()
        .decline_signature(&token, reason, &meta)
        .await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// Resolve a download token to the file reference to serve.
pub async fn download(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<DownloadResponse>> {
    let meta = request_meta(&headers);
    let grant = state
        .engine
        .documents()
        .download_document(&token, &meta)
        .await?;
    Ok(Json(DownloadResponse {
        filename: grant.file.filename,
        url: grant.file.url,
        document_title: grant.document.title,
    }))
}
