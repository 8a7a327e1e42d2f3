//! Sender-side document handlers.

use super::{request_actor, request_meta};
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use signflow_audit::Certificate;
use signflow_engine::DocumentDraft;
use signflow_storage::QueryWindow;
use signflow_types::{AuditEvent, Document, DocumentId, Field, OrganizationId, Recipient, RecipientId};

#[derive(Debug, Serialize)]
pub struct DocumentDetailResponse {
    pub document: Document,
    pub recipients: Vec<Recipient>,
    pub fields: Vec<Field>,
}

#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    pub organization_id: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub document: Document,
    pub notify_failures: Vec<NotifyFailureBody>,
}

#[derive(Debug, Serialize)]
pub struct NotifyFailureBody {
    pub email: String,
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct VoidPayload {
    pub reason: Option<String>,
}

fn default_limit() -> usize {
    50
}

/// Compose a document with its recipients, fields, and source PDF.
pub async fn create_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<DocumentDraft>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let actor = request_actor(&state, &headers).await;
    let meta = request_meta(&headers);
    let document = state
        .engine
        .documents()
        .create_document(draft, actor, &meta)
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

/// A document with its recipients and field placements.
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DocumentDetailResponse>> {
    let id = DocumentId::new(id);
    let document = state
        .storage
        .get_document(&id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("document {id}")))?;
    let recipients = state
        .storage
        .list_recipients(&id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let fields = state
        .storage
        .list_fields(&id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(DocumentDetailResponse {
        document,
        recipients,
        fields,
    }))
}

/// An organization's documents, newest first.
pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<ListDocumentsQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let documents = state
        .storage
        .list_documents(
            &OrganizationId::new(query.organization_id),
            QueryWindow {
                limit: query.limit,
                offset: query.offset,
            },
        )
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(documents))
}

/// Send (or resend) a document to its outstanding signers.
pub async fn send_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<SendResponse>> {
    let actor = request_actor(&state, &headers).await;
    let meta = request_meta(&headers);
    let outcome = state
        .engine
        .documents()
        .send_document(&DocumentId::new(id), actor, &meta)
        .await?;
    Ok(Json(SendResponse {
        document: outcome.document,
        notify_failures: outcome
            .notify_failures
            .into_iter()
            .map(|f| NotifyFailureBody {
                email: f.email,
                reason: f.reason,
            })
            .collect(),
    }))
}

/// Void a pending or draft document.
pub async fn void_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Option<Json<VoidPayload>>,
) -> ApiResult<Json<Document>> {
    let actor = request_actor(&state, &headers).await;
    let meta = request_meta(&headers);
    let reason = payload.and_then(|Json(p)| p.reason);
    let document = state
        .engine
        .documents()
        .void_document(&DocumentId::new(id), reason, actor, &meta)
        .await?;
    Ok(Json(document))
}

/// Manually remind one outstanding recipient.
pub async fn remind_recipient(
    State(state): State<AppState>,
    Path((id, recipient_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let actor = request_actor(&state, &headers).await;
    let meta = request_meta(&headers);
    state
        .engine
        .documents()
        .remind_recipient(
            &DocumentId::new(id),
            &RecipientId::new(recipient_id),
            actor,
            &meta,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The completion certificate for a completed document.
pub async fn certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Certificate>> {
    let certificate = state
        .engine
        .documents()
        .certificate(&DocumentId::new(id))
        .await?;
    Ok(Json(certificate))
}

/// A document's audit trail in causal order.
pub async fn audit_trail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<AuditEvent>>> {
    let trail = state.engine.trail(&DocumentId::new(id)).await?;
    Ok(Json(trail))
}

#[derive(Debug, Deserialize)]
pub struct OrgAuditQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

/// Organization-wide activity feed, newest first.
pub async fn org_audit_feed(
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
    Query(query): Query<OrgAuditQuery>,
) -> ApiResult<Json<Vec<AuditEvent>>> {
    let events = state
        .storage
        .list_org_events(
            &OrganizationId::new(organization_id),
            QueryWindow {
                limit: query.limit,
                offset: query.offset,
            },
        )
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(events))
}
