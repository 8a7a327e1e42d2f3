//! Document lifecycle operations on the sender side: compose, send, void,
//! remind, certificate, download.

use crate::config::SignflowConfig;
use crate::context::{Actor, RequestMeta};
use crate::error::{EngineError, EngineResult};
use crate::session::SigningSessionManager;
use crate::signing::NotifyFailure;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use signflow_audit::{AuditLedger, Certificate};
use signflow_notify::{
    reminder_email, signature_request_email, void_notice_email, Notifier, SignatureRequestParams,
};
use signflow_storage::SignflowStorage;
use signflow_types::{
    AuditEventDraft, AuditEventType, ContactId, Document, DocumentFile, DocumentId, DocumentStatus,
    DownloadToken, Field, FieldId, FieldType, FileKind, OrganizationId, Recipient, RecipientId,
    RecipientRole, RecipientStatus, SigningOrder, UserId,
};
use std::sync::Arc;
use thiserror::Error;

/// One recipient in a document draft.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecipientSpec {
    pub name: String,
    pub email: String,
    pub role: RecipientRole,
    #[serde(default)]
    pub signing_order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<ContactId>,
}

/// One field placement in a document draft. `recipient_index` points into
/// the draft's recipient list; real ids do not exist yet at compose time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldSpec {
    pub recipient_index: usize,
    pub kind: FieldType,
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Reference to an already-uploaded source PDF.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileSpec {
    pub url: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

/// Everything needed to compose a document in one shot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub organization_id: OrganizationId,
    pub created_by: UserId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub signing_order: SigningOrder,
    pub recipients: Vec<RecipientSpec>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileSpec>,
    /// Send immediately after compose instead of leaving a draft.
    #[serde(default)]
    pub send_now: bool,
}

/// Result of a send: the updated document plus any per-recipient email
/// failures. Failures never abort the send.
#[derive(Debug)]
pub struct SendOutcome {
    pub document: Document,
    pub notify_failures: Vec<NotifyFailure>,
}

/// Rejections for an inbound download token, mirroring the signing-link
/// rejection shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DownloadRejection {
    #[error("Invalid download link.")]
    Invalid,

    #[error("Download link expired.")]
    Expired,
}

impl DownloadRejection {
    pub fn user_message(&self) -> &'static str {
        match self {
            DownloadRejection::Invalid => {
                "This download link is not valid. Please check the link or contact the sender."
            }
            DownloadRejection::Expired => {
                "This download link has expired. Please contact the sender for a new copy."
            }
        }
    }
}

/// A validated download: the document and the file to serve.
#[derive(Clone, Debug)]
pub struct DownloadGrant {
    pub token: DownloadToken,
    pub document: Document,
    pub file: DocumentFile,
}

/// Sender-side document operations.
pub struct DocumentService {
    store: Arc<dyn SignflowStorage>,
    ledger: Arc<AuditLedger>,
    notifier: Arc<dyn Notifier>,
    sessions: Arc<SigningSessionManager>,
    config: SignflowConfig,
}

impl DocumentService {
    pub fn new(
        store: Arc<dyn SignflowStorage>,
        ledger: Arc<AuditLedger>,
        notifier: Arc<dyn Notifier>,
        sessions: Arc<SigningSessionManager>,
        config: SignflowConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            notifier,
            sessions,
            config,
        }
    }

    /// Compose a document with its recipients, fields, and source PDF.
    ///
    /// The draft is validated as a whole before anything is written: a
    /// non-empty title, at least one signer or approver, and every field
    /// assigned to a recipient who actually signs.
    pub async fn create_document(
        &self,
        draft: DocumentDraft,
        actor: Actor,
        meta: &RequestMeta,
    ) -> EngineResult<Document> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(EngineError::Validation("title must not be empty".into()));
        }
        if !draft
            .recipients
            .iter()
            .any(|r| r.role.requires_signature())
        {
            return Err(EngineError::NoSigners);
        }
        for spec in &draft.recipients {
            if spec.email.trim().is_empty() {
                return Err(EngineError::Validation(format!(
                    "recipient \"{}\" has no email address",
                    spec.name
                )));
            }
        }
        for field in &draft.fields {
            let owner = draft.recipients.get(field.recipient_index).ok_or_else(|| {
                EngineError::Validation(format!(
                    "field references recipient index {} out of range",
                    field.recipient_index
                ))
            })?;
            if !owner.role.requires_signature() {
                return Err(EngineError::Validation(format!(
                    "field assigned to cc recipient \"{}\"",
                    owner.name
                )));
            }
        }

        let now = Utc::now();
        let document = Document {
            id: DocumentId::generate(),
            organization_id: draft.organization_id.clone(),
            created_by: draft.created_by.clone(),
            title: title.to_string(),
            description: draft.description.clone(),
            status: DocumentStatus::Draft,
            signing_order: draft.signing_order,
            expires_at: None,
            completed_at: None,
            voided_at: None,
            voided_reason: None,
            created_at: now,
            updated_at: now,
        };

        let recipients: Vec<Recipient> = draft
            .recipients
            .iter()
            .enumerate()
            .map(|(position, spec)| Recipient {
                id: RecipientId::generate(),
                document_id: document.id.clone(),
                contact_id: spec.contact_id.clone(),
                name: spec.name.clone(),
                email: spec.email.clone(),
                role: spec.role,
                signing_order: if spec.signing_order > 0 {
                    spec.signing_order
                } else {
                    position as u32 + 1
                },
                status: RecipientStatus::Pending,
                viewed_at: None,
                signed_at: None,
                declined_at: None,
                decline_reason: None,
                last_reminded_at: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let fields: Vec<Field> = draft
            .fields
            .iter()
            .map(|spec| Field {
                id: FieldId::generate(),
                document_id: document.id.clone(),
                recipient_id: recipients[spec.recipient_index].id.clone(),
                kind: spec.kind,
                page: spec.page,
                x: spec.x,
                y: spec.y,
                width: spec.width,
                height: spec.height,
                required: spec.required,
                placeholder: spec.placeholder.clone(),
                value: None,
                signed_at: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        self.store.insert_document(document.clone()).await?;
        self.store.insert_recipients(recipients.clone()).await?;
        if !fields.is_empty() {
            self.store.insert_fields(fields).await?;
        }
        if let Some(file) = &draft.file {
            self.store
                .insert_file(DocumentFile {
                    id: signflow_tokens::generate_token_bytes(8),
                    document_id: document.id.clone(),
                    kind: FileKind::Original,
                    url: file.url.clone(),
                    filename: file.filename.clone(),
                    size_bytes: file.size_bytes,
                    page_count: file.page_count,
                    created_at: now,
                })
                .await?;
        }

        let audit = AuditEventDraft::for_document(
            AuditEventType::DocumentCreated,
            document.organization_id.clone(),
            document.id.clone(),
        )
        .with_metadata(serde_json::json!({
            "title": document.title,
            "recipient_count": recipients.len(),
        }));
        self.ledger.record(actor.apply_to(meta.apply_to(audit))).await;

        tracing::info!(
            document_id = %document.id,
            recipients = recipients.len(),
            "document created"
        );

        if draft.send_now {
            let outcome = self.send_document(&document.id, actor, meta).await?;
            for failure in &outcome.notify_failures {
                tracing::warn!(
                    document_id = %outcome.document.id,
                    email = %failure.email,
                    reason = %failure.reason,
                    "send-now email failed"
                );
            }
            return Ok(outcome.document);
        }
        Ok(document)
    }

    /// Send (or resend) a document: mint sessions and email every signer
    /// and approver. Email failures are collected, not propagated; a
    /// resend reuses each recipient's unexpired session so live links keep
    /// working.
    pub async fn send_document(
        &self,
        id: &DocumentId,
        actor: Actor,
        meta: &RequestMeta,
    ) -> EngineResult<SendOutcome> {
        let document = self
            .store
            .get_document(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("document {id}")))?;
        if document.status.is_terminal() {
            return Err(EngineError::Validation(format!(
                "cannot send a {} document",
                document.status
            )));
        }

        let sender_name = self.sender_name(&document.created_by).await?;
        let recipients = self.store.list_recipients(id).await?;
        let mut notify_failures = Vec::new();

        for recipient in recipients.iter().filter(|r| r.role.requires_signature()) {
            if recipient.has_signed() {
                continue;
            }
            let session = self.sessions.create_session(recipient, &document).await?;
            // The recipient is "sent" from the moment their session exists;
            // delivery failure does not undo the transition.
            self.store.mark_sent(&recipient.id, Utc::now()).await?;
            let message = signature_request_email(SignatureRequestParams {
                recipient_name: recipient.name.clone(),
                recipient_email: recipient.email.clone(),
                document_title: document.title.clone(),
                sender_name: sender_name.clone(),
                signing_url: self.config.signing_url(&session.token),
                expiry_days: self.config.token_expiry_days,
            });

            let delivery = self.notifier.send(message).await;
            let email_success = delivery.is_ok();
            if let Err(error) = &delivery {
                tracing::warn!(
                    recipient_id = %recipient.id,
                    email = %recipient.email,
                    %error,
                    "signature request email failed"
                );
                notify_failures.push(NotifyFailure {
                    email: recipient.email.clone(),
                    reason: error.to_string(),
                });
            }

            let audit = AuditEventDraft::for_document(
                AuditEventType::RecipientEmailSent,
                document.organization_id.clone(),
                document.id.clone(),
            )
            .with_metadata(serde_json::json!({
                "email": recipient.email,
                "email_success": email_success,
            }));
            let mut audit = actor.apply_to(meta.apply_to(audit));
            audit.recipient_id = Some(recipient.id.clone());
            self.ledger.record(audit).await;
        }

        let now = Utc::now();
        if document.status == DocumentStatus::Draft {
            self.store
                .update_document_status(id, DocumentStatus::Pending, now)
                .await?;
        }

        let audit = AuditEventDraft::for_document(
            AuditEventType::DocumentSent,
            document.organization_id.clone(),
            document.id.clone(),
        )
        .with_metadata(serde_json::json!({
            "recipient_count": recipients
                .iter()
                .filter(|r| r.role.requires_signature())
                .count(),
        }));
        self.ledger.record(actor.apply_to(meta.apply_to(audit))).await;

        let document = self
            .store
            .get_document(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("document {id}")))?;
        Ok(SendOutcome {
            document,
            notify_failures,
        })
    }

    /// Void a document. Conditional on the current status being
    /// non-terminal; a completed document can never be voided. Outstanding
    /// recipients get a best-effort void notice.
    pub async fn void_document(
        &self,
        id: &DocumentId,
        reason: Option<String>,
        actor: Actor,
        meta: &RequestMeta,
    ) -> EngineResult<Document> {
        let document = self
            .store
            .get_document(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("document {id}")))?;

        let voided = self
            .store
            .void_document(id, Utc::now(), reason.clone())
            .await?;
        if !voided {
            return Err(EngineError::Validation(format!(
                "cannot void a {} document",
                document.status
            )));
        }

        let audit = AuditEventDraft::for_document(
            AuditEventType::DocumentVoided,
            document.organization_id.clone(),
            document.id.clone(),
        )
        .with_metadata(serde_json::json!({ "reason": reason }));
        self.ledger.record(actor.apply_to(meta.apply_to(audit))).await;

        // Notify everyone still holding a live signing link.
        let recipients = self.store.list_recipients(id).await?;
        for recipient in recipients
            .iter()
            .filter(|r| r.role.requires_signature() && !r.has_signed())
        {
            let message = void_notice_email(
                &recipient.name,
                &recipient.email,
                &document.title,
                reason.as_deref(),
            );
            let email_success = match self.notifier.send(message).await {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!(
                        recipient_id = %recipient.id,
                        email = %recipient.email,
                        %error,
                        "void notice email failed"
                    );
                    false
                }
            };
            let audit = AuditEventDraft::for_document(
                AuditEventType::RecipientEmailSent,
                document.organization_id.clone(),
                document.id.clone(),
            )
            .with_metadata(serde_json::json!({
                "kind": "void_notice",
                "email": recipient.email,
                "email_success": email_success,
            }));
            let mut audit = actor.apply_to(meta.apply_to(audit));
            audit.recipient_id = Some(recipient.id.clone());
            self.ledger.record(audit).await;
        }

        self.store
            .get_document(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("document {id}")))
    }

    /// Send a manual reminder to one outstanding recipient. Unlike send
    /// fan-out, the email IS the operation here, so a delivery failure is
    /// surfaced as an error and nothing is recorded.
    pub async fn remind_recipient(
        &self,
        document_id: &DocumentId,
        recipient_id: &RecipientId,
        actor: Actor,
        meta: &RequestMeta,
    ) -> EngineResult<()> {
        let document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("document {document_id}")))?;
        if document.status != DocumentStatus::Pending {
            return Err(EngineError::Validation(format!(
                "cannot remind on a {} document",
                document.status
            )));
        }

        let recipient = self
            .store
            .get_recipient(recipient_id)
            .await?
            .filter(|r| r.document_id == *document_id)
            .ok_or_else(|| EngineError::NotFound(format!("recipient {recipient_id}")))?;
        if recipient.has_signed() {
            return Err(EngineError::Validation(
                "recipient has already signed".into(),
            ));
        }

        let session = self
            .store
            .find_session_for_recipient(recipient_id)
            .await?
            .filter(|s| !s.is_expired(Utc::now()))
            .ok_or_else(|| {
                EngineError::Validation("recipient has no active signing session".into())
            })?;

        let sender_name = self.sender_name(&document.created_by).await?;
        let message = reminder_email(SignatureRequestParams {
            recipient_name: recipient.name.clone(),
            recipient_email: recipient.email.clone(),
            document_title: document.title.clone(),
            sender_name,
            signing_url: self.config.signing_url(&session.token),
            expiry_days: self.config.token_expiry_days,
        });
        self.notifier
            .send(message)
            .await
            .map_err(|e| EngineError::Downstream(e.to_string()))?;

        self.store.touch_reminded(recipient_id, Utc::now()).await?;
        let audit = AuditEventDraft::for_document(
            AuditEventType::RecipientReminderSent,
            document.organization_id.clone(),
            document.id.clone(),
        )
        .with_metadata(serde_json::json!({ "email": recipient.email }));
        let mut audit = actor.apply_to(meta.apply_to(audit));
        audit.recipient_id = Some(recipient.id.clone());
        self.ledger.record(audit).await;
        Ok(())
    }

    /// Assemble the completion certificate for a completed document.
    pub async fn certificate(&self, document_id: &DocumentId) -> EngineResult<Certificate> {
        let document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("document {document_id}")))?;
        let recipients = self.store.list_recipients(document_id).await?;
        let trail = self.ledger.trail(document_id).await?;
        Certificate::assemble(&document, &recipients, &trail)
            .map_err(|e| EngineError::Validation(e.to_string()))
    }

    /// Validate a download token and resolve the file to serve. Tokens are
    /// reusable within their expiry window; first use is recorded for the
    /// audit trail.
    pub async fn download_document(
        &self,
        token: &str,
        meta: &RequestMeta,
    ) -> EngineResult<DownloadGrant> {
        let token = self
            .store
            .find_download_token(token)
            .await?
            .ok_or(DownloadRejection::Invalid)?;
        if token.is_expired(Utc::now()) {
            return Err(DownloadRejection::Expired.into());
        }

        let document = self
            .store
            .get_document(&token.document_id)
            .await?
            .ok_or(DownloadRejection::Invalid)?;
        // Prefer the flattened signed PDF; fall back to the original when
        // flattening has not produced one yet.
        let file = match self
            .store
            .find_file(&token.document_id, FileKind::Signed)
            .await?
        {
            Some(file) => file,
            None => self
                .store
                .find_file(&token.document_id, FileKind::Original)
                .await?
                .ok_or_else(|| {
                    EngineError::NotFound(format!("file for document {}", token.document_id))
                })?,
        };

        self.store
            .mark_download_used(&token.id, Utc::now())
            .await?;
        let audit = AuditEventDraft::for_document(
            AuditEventType::DocumentDownloaded,
            document.organization_id.clone(),
            document.id.clone(),
        )
        .with_metadata(serde_json::json!({ "email": token.email }));
        let mut audit = meta.apply_to(audit);
        audit.actor_email = Some(token.email.clone());
        audit.recipient_id = token.recipient_id.clone();
        self.ledger.record(audit).await;

        Ok(DownloadGrant {
            token,
            document,
            file,
        })
    }

    /// Display name shown as the email sender, falling back to the
    /// configured placeholder when the creating user is unknown.
    async fn sender_name(&self, created_by: &UserId) -> EngineResult<String> {
        Ok(self
            .store
            .get_user(created_by)
            .await?
            .map(|u| u.display_name().to_string())
            .unwrap_or_else(|| self.config.sender_name_fallback.clone()))
    }
}
