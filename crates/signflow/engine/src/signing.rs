//! The submit-signature pipeline and the completion evaluator.
//!
//! This is the consistency-critical path of the whole system: the final
//! two signers of a document routinely race, and completion must happen
//! exactly once no matter how that race resolves. The decision is made
//! against a fresh read of recipient statuses and committed with a
//! conditional status write; only the submission that wins the write runs
//! the completion fan-out.

use crate::blob::BlobFetcher;
use crate::config::SignflowConfig;
use crate::context::{Actor, RequestMeta};
use crate::error::{EngineError, EngineResult, SessionRejection};
use crate::session::{SigningSessionManager, ValidatedSession};
use chrono::Utc;
use signflow_audit::AuditLedger;
use signflow_notify::{
    completion_email, CompletionParams, EmailAttachment, Notifier, MAX_ATTACHMENT_BYTES,
};
use signflow_storage::SignflowStorage;
use signflow_types::{
    AuditEventDraft, AuditEventType, Document, DownloadToken, Field, FieldId, FileKind, Recipient,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One failed email during fan-out. Informational; the state transition
/// that triggered the fan-out has already committed.
#[derive(Clone, Debug)]
pub struct NotifyFailure {
    pub email: String,
    pub reason: String,
}

/// Result of a signature submission.
#[derive(Debug, Default)]
pub struct SubmitOutcome {
    /// True only when THIS submission completed the document. The other
    /// side of a final-signature race sees `false` even though the
    /// document is completed by the time it returns.
    pub document_completed: bool,
    pub notify_failures: Vec<NotifyFailure>,
}

/// Drives a recipient's signature from token validation through the
/// completion check.
pub struct SigningWorkflow {
    store: Arc<dyn SignflowStorage>,
    ledger: Arc<AuditLedger>,
    notifier: Arc<dyn Notifier>,
    blobs: Arc<dyn BlobFetcher>,
    sessions: Arc<SigningSessionManager>,
    config: SignflowConfig,
}

impl SigningWorkflow {
    pub fn new(
        store: Arc<dyn SignflowStorage>,
        ledger: Arc<AuditLedger>,
        notifier: Arc<dyn Notifier>,
        blobs: Arc<dyn BlobFetcher>,
        sessions: Arc<SigningSessionManager>,
        config: SignflowConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            notifier,
            blobs,
            sessions,
            config,
        }
    }

    /// Submit a recipient's field values and signature.
    ///
    /// Order matters: validation, then the required-field check against
    /// stored and submitted values combined, then value writes, then the
    /// guarded status flip, and only then the completion evaluation. The
    /// guarded flip is what makes a duplicate submission from the same
    /// token idempotent rather than double-counted.
    pub async fn submit_signature(
        &self,
        token: &str,
        values: HashMap<FieldId, serde_json::Value>,
        meta: &RequestMeta,
    ) -> EngineResult<SubmitOutcome> {
        let validated = self.sessions.validate_session(token).await?;
        let ValidatedSession {
            session,
            recipient,
            document,
        } = &validated;

        let fields = self.store.list_fields(&document.id).await?;
        let own_fields: Vec<&Field> = fields
            .iter()
            .filter(|f| f.recipient_id == recipient.id)
            .collect();
        self.check_required(&own_fields, &values)?;

        // Value writes are scoped to (field, owning recipient); a
        // submitted id belonging to another recipient matches zero rows
        // and is dropped here.
        let now = Utc::now();
        for (field_id, value) in &values {
            if value.is_null() {
                continue;
            }
            let rows = self
                .store
                .set_field_value(field_id, &recipient.id, value.clone(), now)
                .await?;
            if rows == 0 {
                tracing::warn!(
                    field_id = %field_id,
                    recipient_id = %recipient.id,
                    "field write matched no row; value ignored"
                );
            }
        }

        let signed = self.store.mark_signed(&recipient.id, now).await?;
        if !signed {
            return Err(SessionRejection::AlreadySigned.into());
        }
        self.sessions.consume_session(&session.id, meta).await?;

        let audit = AuditEventDraft::for_document(
            AuditEventType::RecipientSigned,
            document.organization_id.clone(),
            document.id.clone(),
        )
        .with_metadata(serde_json::json!({ "fields_submitted": values.len() }));
        self.ledger
            .record(Actor::from_recipient(recipient).apply_to(meta.apply_to(audit)))
            .await;
        tracing::info!(
            document_id = %document.id,
            recipient_id = %recipient.id,
            "recipient signed"
        );

        let mut outcome = SubmitOutcome::default();
        if self.try_complete(document, recipient).await? {
            outcome.document_completed = true;
            outcome.notify_failures = self.completion_fanout(document, recipient).await?;
        }
        Ok(outcome)
    }

    /// Decline to sign. The recipient's link must still validate (an
    /// already-signed recipient cannot retroactively decline); the
    /// document itself stays where it is, permanently short of
    /// completion until voided or re-assigned.
    pub async fn decline_signature(
        &self,
        token: &str,
        reason: Option<String>,
        meta: &RequestMeta,
    ) -> EngineResult<()> {
        let validated = self.sessions.validate_session(token).await?;
        let ValidatedSession {
            session,
            recipient,
            document,
        } = &validated;

        self.store
            .mark_declined(&recipient.id, Utc::now(), reason.clone())
            .await?;
        self.sessions.consume_session(&session.id, meta).await?;

        let audit = AuditEventDraft::for_document(
            AuditEventType::DocumentDeclined,
            document.organization_id.clone(),
            document.id.clone(),
        )
        .with_metadata(serde_json::json!({ "reason": reason }));
        self.ledger
            .record(Actor::from_recipient(recipient).apply_to(meta.apply_to(audit)))
            .await;
        tracing::info!(
            document_id = %document.id,
            recipient_id = %recipient.id,
            "recipient declined"
        );
        Ok(())
    }

    /// Reject the submission when any required field would still be
    /// without a value after this write. A field already holding a stored
    /// value passes even if absent from the submission.
    fn check_required(
        &self,
        own_fields: &[&Field],
        values: &HashMap<FieldId, serde_json::Value>,
    ) -> EngineResult<()> {
        let missing: Vec<String> = own_fields
            .iter()
            .filter(|f| f.required && !f.has_value())
            .filter(|f| values.get(&f.id).map(|v| v.is_null()).unwrap_or(true))
            .map(|f| {
                f.placeholder
                    .clone()
                    .unwrap_or_else(|| f.kind.to_string())
            })
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EngineError::MissingRequiredFields(missing))
        }
    }

    /// Decide completion against a fresh read of every recipient, then
    /// commit it with a conditional status write. Returns whether this
    /// caller performed the transition.
    async fn try_complete(
        &self,
        document: &Document,
        final_signer: &Recipient,
    ) -> EngineResult<bool> {
        let recipients = self.store.list_recipients(&document.id).await?;
        let all_signed = recipients
            .iter()
            .filter(|r| r.role.requires_signature())
            .all(|r| r.has_signed());
        if !all_signed {
            return Ok(false);
        }

        let won = self
            .store
            .complete_document_if_pending(&document.id, Utc::now())
            .await?;
        if won {
            let audit = AuditEventDraft::for_document(
                AuditEventType::DocumentCompleted,
                document.organization_id.clone(),
                document.id.clone(),
            )
            .with_metadata(serde_json::json!({ "final_signer": final_signer.email }));
            self.ledger.record(audit).await;
            tracing::info!(document_id = %document.id, "document completed");
        }
        Ok(won)
    }

    /// Fan completion emails out to every signer, cc recipient, and the
    /// document creator, de-duplicated by email address. Each person gets
    /// their own download token. Failures are collected and the loop
    /// continues; by this point the document IS completed and nothing can
    /// roll that back.
    async fn completion_fanout(
        &self,
        document: &Document,
        final_signer: &Recipient,
    ) -> EngineResult<Vec<NotifyFailure>> {
        let recipients = self.store.list_recipients(&document.id).await?;
        let attachment = self.attachment_for(document).await?;

        let mut parties: Vec<(String, String, Option<signflow_types::RecipientId>)> = recipients
            .iter()
            .map(|r| (r.name.clone(), r.email.clone(), Some(r.id.clone())))
            .collect();
        if let Some(creator) = self.store.get_user(&document.created_by).await? {
            parties.push((creator.display_name().to_string(), creator.email.clone(), None));
        }

        let mut seen = HashSet::new();
        let mut failures = Vec::new();
        let now = Utc::now();
        for (name, email, recipient_id) in parties {
            if !seen.insert(email.to_ascii_lowercase()) {
                continue;
            }

            let download = DownloadToken {
                id: signflow_tokens::generate_token_bytes(8),
                document_id: document.id.clone(),
                recipient_id: recipient_id.clone(),
                email: email.clone(),
                token: signflow_tokens::generate_token(),
                expires_at: signflow_tokens::token_expiry(self.config.download_expiry_days),
                used_at: None,
                created_at: now,
            };
            let download_url = self.config.download_url(&download.token);
            self.store.insert_download_token(download).await?;

            let message = completion_email(CompletionParams {
                recipient_name: name,
                recipient_email: email.clone(),
                document_title: document.title.clone(),
                download_url,
                attachment: attachment.clone(),
            });
            let delivery = self.notifier.send(message).await;
            let email_success = delivery.is_ok();
            if let Err(error) = &delivery {
                tracing::warn!(
                    document_id = %document.id,
                    %email,
                    %error,
                    "completion email failed"
                );
                failures.push(NotifyFailure {
                    email: email.clone(),
                    reason: error.to_string(),
                });
            }

            let mut audit = AuditEventDraft::for_document(
                AuditEventType::RecipientCompletionEmailSent,
                document.organization_id.clone(),
                document.id.clone(),
            )
            .with_metadata(serde_json::json!({
                "email": email,
                "email_success": email_success,
                "final_signer": final_signer.email,
            }));
            audit.recipient_id = recipient_id;
            self.ledger.record(audit).await;
        }
        Ok(failures)
    }

    /// Fetch the signed PDF for attachment when it exists and fits under
    /// the attachment cap. Any miss (no file, too large, fetch failure)
    /// degrades to a link-only email.
    async fn attachment_for(&self, document: &Document) -> EngineResult<Option<EmailAttachment>> {
        let file = match self.store.find_file(&document.id, FileKind::Signed).await? {
            Some(file) => file,
            None => return Ok(None),
        };
        if file.size_bytes.map(|s| s > MAX_ATTACHMENT_BYTES).unwrap_or(true) {
            return Ok(None);
        }
        match self.blobs.fetch_base64(&file.url).await {
            Ok(content_base64) => Ok(Some(EmailAttachment {
                filename: file.filename,
                content_base64,
            })),
            Err(error) => {
                tracing::warn!(document_id = %document.id, %error, "attachment fetch failed");
                Ok(None)
            }
        }
    }
}
