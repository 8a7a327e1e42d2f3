//! Signing-session lifecycle: the sole authority for validating inbound
//! public signing requests.

use crate::config::SignflowConfig;
use crate::context::RequestMeta;
use crate::error::{EngineError, EngineResult, SessionRejection};
use chrono::Utc;
use signflow_audit::AuditLedger;
use signflow_storage::SignflowStorage;
use signflow_types::{
    AuditEventDraft, AuditEventType, Document, DocumentFile, DocumentStatus, Field, FileKind,
    Recipient, RecipientStatus, SessionId, SigningSession,
};
use std::sync::Arc;

/// A session that has passed every validation check, together with the
/// records the caller invariably needs next.
#[derive(Clone, Debug)]
pub struct ValidatedSession {
    pub session: SigningSession,
    pub recipient: Recipient,
    pub document: Document,
}

/// Everything the signing room renders for one recipient.
#[derive(Clone, Debug)]
pub struct SigningRoomView {
    pub session: SigningSession,
    pub recipient: Recipient,
    pub document: Document,
    /// Only the fields assigned to this recipient.
    pub fields: Vec<Field>,
    /// All recipients, for progress display.
    pub all_recipients: Vec<Recipient>,
    /// The original PDF to render, when uploaded.
    pub pdf: Option<DocumentFile>,
}

/// Creates, validates, and invalidates per-recipient signing sessions.
pub struct SigningSessionManager {
    store: Arc<dyn SignflowStorage>,
    ledger: Arc<AuditLedger>,
    config: SignflowConfig,
}

impl SigningSessionManager {
    pub fn new(
        store: Arc<dyn SignflowStorage>,
        ledger: Arc<AuditLedger>,
        config: SignflowConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            config,
        }
    }

    /// Create a signing session for a recipient, or return the existing
    /// one if it has not expired. Idempotent: resending a document must
    /// not rotate a live token out from under an emailed link.
    ///
    /// Link lifetime comes from the owning organization's settings when
    /// configured (clamped to the supported 1..=30 day range), otherwise
    /// from the engine default.
    pub async fn create_session(
        &self,
        recipient: &Recipient,
        document: &Document,
    ) -> EngineResult<SigningSession> {
        if !recipient.role.requires_signature() {
            return Err(EngineError::Validation(format!(
                "recipient {} has role cc and never signs",
                recipient.id
            )));
        }

        let now = Utc::now();
        if let Some(existing) = self
            .store
            .find_session_for_recipient(&recipient.id)
            .await?
        {
            if !existing.is_expired(now) {
                return Ok(existing);
            }
        }

        let expiry_days = self
            .store
            .get_organization(&document.organization_id)
            .await?
            .and_then(|org| org.settings.token_expiry_days)
            .map(|days| days.clamp(1, 30))
            .unwrap_or(self.config.token_expiry_days);

        let session = SigningSession {
            id: SessionId::generate(),
            recipient_id: recipient.id.clone(),
            document_id: recipient.document_id.clone(),
            token: signflow_tokens::generate_token(),
            expires_at: signflow_tokens::token_expiry(expiry_days),
            used_at: None,
            ip_address: None,
            user_agent: None,
            created_at: now,
        };
        self.store.insert_session(session.clone()).await?;

        tracing::debug!(
            recipient_id = %recipient.id,
            document_id = %recipient.document_id,
            expires_at = %session.expires_at,
            "signing session created"
        );
        Ok(session)
    }

    /// Validate an inbound signing token.
    ///
    /// Checks run in a fixed order - unknown token, expiry, document
    /// voided, recipient already signed, recipient declined - so that when
    /// several conditions hold at once the most specific message wins.
    /// Acceptance requires all checks to pass.
    pub async fn validate_session(&self, token: &str) -> EngineResult<ValidatedSession> {
        let session = self
            .store
            .find_session_by_token(token)
            .await?
            .ok_or(SessionRejection::Invalid)?;

        if session.is_expired(Utc::now()) {
            return Err(SessionRejection::Expired.into());
        }

        let document = self
            .store
            .get_document(&session.document_id)
            .await?
            .ok_or(SessionRejection::Invalid)?;
        if document.status == DocumentStatus::Voided {
            return Err(SessionRejection::DocumentVoided.into());
        }

        let recipient = self
            .store
            .get_recipient(&session.recipient_id)
            .await?
            .ok_or(SessionRejection::Invalid)?;
        if recipient.status == RecipientStatus::Signed {
            return Err(SessionRejection::AlreadySigned.into());
        }
        if recipient.status == RecipientStatus::Declined {
            return Err(SessionRejection::Declined.into());
        }

        Ok(ValidatedSession {
            session,
            recipient,
            document,
        })
    }

    /// Validate a token and assemble the signing-room view, recording the
    /// recipient's first open as a `document.viewed` audit event.
    ///
    /// Re-access after submission is deliberately allowed until the
    /// recipient's own status flips to `signed`; `used_at` never gates a
    /// read.
    pub async fn signing_room(
        &self,
        token: &str,
        meta: &RequestMeta,
    ) -> EngineResult<SigningRoomView> {
        let validated = self.validate_session(token).await?;

        let first_view = self
            .store
            .mark_viewed(&validated.recipient.id, Utc::now())
            .await?;
        if first_view {
            let draft = AuditEventDraft::for_document(
                AuditEventType::DocumentViewed,
                validated.document.organization_id.clone(),
                validated.document.id.clone(),
            );
            let draft = crate::context::Actor::from_recipient(&validated.recipient)
                .apply_to(meta.apply_to(draft));
            self.ledger.record(draft).await;
        }

        let fields = self
            .store
            .list_fields(&validated.document.id)
            .await?
            .into_iter()
            .filter(|f| f.recipient_id == validated.recipient.id)
            .collect();
        let all_recipients = self.store.list_recipients(&validated.document.id).await?;
        let pdf = self
            .store
            .find_file(&validated.document.id, FileKind::Original)
            .await?;

        Ok(SigningRoomView {
            fields,
            all_recipients,
            pdf,
            session: validated.session,
            recipient: validated.recipient,
            document: validated.document,
        })
    }

    /// Record consumption metadata on a session. Informational only: the
    /// replay gate is the recipient's `signed` status, not `used_at`.
    pub async fn consume_session(
        &self,
        id: &SessionId,
        meta: &RequestMeta,
    ) -> EngineResult<()> {
        self.store
            .consume_session(
                id,
                Utc::now(),
                meta.ip_address.clone(),
                meta.user_agent.clone(),
            )
            .await?;
        Ok(())
    }
}
