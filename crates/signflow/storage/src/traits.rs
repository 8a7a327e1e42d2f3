use crate::StorageResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use signflow_types::{
    AuditEvent, AuditEventDraft, Document, DocumentFile, DocumentId, DownloadToken, Field, FieldId,
    FileKind, Organization, OrganizationId, Recipient, RecipientId, SessionId, SigningSession,
    User, UserId,
};

/// Storage interface for tenant records and their signing settings.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn insert_organization(&self, organization: Organization) -> StorageResult<()>;

    async fn get_organization(
        &self,
        id: &OrganizationId,
    ) -> StorageResult<Option<Organization>>;
}

/// Generic query window for paged reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

/// Storage interface for document records and their lifecycle writes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a newly composed document.
    async fn insert_document(&self, document: Document) -> StorageResult<()>;

    async fn get_document(&self, id: &DocumentId) -> StorageResult<Option<Document>>;

    /// List an organization's documents, newest first.
    async fn list_documents(
        &self,
        organization_id: &OrganizationId,
        window: QueryWindow,
    ) -> StorageResult<Vec<Document>>;

    /// Unconditional status write (draft → pending on send).
    async fn update_document_status(
        &self,
        id: &DocumentId,
        status: signflow_types::DocumentStatus,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Conditional completion: transition to `completed` only if the
    /// document is currently `pending`. Returns whether THIS caller
    /// performed the transition — the compare-and-swap that makes
    /// completion exactly-once under concurrent final signatures.
    async fn complete_document_if_pending(
        &self,
        id: &DocumentId,
        completed_at: DateTime<Utc>,
    ) -> StorageResult<bool>;

    /// Conditional void: transition to `voided` only from a non-terminal
    /// status. Returns whether the transition happened.
    async fn void_document(
        &self,
        id: &DocumentId,
        voided_at: DateTime<Utc>,
        reason: Option<String>,
    ) -> StorageResult<bool>;
}

/// Storage interface for recipient progression.
#[async_trait]
pub trait RecipientStore: Send + Sync {
    async fn insert_recipients(&self, recipients: Vec<Recipient>) -> StorageResult<()>;

    async fn get_recipient(&self, id: &RecipientId) -> StorageResult<Option<Recipient>>;

    /// All recipients of a document, in signing-order position.
    async fn list_recipients(&self, document_id: &DocumentId) -> StorageResult<Vec<Recipient>>;

    async fn mark_sent(&self, id: &RecipientId, at: DateTime<Utc>) -> StorageResult<()>;

    /// Record the first open of the signing room. Later opens are no-ops;
    /// returns whether this call was the first view.
    async fn mark_viewed(&self, id: &RecipientId, at: DateTime<Utc>) -> StorageResult<bool>;

    /// Guarded signature write: returns false (and writes nothing) when the
    /// recipient is already signed, making duplicate submissions from the
    /// same token idempotent.
    async fn mark_signed(&self, id: &RecipientId, at: DateTime<Utc>) -> StorageResult<bool>;

    async fn mark_declined(
        &self,
        id: &RecipientId,
        at: DateTime<Utc>,
        reason: Option<String>,
    ) -> StorageResult<()>;

    /// Informational `last_reminded_at` touch; does not affect status.
    async fn touch_reminded(&self, id: &RecipientId, at: DateTime<Utc>) -> StorageResult<()>;
}

/// Storage interface for field placements and signing-time value writes.
#[async_trait]
pub trait FieldStore: Send + Sync {
    async fn insert_fields(&self, fields: Vec<Field>) -> StorageResult<()>;

    async fn list_fields(&self, document_id: &DocumentId) -> StorageResult<Vec<Field>>;

    /// Compound-scoped value write: the patch applies only where both the
    /// field id AND the owning recipient id match. A write that matches
    /// zero rows is a no-op, not an error — this is the authorization
    /// boundary keeping one recipient out of another's fields. Returns
    /// the number of rows affected (0 or 1).
    async fn set_field_value(
        &self,
        field_id: &FieldId,
        recipient_id: &RecipientId,
        value: serde_json::Value,
        at: DateTime<Utc>,
    ) -> StorageResult<u64>;
}

/// Storage interface for signing sessions. Sessions are never deleted.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a freshly minted session. Rejects with `Conflict` on a token
    /// collision (defense in depth behind the CSPRNG).
    async fn insert_session(&self, session: SigningSession) -> StorageResult<()>;

    async fn find_session_by_token(&self, token: &str) -> StorageResult<Option<SigningSession>>;

    /// The recipient's existing session, if any (one active session per
    /// signer/approver recipient).
    async fn find_session_for_recipient(
        &self,
        recipient_id: &RecipientId,
    ) -> StorageResult<Option<SigningSession>>;

    /// Record consumption metadata (used_at, origin). Informational only;
    /// consumption does not gate re-access.
    async fn consume_session(
        &self,
        id: &SessionId,
        used_at: DateTime<Utc>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> StorageResult<()>;
}

/// Storage interface for post-completion download tokens.
#[async_trait]
pub trait DownloadTokenStore: Send + Sync {
    async fn insert_download_token(&self, token: DownloadToken) -> StorageResult<()>;

    async fn find_download_token(&self, token: &str) -> StorageResult<Option<DownloadToken>>;

    /// Record first use. Downloads remain allowed within the expiry window.
    async fn mark_download_used(&self, id: &str, used_at: DateTime<Utc>) -> StorageResult<()>;
}

/// Storage interface for PDF file references (URL + filename, never bytes).
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn insert_file(&self, file: DocumentFile) -> StorageResult<()>;

    async fn find_file(
        &self,
        document_id: &DocumentId,
        kind: FileKind,
    ) -> StorageResult<Option<DocumentFile>>;
}

/// Storage interface for internal (sender-side) user records. Used for
/// audit attribution and sender naming in outbound email.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: User) -> StorageResult<()>;

    async fn get_user(&self, id: &UserId) -> StorageResult<Option<User>>;
}

/// Storage interface for the append-only audit ledger.
///
/// There is deliberately no update or delete operation on this trait.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append an event; storage assigns id and timestamp and returns the
    /// stored record.
    async fn append_event(&self, event: AuditEventDraft) -> StorageResult<AuditEvent>;

    /// A document's events in causal (ascending created_at) order, ties
    /// broken by insertion sequence.
    async fn list_events(&self, document_id: &DocumentId) -> StorageResult<Vec<AuditEvent>>;

    /// Organization-wide event feed, newest first.
    async fn list_org_events(
        &self,
        organization_id: &OrganizationId,
        window: QueryWindow,
    ) -> StorageResult<Vec<AuditEvent>>;
}

/// Unified storage bundle consumed by the engine and service surfaces.
pub trait SignflowStorage:
    OrganizationStore
    + DocumentStore
    + RecipientStore
    + FieldStore
    + SessionStore
    + DownloadTokenStore
    + FileStore
    + UserStore
    + AuditStore
    + Send
    + Sync
{
}

impl<T> SignflowStorage for T where
    T: OrganizationStore
        + DocumentStore
        + RecipientStore
        + FieldStore
        + SessionStore
        + DownloadTokenStore
        + FileStore
        + UserStore
        + AuditStore
        + Send
        + Sync
{
}
