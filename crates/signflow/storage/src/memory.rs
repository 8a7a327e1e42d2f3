//! In-memory reference implementation for SignFlow storage traits.
//!
//! This adapter is deterministic and test-friendly. Production deployments
//! should use a transactional backend (e.g. PostgreSQL) for source-of-truth
//! data. The conditional writes (`complete_document_if_pending`,
//! `void_document`, `mark_signed`) are atomic here because each runs under
//! a single write lock — a SQL backend realizes the same semantics with a
//! conditional UPDATE on current status.

use crate::traits::{
    AuditStore, DocumentStore, DownloadTokenStore, FieldStore, FileStore, OrganizationStore,
    QueryWindow, RecipientStore, SessionStore, UserStore,
};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use signflow_types::{
    AuditEvent, AuditEventDraft, Document, DocumentFile, DocumentId, DocumentStatus, DownloadToken,
    Field, FieldId, FileKind, Organization, OrganizationId, Recipient, RecipientId,
    RecipientStatus, SessionId, SigningSession, User, UserId,
};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Audit record plus its insertion sequence, used to break timestamp ties
/// so trail reads are stable.
#[derive(Clone)]
struct SequencedEvent {
    sequence: u64,
    event: AuditEvent,
}

/// In-memory SignFlow storage adapter.
#[derive(Default)]
pub struct InMemorySignflowStorage {
    organizations: RwLock<HashMap<OrganizationId, Organization>>,
    documents: RwLock<HashMap<DocumentId, Document>>,
    recipients: RwLock<HashMap<RecipientId, Recipient>>,
    fields: RwLock<HashMap<FieldId, Field>>,
    sessions: RwLock<HashMap<SessionId, SigningSession>>,
    download_tokens: RwLock<HashMap<String, DownloadToken>>,
    files: RwLock<Vec<DocumentFile>>,
    users: RwLock<HashMap<UserId, User>>,
    audits: RwLock<Vec<SequencedEvent>>,
}

impl InMemorySignflowStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrganizationStore for InMemorySignflowStorage {
    async fn insert_organization(&self, organization: Organization) -> StorageResult<()> {
        let mut guard = self
            .organizations
            .write()
            .map_err(|_| StorageError::Backend("organizations lock poisoned".to_string()))?;

        if guard.contains_key(&organization.id) {
            return Err(StorageError::Conflict(format!(
                "organization {} already exists",
                organization.id
            )));
        }
        guard.insert(organization.id.clone(), organization);
        Ok(())
    }

    async fn get_organization(
        &self,
        id: &OrganizationId,
    ) -> StorageResult<Option<Organization>> {
        let guard = self
            .organizations
            .read()
            .map_err(|_| StorageError::Backend("organizations lock poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }
}

#[async_trait]
impl DocumentStore for InMemorySignflowStorage {
    async fn insert_document(&self, document: Document) -> StorageResult<()> {
        let mut guard = self
            .documents
            .write()
            .map_err(|_| StorageError::Backend("documents lock poisoned".to_string()))?;

        if guard.contains_key(&document.id) {
            return Err(StorageError::Conflict(format!(
                "document {} already exists",
                document.id
            )));
        }
        guard.insert(document.id.clone(), document);
        Ok(())
    }

    async fn get_document(&self, id: &DocumentId) -> StorageResult<Option<Document>> {
        let guard = self
            .documents
            .read()
            .map_err(|_| StorageError::Backend("documents lock poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }

    async fn list_documents(
        &self,
        organization_id: &OrganizationId,
        window: QueryWindow,
    ) -> StorageResult<Vec<Document>> {
        let guard = self
            .documents
            .read()
            .map_err(|_| StorageError::Backend("documents lock poisoned".to_string()))?;
        let mut values = guard
            .values()
            .filter(|d| &d.organization_id == organization_id)
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(apply_window(values, window))
    }

    async fn update_document_status(
        &self,
        id: &DocumentId,
        status: DocumentStatus,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let mut guard = self
            .documents
            .write()
            .map_err(|_| StorageError::Backend("documents lock poisoned".to_string()))?;
        let document = guard
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("document {} not found", id)))?;

        if document.status.is_terminal() {
            return Err(StorageError::InvariantViolation(format!(
                "document {} is {} and immutable",
                id, document.status
            )));
        }
        document.status = status;
        document.updated_at = updated_at;
        Ok(())
    }

    async fn complete_document_if_pending(
        &self,
        id: &DocumentId,
        completed_at: DateTime<Utc>,
    ) -> StorageResult<bool> {
        let mut guard = self
            .documents
            .write()
            .map_err(|_| StorageError::Backend("documents lock poisoned".to_string()))?;
        let document = guard
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("document {} not found", id)))?;

        if document.status != DocumentStatus::Pending {
            return Ok(false);
        }
        document.status = DocumentStatus::Completed;
        document.completed_at = Some(completed_at);
        document.updated_at = completed_at;
        Ok(true)
    }

    async fn void_document(
        &self,
        id: &DocumentId,
        voided_at: DateTime<Utc>,
        reason: Option<String>,
    ) -> StorageResult<bool> {
        let mut guard = self
            .documents
            .write()
            .map_err(|_| StorageError::Backend("documents lock poisoned".to_string()))?;
        let document = guard
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("document {} not found", id)))?;

        if document.status.is_terminal() {
            return Ok(false);
        }
        document.status = DocumentStatus::Voided;
        document.voided_at = Some(voided_at);
        document.voided_reason = reason;
        document.updated_at = voided_at;
        Ok(true)
    }
}

#[async_trait]
impl RecipientStore for InMemorySignflowStorage {
    async fn insert_recipients(&self, recipients: Vec<Recipient>) -> StorageResult<()> {
        let mut guard = self
            .recipients
            .write()
            .map_err(|_| StorageError::Backend("recipients lock poisoned".to_string()))?;
        for recipient in recipients {
            guard.insert(recipient.id.clone(), recipient);
        }
        Ok(())
    }

    async fn get_recipient(&self, id: &RecipientId) -> StorageResult<Option<Recipient>> {
        let guard = self
            .recipients
            .read()
            .map_err(|_| StorageError::Backend("recipients lock poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }

    async fn list_recipients(&self, document_id: &DocumentId) -> StorageResult<Vec<Recipient>> {
        let guard = self
            .recipients
            .read()
            .map_err(|_| StorageError::Backend("recipients lock poisoned".to_string()))?;
        let mut values = guard
            .values()
            .filter(|r| &r.document_id == document_id)
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by_key(|r| r.signing_order);
        Ok(values)
    }

    async fn mark_sent(&self, id: &RecipientId, at: DateTime<Utc>) -> StorageResult<()> {
        let mut guard = self
            .recipients
            .write()
            .map_err(|_| StorageError::Backend("recipients lock poisoned".to_string()))?;
        let recipient = guard
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("recipient {} not found", id)))?;

        // Status is monotonic: sending again never moves viewed/signed back.
        if recipient.status == RecipientStatus::Pending {
            recipient.status = RecipientStatus::Sent;
        }
        recipient.updated_at = at;
        Ok(())
    }

    async fn mark_viewed(&self, id: &RecipientId, at: DateTime<Utc>) -> StorageResult<bool> {
        let mut guard = self
            .recipients
            .write()
            .map_err(|_| StorageError::Backend("recipients lock poisoned".to_string()))?;
        let recipient = guard
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("recipient {} not found", id)))?;

        if recipient.viewed_at.is_some() {
            return Ok(false);
        }
        recipient.viewed_at = Some(at);
        if matches!(
            recipient.status,
            RecipientStatus::Pending | RecipientStatus::Sent
        ) {
            recipient.status = RecipientStatus::Viewed;
        }
        recipient.updated_at = at;
        Ok(true)
    }

    async fn mark_signed(&self, id: &RecipientId, at: DateTime<Utc>) -> StorageResult<bool> {
        let mut guard = self
            .recipients
            .write()
            .map_err(|_| StorageError::Backend("recipients lock poisoned".to_string()))?;
        let recipient = guard
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("recipient {} not found", id)))?;

        if recipient.status == RecipientStatus::Signed {
            return Ok(false);
        }
        recipient.status = RecipientStatus::Signed;
        recipient.signed_at = Some(at);
        recipient.updated_at = at;
        Ok(true)
    }

    async fn mark_declined(
        &self,
        id: &RecipientId,
        at: DateTime<Utc>,
        reason: Option<String>,
    ) -> StorageResult<()> {
        let mut guard = self
            .recipients
            .write()
            .map_err(|_| StorageError::Backend("recipients lock poisoned".to_string()))?;
        let recipient = guard
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("recipient {} not found", id)))?;

        if recipient.status == RecipientStatus::Signed {
            return Err(StorageError::InvariantViolation(format!(
                "recipient {} already signed and cannot decline",
                id
            )));
        }
        recipient.status = RecipientStatus::Declined;
        recipient.declined_at = Some(at);
        recipient.decline_reason = reason;
        recipient.updated_at = at;
        Ok(())
    }

    async fn touch_reminded(&self, id: &RecipientId, at: DateTime<Utc>) -> StorageResult<()> {
        let mut guard = self
            .recipients
            .write()
            .map_err(|_| StorageError::Backend("recipients lock poisoned".to_string()))?;
        let recipient = guard
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("recipient {} not found", id)))?;
        recipient.last_reminded_at = Some(at);
        Ok(())
    }
}

#[async_trait]
impl FieldStore for InMemorySignflowStorage {
    async fn insert_fields(&self, fields: Vec<Field>) -> StorageResult<()> {
        let mut guard = self
            .fields
            .write()
            .map_err(|_| StorageError::Backend("fields lock poisoned".to_string()))?;
        for field in fields {
            guard.insert(field.id.clone(), field);
        }
        Ok(())
    }

    async fn list_fields(&self, document_id: &DocumentId) -> StorageResult<Vec<Field>> {
        let guard = self
            .fields
            .read()
            .map_err(|_| StorageError::Backend("fields lock poisoned".to_string()))?;
        let mut values = guard
            .values()
            .filter(|f| &f.document_id == document_id)
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| (a.page, &a.id.0).cmp(&(b.page, &b.id.0)));
        Ok(values)
    }

    async fn set_field_value(
        &self,
        field_id: &FieldId,
        recipient_id: &RecipientId,
        value: serde_json::Value,
        at: DateTime<Utc>,
    ) -> StorageResult<u64> {
        let mut guard = self
            .fields
            .write()
            .map_err(|_| StorageError::Backend("fields lock poisoned".to_string()))?;

        // Compound match: a patch for someone else's field affects zero
        // rows and is reported as such, never as an error.
        match guard.get_mut(field_id) {
            Some(field) if &field.recipient_id == recipient_id => {
                field.value = Some(value);
                field.signed_at = Some(at);
                field.updated_at = at;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySignflowStorage {
    async fn insert_session(&self, session: SigningSession) -> StorageResult<()> {
        let mut guard = self
            .sessions
            .write()
            .map_err(|_| StorageError::Backend("sessions lock poisoned".to_string()))?;

        // Uniqueness constraint on the token column, as defense in depth.
        if guard.values().any(|s| s.token == session.token) {
            return Err(StorageError::Conflict("session token collision".to_string()));
        }
        guard.insert(session.id.clone(), session);
        Ok(())
    }

    async fn find_session_by_token(&self, token: &str) -> StorageResult<Option<SigningSession>> {
        let guard = self
            .sessions
            .read()
            .map_err(|_| StorageError::Backend("sessions lock poisoned".to_string()))?;
        Ok(guard.values().find(|s| s.token == token).cloned())
    }

    async fn find_session_for_recipient(
        &self,
        recipient_id: &RecipientId,
    ) -> StorageResult<Option<SigningSession>> {
        let guard = self
            .sessions
            .read()
            .map_err(|_| StorageError::Backend("sessions lock poisoned".to_string()))?;
        let mut sessions = guard
            .values()
            .filter(|s| &s.recipient_id == recipient_id)
            .cloned()
            .collect::<Vec<_>>();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions.into_iter().next())
    }

    async fn consume_session(
        &self,
        id: &SessionId,
        used_at: DateTime<Utc>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> StorageResult<()> {
        let mut guard = self
            .sessions
            .write()
            .map_err(|_| StorageError::Backend("sessions lock poisoned".to_string()))?;
        let session = guard
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("session {} not found", id)))?;
        session.used_at = Some(used_at);
        session.ip_address = ip_address;
        session.user_agent = user_agent;
        Ok(())
    }
}

#[async_trait]
impl DownloadTokenStore for InMemorySignflowStorage {
    async fn insert_download_token(&self, token: DownloadToken) -> StorageResult<()> {
        let mut guard = self
            .download_tokens
            .write()
            .map_err(|_| StorageError::Backend("download tokens lock poisoned".to_string()))?;
        if guard.values().any(|t| t.token == token.token) {
            return Err(StorageError::Conflict(
                "download token collision".to_string(),
            ));
        }
        guard.insert(token.id.clone(), token);
        Ok(())
    }

    async fn find_download_token(&self, token: &str) -> StorageResult<Option<DownloadToken>> {
        let guard = self
            .download_tokens
            .read()
            .map_err(|_| StorageError::Backend("download tokens lock poisoned".to_string()))?;
        Ok(guard.values().find(|t| t.token == token).cloned())
    }

    async fn mark_download_used(&self, id: &str, used_at: DateTime<Utc>) -> StorageResult<()> {
        let mut guard = self
            .download_tokens
            .write()
            .map_err(|_| StorageError::Backend("download tokens lock poisoned".to_string()))?;
        let token = guard
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("download token {} not found", id)))?;
        if token.used_at.is_none() {
            token.used_at = Some(used_at);
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for InMemorySignflowStorage {
    async fn insert_file(&self, file: DocumentFile) -> StorageResult<()> {
        let mut guard = self
            .files
            .write()
            .map_err(|_| StorageError::Backend("files lock poisoned".to_string()))?;
        guard.push(file);
        Ok(())
    }

    async fn find_file(
        &self,
        document_id: &DocumentId,
        kind: FileKind,
    ) -> StorageResult<Option<DocumentFile>> {
        let guard = self
            .files
            .read()
            .map_err(|_| StorageError::Backend("files lock poisoned".to_string()))?;
        Ok(guard
            .iter()
            .filter(|f| &f.document_id == document_id && f.kind == kind)
            .max_by_key(|f| f.created_at)
            .cloned())
    }
}

#[async_trait]
impl UserStore for InMemorySignflowStorage {
    async fn insert_user(&self, user: User) -> StorageResult<()> {
        let mut guard = self
            .users
            .write()
            .map_err(|_| StorageError::Backend("users lock poisoned".to_string()))?;
        guard.insert(user.id.clone(), user);
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> StorageResult<Option<User>> {
        let guard = self
            .users
            .read()
            .map_err(|_| StorageError::Backend("users lock poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }
}

#[async_trait]
impl AuditStore for InMemorySignflowStorage {
    async fn append_event(&self, event: AuditEventDraft) -> StorageResult<AuditEvent> {
        let mut guard = self
            .audits
            .write()
            .map_err(|_| StorageError::Backend("audit lock poisoned".to_string()))?;

        let sequence = guard.len() as u64 + 1;
        let record = AuditEvent {
            id: format!("audit-{}", Uuid::new_v4()),
            organization_id: event.organization_id,
            document_id: event.document_id,
            event_type: event.event_type,
            actor_user_id: event.actor_user_id,
            actor_email: event.actor_email,
            actor_name: event.actor_name,
            recipient_id: event.recipient_id,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            metadata: event.metadata,
            created_at: Utc::now(),
        };
        guard.push(SequencedEvent {
            sequence,
            event: record.clone(),
        });
        Ok(record)
    }

    async fn list_events(&self, document_id: &DocumentId) -> StorageResult<Vec<AuditEvent>> {
        let guard = self
            .audits
            .read()
            .map_err(|_| StorageError::Backend("audit lock poisoned".to_string()))?;
        let mut values = guard
            .iter()
            .filter(|s| s.event.document_id.as_ref() == Some(document_id))
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| {
            a.event
                .created_at
                .cmp(&b.event.created_at)
                .then(a.sequence.cmp(&b.sequence))
        });
        Ok(values.into_iter().map(|s| s.event).collect())
    }

    async fn list_org_events(
        &self,
        organization_id: &OrganizationId,
        window: QueryWindow,
    ) -> StorageResult<Vec<AuditEvent>> {
        let guard = self
            .audits
            .read()
            .map_err(|_| StorageError::Backend("audit lock poisoned".to_string()))?;
        let mut values = guard
            .iter()
            .filter(|s| s.event.organization_id.as_ref() == Some(organization_id))
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        Ok(apply_window(
            values.into_iter().map(|s| s.event).collect(),
            window,
        ))
    }
}

fn apply_window<T>(items: Vec<T>, window: QueryWindow) -> Vec<T> {
    let iter = items.into_iter().skip(window.offset);
    if window.limit == 0 {
        iter.collect()
    } else {
        iter.take(window.limit).collect()
    }
}
