use crate::ids::{DocumentId, OrganizationId, RecipientId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Namespaced audit event taxonomy.
///
/// Closed but extensible: known events get a variant, anything else rides
/// in `Custom`. Serialized as the dotted string form
/// (e.g. `"document.completed"`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuditEventType {
    DocumentCreated,
    DocumentSent,
    DocumentViewed,
    DocumentCompleted,
    DocumentVoided,
    DocumentDeclined,
    DocumentDownloaded,
    RecipientSigned,
    RecipientEmailSent,
    RecipientReminderSent,
    RecipientCompletionEmailSent,
    FieldUpdated,
    Custom(String),
}

impl AuditEventType {
    pub fn as_str(&self) -> &str {
        match self {
            AuditEventType::DocumentCreated => "document.created",
            AuditEventType::DocumentSent => "document.sent",
            AuditEventType::DocumentViewed => "document.viewed",
            AuditEventType::DocumentCompleted => "document.completed",
            AuditEventType::DocumentVoided => "document.voided",
            AuditEventType::DocumentDeclined => "document.declined",
            AuditEventType::DocumentDownloaded => "document.downloaded",
            AuditEventType::RecipientSigned => "recipient.signed",
            AuditEventType::RecipientEmailSent => "recipient.email_sent",
            AuditEventType::RecipientReminderSent => "recipient.reminder_sent",
            AuditEventType::RecipientCompletionEmailSent => "recipient.completion_email_sent",
            AuditEventType::FieldUpdated => "field.updated",
            AuditEventType::Custom(s) => s,
        }
    }
}

impl From<&str> for AuditEventType {
    fn from(s: &str) -> Self {
        match s {
            "document.created" => AuditEventType::DocumentCreated,
            "document.sent" => AuditEventType::DocumentSent,
            "document.viewed" => AuditEventType::DocumentViewed,
            "document.completed" => AuditEventType::DocumentCompleted,
            "document.voided" => AuditEventType::DocumentVoided,
            "document.declined" => AuditEventType::DocumentDeclined,
            "document.downloaded" => AuditEventType::DocumentDownloaded,
            "recipient.signed" => AuditEventType::RecipientSigned,
            "recipient.email_sent" => AuditEventType::RecipientEmailSent,
            "recipient.reminder_sent" => AuditEventType::RecipientReminderSent,
            "recipient.completion_email_sent" => AuditEventType::RecipientCompletionEmailSent,
            "field.updated" => AuditEventType::FieldUpdated,
            other => AuditEventType::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for AuditEventType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AuditEventType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(AuditEventType::from(s.as_str()))
    }
}

/// One entry in the append-only audit ledger: who did what, when, from
/// where. Never updated or deleted; the canonical legal record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub organization_id: Option<OrganizationId>,
    pub document_id: Option<DocumentId>,
    pub event_type: AuditEventType,
    pub actor_user_id: Option<UserId>,
    pub actor_email: Option<String>,
    pub actor_name: Option<String>,
    pub recipient_id: Option<RecipientId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Event as submitted for append; storage assigns the id and timestamp.
#[derive(Clone, Debug)]
pub struct AuditEventDraft {
    pub organization_id: Option<OrganizationId>,
    pub document_id: Option<DocumentId>,
    pub event_type: AuditEventType,
    pub actor_user_id: Option<UserId>,
    pub actor_email: Option<String>,
    pub actor_name: Option<String>,
    pub recipient_id: Option<RecipientId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: serde_json::Value,
}

impl AuditEventDraft {
    /// Bare event of the given type; callers fill in attribution.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            organization_id: None,
            document_id: None,
            event_type,
            actor_user_id: None,
            actor_email: None,
            actor_name: None,
            recipient_id: None,
            ip_address: None,
            user_agent: None,
            metadata: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    pub fn for_document(
        event_type: AuditEventType,
        organization_id: OrganizationId,
        document_id: DocumentId,
    ) -> Self {
        let mut draft = Self::new(event_type);
        draft.organization_id = Some(organization_id);
        draft.document_id = Some(document_id);
        draft
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
