use crate::ids::{DocumentId, OrganizationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document lifecycle status.
///
/// Created as `Draft`, moves to `Pending` when sent, to `Completed` when
/// every required recipient has signed, or to `Voided` on explicit
/// cancellation. `Voided` and `Completed` are terminal. `Expired` is
/// reserved for documents whose `expires_at` passes before completion;
/// nothing produces it yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Pending,
    Completed,
    Voided,
    Expired,
}

impl DocumentStatus {
    /// Terminal statuses admit no further transition except audit append.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Voided)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Pending => "pending",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Voided => "voided",
            DocumentStatus::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

/// Whether recipients sign in a fixed sequence or all at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningOrder {
    Sequential,
    Parallel,
}

/// One document moving through the signing workflow.
///
/// Invariant: `completed_at` and `voided_at` are mutually exclusive; once
/// either is set the document is immutable apart from audit append.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub organization_id: OrganizationId,
    pub created_by: UserId,
    pub title: String,
    pub description: Option<String>,
    pub status: DocumentStatus,
    pub signing_order: SigningOrder,
    pub expires_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub voided_at: Option<DateTime<Utc>>,
    pub voided_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored PDF variant for a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// The uploaded source PDF rendered in the signing room.
    Original,
    /// The flattened PDF produced at completion.
    Signed,
}

/// Reference to PDF bytes held in object storage. The workflow core only
/// ever carries the URL and filename, never the bytes themselves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentFile {
    pub id: String,
    pub document_id: DocumentId,
    pub kind: FileKind,
    pub url: String,
    pub filename: String,
    pub size_bytes: Option<u64>,
    pub page_count: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Deterministic certificate identifier: `CERT-` plus the first 8 hex
/// characters of the document id, uppercased. Derived on demand, never
/// stored.
pub fn certificate_id(document_id: &DocumentId) -> String {
    let prefix: String = document_id
        .as_str()
        .chars()
        .take(8)
        .collect::<String>()
        .to_uppercase();
    format!("CERT-{prefix}")
}
