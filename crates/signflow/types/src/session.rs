use crate::ids::{DocumentId, RecipientId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token-bound, time-limited authorization for one recipient to submit
/// field values for one document.
///
/// Exactly one active session is expected per signer/approver recipient:
/// resending a document reuses the existing unexpired session rather than
/// rotating its token. `used_at` is informational (audit) only; re-access
/// after submission is rejected on the recipient's `signed` status, not on
/// `used_at`. Sessions are never deleted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SigningSession {
    pub id: SessionId,
    pub recipient_id: RecipientId,
    pub document_id: DocumentId,
    /// Opaque 32-byte token, hex-encoded to 64 characters.
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SigningSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Post-completion credential granting access to the final signed PDF.
///
/// Minted once per completion-email recipient (signers, cc, and the
/// sender, de-duplicated by email) with a 90-day window — deliberately
/// longer-lived than a signing session because a finished document is less
/// sensitive than a pending signing obligation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadToken {
    pub id: String,
    pub document_id: DocumentId,
    pub recipient_id: Option<RecipientId>,
    pub email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DownloadToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
