use crate::ids::{ContactId, DocumentId, RecipientId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a recipient is asked to do.
///
/// `Signer` and `Approver` are functionally identical for completion
/// purposes: both must sign before the document completes. `Cc` recipients
/// never sign and are excluded from every completion computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientRole {
    Signer,
    Approver,
    Cc,
}

impl RecipientRole {
    /// True for roles counted toward document completion.
    pub fn requires_signature(&self) -> bool {
        matches!(self, RecipientRole::Signer | RecipientRole::Approver)
    }
}

/// Per-recipient progression. Advances monotonically
/// (pending → sent → viewed → signed); `Declined` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientStatus {
    Pending,
    Sent,
    Viewed,
    Signed,
    Declined,
}

impl std::fmt::Display for RecipientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecipientStatus::Pending => "pending",
            RecipientStatus::Sent => "sent",
            RecipientStatus::Viewed => "viewed",
            RecipientStatus::Signed => "signed",
            RecipientStatus::Declined => "declined",
        };
        write!(f, "{s}")
    }
}

/// A named participant attached to one document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientId,
    pub document_id: DocumentId,
    pub contact_id: Option<ContactId>,
    pub name: String,
    pub email: String,
    pub role: RecipientRole,
    /// Position in a sequential signing order; informational for parallel.
    pub signing_order: u32,
    pub status: RecipientStatus,
    pub viewed_at: Option<DateTime<Utc>>,
    pub signed_at: Option<DateTime<Utc>>,
    pub declined_at: Option<DateTime<Utc>>,
    pub decline_reason: Option<String>,
    pub last_reminded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipient {
    pub fn has_signed(&self) -> bool {
        self.status == RecipientStatus::Signed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cc_does_not_require_signature() {
        assert!(RecipientRole::Signer.requires_signature());
        assert!(RecipientRole::Approver.requires_signature());
        assert!(!RecipientRole::Cc.requires_signature());
    }
}
