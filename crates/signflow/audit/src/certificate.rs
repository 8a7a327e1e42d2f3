//! Completion certificate assembly.
//!
//! The certificate is a derived view over a completed document and its
//! audit trail - nothing here is stored. Its identifier is deterministic
//! (`CERT-` + first 8 hex characters of the document id, uppercased) so it
//! can be recomputed from the document id alone.

use crate::describe;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signflow_types::{certificate_id, AuditEvent, Document, DocumentId, DocumentStatus, Recipient};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("certificate only available for completed documents (status: {0})")]
    NotCompleted(DocumentStatus),
}

/// One signer line on the certificate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CertificateSigner {
    pub name: String,
    pub email: String,
    pub signed_at: Option<DateTime<Utc>>,
}

/// Entry in the certificate's audit section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CertificateEvent {
    pub event: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub metadata: serde_json::Value,
}

/// The tamper-evident completion certificate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Certificate {
    pub certificate_id: String,
    pub document_id: DocumentId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub signers: Vec<CertificateSigner>,
    pub audit_trail: Vec<CertificateEvent>,
    pub generated_at: DateTime<Utc>,
}

impl Certificate {
    /// Assemble a certificate for a completed document.
    pub fn assemble(
        document: &Document,
        recipients: &[Recipient],
        trail: &[AuditEvent],
    ) -> Result<Self, CertificateError> {
        if document.status != DocumentStatus::Completed {
            return Err(CertificateError::NotCompleted(document.status));
        }

        Ok(Self {
            certificate_id: certificate_id(&document.id),
            document_id: document.id.clone(),
            title: document.title.clone(),
            created_at: document.created_at,
            completed_at: document.completed_at,
            signers: recipients
                .iter()
                .filter(|r| r.role.requires_signature())
                .map(|r| CertificateSigner {
                    name: r.name.clone(),
                    email: r.email.clone(),
                    signed_at: r.signed_at,
                })
                .collect(),
            audit_trail: trail
                .iter()
                .map(|e| CertificateEvent {
                    event: e.event_type.as_str().to_string(),
                    description: describe(e),
                    timestamp: e.created_at,
                    ip_address: e.ip_address.clone(),
                    metadata: e.metadata.clone(),
                })
                .collect(),
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signflow_types::{
        OrganizationId, RecipientId, RecipientRole, RecipientStatus, SigningOrder, UserId,
    };

    fn completed_document() -> Document {
        let now = Utc::now();
        Document {
            id: DocumentId::new("deadbeef-1111-2222-3333-444444444444"),
            organization_id: OrganizationId::new("org-1"),
            created_by: UserId::new("user-1"),
            title: "NDA".to_string(),
            description: None,
            status: DocumentStatus::Completed,
            signing_order: SigningOrder::Parallel,
            expires_at: None,
            completed_at: Some(now),
            voided_at: None,
            voided_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn recipient(role: RecipientRole) -> Recipient {
        let now = Utc::now();
        Recipient {
            id: RecipientId::generate(),
            document_id: DocumentId::new("deadbeef-1111-2222-3333-444444444444"),
            contact_id: None,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role,
            signing_order: 1,
            status: RecipientStatus::Signed,
            viewed_at: None,
            signed_at: Some(now),
            declined_at: None,
            decline_reason: None,
            last_reminded_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn certificate_excludes_cc_from_signers() {
        let certificate = Certificate::assemble(
            &completed_document(),
            &[recipient(RecipientRole::Signer), recipient(RecipientRole::Cc)],
            &[],
        )
        .unwrap();

        assert_eq!(certificate.certificate_id, "CERT-DEADBEEF");
        assert_eq!(certificate.signers.len(), 1);
    }

    #[test]
    fn incomplete_documents_get_no_certificate() {
        let mut document = completed_document();
        document.status = DocumentStatus::Pending;
        document.completed_at = None;

        let result = Certificate::assemble(&document, &[], &[]);
        assert!(matches!(result, Err(CertificateError::NotCompleted(_))));
    }
}
