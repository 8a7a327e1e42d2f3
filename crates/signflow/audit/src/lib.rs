//! Audit ledger - the append-only record of who did what, when.
//!
//! This crate provides the ledger facade the rest of SignFlow writes
//! through while delegating persistence to `signflow-storage`. The store
//! trait exposes no update or delete, so the ledger is append-only by
//! construction; ordering comes from the monotonically non-decreasing
//! `created_at` column (insertion sequence breaks ties), not from any
//! explicit counter.

#![deny(unsafe_code)]

mod certificate;
mod describe;

pub use certificate::{Certificate, CertificateError, CertificateEvent, CertificateSigner};
pub use describe::describe;

use signflow_storage::{AuditStore, StorageError};
use signflow_types::{AuditEvent, AuditEventDraft, DocumentId};
use std::sync::Arc;
use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// The audit ledger facade.
pub struct AuditLedger {
    store: Arc<dyn AuditStore>,
}

impl AuditLedger {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Append an event, best-effort: a failed audit write is logged and
    /// swallowed so the primary operation (signature, completion, send)
    /// still succeeds. Compliance-critical callers wanting atomicity use
    /// [`AuditLedger::record_strict`] instead.
    pub async fn record(&self, draft: AuditEventDraft) {
        let event_type = draft.event_type.clone();
        if let Err(error) = self.store.append_event(draft).await {
            tracing::warn!(
                event_type = %event_type,
                %error,
                "failed to append audit event; continuing"
            );
        }
    }

    /// Append an event, propagating storage failure to the caller.
    pub async fn record_strict(&self, draft: AuditEventDraft) -> LedgerResult<AuditEvent> {
        Ok(self.store.append_event(draft).await?)
    }

    /// A document's full causal history, oldest first. Repeated reads only
    /// ever grow: entries are never reordered or removed.
    pub async fn trail(&self, document_id: &DocumentId) -> LedgerResult<Vec<AuditEvent>> {
        Ok(self.store.list_events(document_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signflow_storage::memory::InMemorySignflowStorage;
    use signflow_types::{AuditEventType, OrganizationId};

    #[tokio::test]
    async fn trail_preserves_append_order() {
        let storage = Arc::new(InMemorySignflowStorage::new());
        let ledger = AuditLedger::new(storage);
        let document_id = DocumentId::generate();
        let org = OrganizationId::new("org-1");

        for ty in [
            AuditEventType::DocumentCreated,
            AuditEventType::DocumentSent,
            AuditEventType::RecipientSigned,
            AuditEventType::DocumentCompleted,
        ] {
            ledger
                .record(AuditEventDraft::for_document(
                    ty,
                    org.clone(),
                    document_id.clone(),
                ))
                .await;
        }

        let trail = ledger.trail(&document_id).await.unwrap();
        let types: Vec<&str> = trail.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(
            types,
            vec![
                "document.created",
                "document.sent",
                "recipient.signed",
                "document.completed"
            ]
        );
    }
}
