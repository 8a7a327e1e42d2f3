//! SignFlow engine: the signing-session state machine and
//! completion-consistency core.
//!
//! The engine coordinates the document workflow; it never renders UI,
//! stores PDF bytes, or talks to an email provider directly. Persistence
//! goes through the `signflow-storage` traits, email through the
//! `signflow-notify` boundary, and every state change lands in the
//! append-only audit ledger.
//!
//! # Key invariants
//!
//! - A signing token authorizes exactly one recipient on one document and
//!   stops working the moment that recipient's status is `signed`.
//! - Document completion is decided against a fresh read of recipient
//!   statuses and committed with a conditional status write, so two
//!   recipients finishing simultaneously complete the document exactly
//!   once - completion fan-out runs only for the caller that won the
//!   conditional write.
//! - Notification failures are isolated per recipient and never roll back
//!   or block a state transition.
//!
//! # Architecture
//!
//! [`SignflowEngine`] composes specialized components:
//!
//! - [`SigningSessionManager`] — mints, validates, and consumes
//!   per-recipient signing sessions
//! - [`DocumentService`] — create/send/void/remind/certificate/download
//! - [`SigningWorkflow`] — the submit-signature pipeline and the
//!   completion evaluator

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod blob;
mod config;
mod context;
mod documents;
mod error;
mod session;
mod signing;

pub use blob::{BlobError, BlobFetcher, NoopBlobFetcher, StaticBlobFetcher};
pub use config::SignflowConfig;
pub use context::{Actor, RequestMeta};
pub use documents::{
    DocumentDraft, DocumentService, DownloadGrant, DownloadRejection, FieldSpec, FileSpec,
    RecipientSpec, SendOutcome,
};
pub use error::{EngineError, EngineResult, SessionRejection};
pub use session::{SigningRoomView, SigningSessionManager, ValidatedSession};
pub use signing::{NotifyFailure, SigningWorkflow, SubmitOutcome};

use signflow_audit::AuditLedger;
use signflow_notify::Notifier;
use signflow_storage::SignflowStorage;
use signflow_types::{AuditEvent, DocumentId};
use std::sync::Arc;

/// Facade wiring the engine components to one storage backend, one
/// notifier, and one configuration. All dependencies are injected; there
/// is no ambient global state, so tests can stand up a full engine per
/// case.
pub struct SignflowEngine {
    sessions: Arc<SigningSessionManager>,
    documents: DocumentService,
    signing: SigningWorkflow,
    ledger: Arc<AuditLedger>,
}

impl SignflowEngine {
    pub fn new<S>(
        storage: Arc<S>,
        notifier: Arc<dyn Notifier>,
        blobs: Arc<dyn BlobFetcher>,
        config: SignflowConfig,
    ) -> Self
    where
        S: SignflowStorage + 'static,
    {
        let store: Arc<dyn SignflowStorage> = storage.clone();
        let ledger = Arc::new(AuditLedger::new(storage));
        let sessions = Arc::new(SigningSessionManager::new(
            store.clone(),
            ledger.clone(),
            config.clone(),
        ));
        let documents = DocumentService::new(
            store.clone(),
            ledger.clone(),
            notifier.clone(),
            sessions.clone(),
            config.clone(),
        );
        let signing = SigningWorkflow::new(
            store,
            ledger.clone(),
            notifier,
            blobs,
            sessions.clone(),
            config,
        );
        Self {
            sessions,
            documents,
            signing,
            ledger,
        }
    }

    pub fn sessions(&self) -> &SigningSessionManager {
        &self.sessions
    }

    pub fn documents(&self) -> &DocumentService {
        &self.documents
    }

    pub fn signing(&self) -> &SigningWorkflow {
        &self.signing
    }

    /// A document's audit trail in causal order.
    pub async fn trail(&self, document_id: &DocumentId) -> EngineResult<Vec<AuditEvent>> {
        Ok(self.ledger.trail(document_id).await?)
    }
}
