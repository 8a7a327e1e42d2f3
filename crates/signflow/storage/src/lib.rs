//! SignFlow storage abstractions.
//!
//! This crate defines the data access contract the workflow core runs
//! against:
//! - document, recipient, field, and file records (system of record)
//! - signing sessions and download tokens (credential lookup)
//! - an append-only audit event log
//!
//! Design stance:
//! - A transactional backend remains the source of truth in production;
//!   the in-memory adapter here is deterministic and test-friendly.
//! - Cross-request invariants (completion exactly-once, void finality,
//!   duplicate-submit protection) rest on the conditional writes exposed
//!   here, not on in-process locking in the engine.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
mod traits;

pub use error::{StorageError, StorageResult};
pub use traits::{
    AuditStore, DocumentStore, DownloadTokenStore, FieldStore, FileStore, OrganizationStore,
    QueryWindow, RecipientStore, SessionStore, SignflowStorage, UserStore,
};
