//! SignFlow domain model.
//!
//! Shared vocabulary for the e-signature workflow: documents and their
//! lifecycle, recipients and roles, field placements, signing sessions,
//! download tokens, and the audit event taxonomy. Everything here is plain
//! data; the state-machine logic lives in `signflow-engine`.

#![deny(unsafe_code)]

mod audit;
mod document;
mod field;
mod ids;
mod organization;
mod recipient;
mod session;

pub use audit::{AuditEvent, AuditEventDraft, AuditEventType};
pub use document::{
    certificate_id, Document, DocumentFile, DocumentStatus, FileKind, SigningOrder,
};
pub use field::{Field, FieldType};
pub use ids::{
    ContactId, DocumentId, FieldId, OrganizationId, RecipientId, SessionId, UserId,
};
pub use organization::{OrgSettings, Organization, User, UserRole};
pub use recipient::{Recipient, RecipientRole, RecipientStatus};
pub use session::{DownloadToken, SigningSession};
