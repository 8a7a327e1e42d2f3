//! Human-readable one-line descriptions for audit trail rendering.

use signflow_types::{AuditEvent, AuditEventType};

/// Describe an event for certificate and timeline display.
///
/// Falls back to the raw dotted event type for taxonomy entries this
/// formatter does not know.
pub fn describe(event: &AuditEvent) -> String {
    let actor = event
        .actor_name
        .as_deref()
        .or(event.actor_email.as_deref())
        .unwrap_or("Unknown");

    match &event.event_type {
        AuditEventType::DocumentCreated => "Document created".to_string(),
        AuditEventType::DocumentSent => "Document sent for signature".to_string(),
        AuditEventType::DocumentViewed => format!("Document viewed by {actor}"),
        AuditEventType::DocumentCompleted => {
            "All signatures collected - document completed".to_string()
        }
        AuditEventType::DocumentVoided => "Document voided".to_string(),
        AuditEventType::DocumentDeclined => format!("Document declined by {actor}"),
        AuditEventType::DocumentDownloaded => format!("Signed document downloaded by {actor}"),
        AuditEventType::RecipientSigned => format!("Document signed by {actor}"),
        AuditEventType::RecipientEmailSent => format!("Signature request sent to {actor}"),
        AuditEventType::RecipientReminderSent => format!("Reminder sent to {actor}"),
        AuditEventType::RecipientCompletionEmailSent => {
            format!("Completion email sent to {actor}")
        }
        AuditEventType::FieldUpdated => format!("Field updated by {actor}"),
        AuditEventType::Custom(raw) => raw.clone(),
    }
}
