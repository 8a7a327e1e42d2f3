//! Outbound email boundary for SignFlow.
//!
//! The engine treats notification delivery as best-effort: a failed email
//! must never roll back a signature or block fan-out to the remaining
//! recipients. Callers collect each attempt's `Result` and inspect the
//! list only for logging and audit metadata.

#![deny(unsafe_code)]

mod templates;

pub use templates::{
    completion_email, reminder_email, signature_request_email, void_notice_email, CompletionParams,
    SignatureRequestParams,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

/// Attachments above this size are dropped in favor of a link-only email.
pub const MAX_ATTACHMENT_BYTES: u64 = 8 * 1024 * 1024;

/// Result type for dispatch operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Delivery failures. Always transient from the engine's point of view:
/// logged and audited, never propagated past the fan-out collector.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("email rejected for {to}: {reason}")]
    Rejected { to: String, reason: String },

    #[error("email provider unavailable: {0}")]
    Unavailable(String),
}

/// Base64-encoded attachment payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_base64: String,
}

/// One outbound email.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<EmailAttachment>,
}

/// Email delivery boundary.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: EmailMessage) -> NotifyResult<()>;
}

/// Notifier used when no provider is configured: logs the message and
/// reports success so workflows behave identically in development.
#[derive(Default)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, message: EmailMessage) -> NotifyResult<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "email provider not configured; message logged"
        );
        Ok(())
    }
}

/// Test fake that records every message and can be scripted to fail for
/// specific addresses.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `address` fail with a rejection.
    pub fn fail_for(&self, address: impl Into<String>) {
        self.failing.lock().expect("failing lock").push(address.into());
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<EmailMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.to == address)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: EmailMessage) -> NotifyResult<()> {
        let failing = self.failing.lock().expect("failing lock");
        if failing.iter().any(|a| a == &message.to) {
            return Err(NotifyError::Rejected {
                to: message.to,
                reason: "scripted failure".to_string(),
            });
        }
        drop(failing);
        self.sent.lock().expect("sent lock").push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_notifier_captures_messages() {
        let notifier = RecordingNotifier::new();
        notifier
            .send(EmailMessage {
                to: "a@example.com".to_string(),
                subject: "hello".to_string(),
                html: "<p>hi</p>".to_string(),
                attachments: vec![],
            })
            .await
            .unwrap();

        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(notifier.sent_to("a@example.com").len(), 1);
    }

    #[tokio::test]
    async fn scripted_failures_reject_without_recording() {
        let notifier = RecordingNotifier::new();
        notifier.fail_for("bounce@example.com");

        let result = notifier
            .send(EmailMessage {
                to: "bounce@example.com".to_string(),
                subject: "hello".to_string(),
                html: String::new(),
                attachments: vec![],
            })
            .await;

        assert!(matches!(result, Err(NotifyError::Rejected { .. })));
        assert!(notifier.sent().is_empty());
    }
}
