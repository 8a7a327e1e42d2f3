use signflow_storage::StorageError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Rejections for an inbound public signing request.
///
/// Each variant is a distinct, terminal user-facing state: the causes are
/// operationally different for the person holding the link (nothing to
/// do vs. contact the sender vs. already done), so they must never collapse
/// into a generic error. Checks are evaluated in declaration order; the
/// first failing check wins so the most specific message is shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SessionRejection {
    #[error("Invalid link.")]
    Invalid,

    #[error("Link expired.")]
    Expired,

    #[error("Document voided.")]
    DocumentVoided,

    #[error("Already signed.")]
    AlreadySigned,

    #[error("Declined.")]
    Declined,
}

impl SessionRejection {
    /// Longer explanation rendered on the terminal rejection page.
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionRejection::Invalid => {
                "This signing link is not valid. Please check the link or contact the sender."
            }
            SessionRejection::Expired => {
                "This signing link has expired. Please contact the sender for a new link."
            }
            SessionRejection::DocumentVoided => {
                "This document has been voided and is no longer available for signing."
            }
            SessionRejection::AlreadySigned => {
                "You have already signed this document. Thank you!"
            }
            SessionRejection::Declined => {
                "You declined to sign this document. Contact the sender if this was a mistake."
            }
        }
    }
}

/// Engine-level errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad or missing input; surfaced as a 4xx, never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Document composed without any signer or approver.
    #[error("document requires at least one signer or approver")]
    NoSigners,

    /// Submission arrived with required fields still unset.
    #[error("required fields missing values: {0:?}")]
    MissingRequiredFields(Vec<String>),

    /// Terminal signing-link rejection; maps to its own user-facing state.
    #[error(transparent)]
    Rejected(#[from] SessionRejection),

    /// Terminal download-link rejection.
    #[error(transparent)]
    DownloadRejected(#[from] crate::documents::DownloadRejection),

    #[error("not found: {0}")]
    NotFound(String),

    /// Downstream (email, blob) failure on an operation whose primary
    /// purpose IS the downstream call, e.g. sending a reminder.
    #[error("downstream failure: {0}")]
    Downstream(String),

    /// Storage failure on a required step; fatal to the request.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<signflow_audit::LedgerError> for EngineError {
    fn from(err: signflow_audit::LedgerError) -> Self {
        match err {
            signflow_audit::LedgerError::Storage(e) => EngineError::Storage(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_messages_are_distinct() {
        let variants = [
            SessionRejection::Invalid,
            SessionRejection::Expired,
            SessionRejection::DocumentVoided,
            SessionRejection::AlreadySigned,
            SessionRejection::Declined,
        ];
        for (i, a) in variants.iter().enumerate() {
            for b in variants.iter().skip(i + 1) {
                assert_ne!(a.to_string(), b.to_string());
                assert_ne!(a.user_message(), b.user_message());
            }
        }
    }
}
