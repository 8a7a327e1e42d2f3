use signflow_types::{AuditEventDraft, Recipient, User, UserId};

/// Who performs a mutation, for audit attribution.
#[derive(Clone, Debug)]
pub enum Actor {
    /// An authenticated internal user of the sending organization.
    User {
        id: UserId,
        email: String,
        name: Option<String>,
    },
    /// A recipient acting through a signing link.
    Recipient {
        id: signflow_types::RecipientId,
        name: String,
        email: String,
    },
    /// The system itself (scheduled or derived actions).
    System,
}

impl Actor {
    pub fn from_user(user: &User) -> Self {
        Actor::User {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.full_name.clone(),
        }
    }

    pub fn from_recipient(recipient: &Recipient) -> Self {
        Actor::Recipient {
            id: recipient.id.clone(),
            name: recipient.name.clone(),
            email: recipient.email.clone(),
        }
    }

    /// Stamp actor identity onto an audit draft.
    pub fn apply_to(&self, mut draft: AuditEventDraft) -> AuditEventDraft {
        match self {
            Actor::User { id, email, name } => {
                draft.actor_user_id = Some(id.clone());
                draft.actor_email = Some(email.clone());
                draft.actor_name = name.clone();
            }
            Actor::Recipient { id, name, email } => {
                draft.recipient_id = Some(id.clone());
                draft.actor_email = Some(email.clone());
                draft.actor_name = Some(name.clone());
            }
            Actor::System => {}
        }
        draft
    }
}

/// Network origin of an inbound request, recorded for the audit trail.
#[derive(Clone, Debug, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }

    /// Stamp network origin onto an audit draft.
    pub fn apply_to(&self, mut draft: AuditEventDraft) -> AuditEventDraft {
        draft.ip_address = self.ip_address.clone();
        draft.user_agent = self.user_agent.clone();
        draft
    }
}
