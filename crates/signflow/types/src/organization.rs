use crate::ids::{OrganizationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tenant boundary. Owns documents, contacts, users, and templates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub slug: String,
    pub settings: OrgSettings,
    pub created_at: DateTime<Utc>,
}

/// Per-organization signing configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OrgSettings {
    /// Signing-link lifetime in days. Validated to 1..=30 by the engine;
    /// `None` falls back to the 7-day default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expiry_days: Option<u32>,
    /// Days after send at which automatic reminders fire.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reminder_days: Vec<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Owner,
    Admin,
    Member,
}

/// An internal (authenticated) user of the sending organization.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub organization_id: OrganizationId,
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Display name used in outbound email ("sender name").
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.email)
    }
}
