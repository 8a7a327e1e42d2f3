use crate::ids::{DocumentId, FieldId, RecipientId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of value a field collects at signing time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Signature,
    Initials,
    Date,
    Name,
    Email,
    Text,
    Checkbox,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FieldType::Signature => "signature",
            FieldType::Initials => "initials",
            FieldType::Date => "date",
            FieldType::Name => "name",
            FieldType::Email => "email",
            FieldType::Text => "text",
            FieldType::Checkbox => "checkbox",
        };
        write!(f, "{s}")
    }
}

/// One field placement on a document page.
///
/// Coordinates and dimensions are percentages (0–100) of the page, so
/// placements survive any render size. A field is owned by exactly one
/// recipient; no other recipient may write its value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub document_id: DocumentId,
    pub recipient_id: RecipientId,
    pub kind: FieldType,
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub required: bool,
    pub placeholder: Option<String>,
    /// Opaque answer value: a scalar for text-like fields, a data-URI image
    /// payload for signature/initials. Written once, at signing time.
    pub value: Option<serde_json::Value>,
    pub signed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Field {
    /// A value is considered present when it is set and non-null.
    pub fn has_value(&self) -> bool {
        self.value
            .as_ref()
            .map(|v| !v.is_null())
            .unwrap_or(false)
    }
}
