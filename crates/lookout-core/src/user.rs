//! Ambient user identity.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Context;

/// The user the session is attributed to.
///
/// Serialized under the `usr` key of finalized events; an empty user is
/// omitted entirely. Unknown attributes are kept in `custom` and flattened
/// alongside the standard fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Stable user identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Any additional attributes.
    #[serde(flatten)]
    pub custom: Context,
}

impl User {
    /// Whether no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none() && self.email.is_none() && self.custom.is_empty()
    }

    /// Render as a context object.
    #[must_use]
    pub fn to_context(&self) -> Context {
        let mut context = Context::new();
        if let Some(id) = &self.id {
            let _ = context.insert("id".to_owned(), Value::String(id.clone()));
        }
        if let Some(name) = &self.name {
            let _ = context.insert("name".to_owned(), Value::String(name.clone()));
        }
        if let Some(email) = &self.email {
            let _ = context.insert("email".to_owned(), Value::String(email.clone()));
        }
        for (key, value) in &self.custom {
            let _ = context.insert(key.clone(), value.clone());
        }
        context
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
