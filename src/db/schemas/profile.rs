//! Profile document schema
//!
//! One profile per registered principal, keyed by the opaque session
//! subject. Every profile counts toward the acknowledgment completion
//! denominator, regardless of role.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for profiles
pub const PROFILE_COLLECTION: &str = "profiles";

/// Role of a principal
///
/// Self-selected at registration; there is no invitation or approval flow.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May create and edit procedures
    Admin,
    /// May view and acknowledge procedures
    #[default]
    Staff,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Staff => write!(f, "staff"),
        }
    }
}

/// Profile document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ProfileDoc {
    /// Profile id: the opaque session subject issued at registration
    #[serde(rename = "_id")]
    pub id: String,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Email address (unique)
    pub email: String,

    /// Human-readable display name
    pub full_name: String,

    /// Role of this principal
    #[serde(default)]
    pub role: Role,
}

impl ProfileDoc {
    /// Create a new profile document
    pub fn new(id: String, email: String, full_name: String, role: Role) -> Self {
        Self {
            id,
            metadata: Metadata::new(),
            email,
            full_name,
            role,
        }
    }
}

impl IntoIndexes for ProfileDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on email
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ProfileDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::Staff).unwrap(), "\"staff\"");

        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_default_role_is_staff() {
        assert_eq!(Role::default(), Role::Staff);
    }
}
