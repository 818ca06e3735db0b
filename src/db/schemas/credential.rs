//! Credential document schema
//!
//! Identity-provider-internal storage: maps a sign-in email to an Argon2
//! password hash and the opaque session subject (the profile id). Kept
//! separate from the profiles collection so the profile store holds only
//! what the application reads.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for credentials
pub const CREDENTIAL_COLLECTION: &str = "credentials";

/// Credential document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CredentialDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Sign-in email (unique)
    pub email: String,

    /// Argon2 password hash
    pub password_hash: String,

    /// Session subject: the profile id this credential signs in as
    pub user_id: String,

    /// Whether the account is active
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl CredentialDoc {
    /// Create a new credential document
    pub fn new(email: String, password_hash: String, user_id: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            email,
            password_hash,
            user_id,
            is_active: true,
        }
    }
}

impl IntoIndexes for CredentialDoc {
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
            // Index on user_id for lookups
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for CredentialDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
