//! Acknowledgment document schema
//!
//! Records the fact "user U acknowledged procedure P at time T". Written
//! once, never updated, never deleted. The unique compound index on
//! (procedure_id, user_id) is the authoritative guarantee that a principal
//! acknowledges a procedure at most once; application-level checks are
//! advisory only.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for acknowledgments
pub const ACKNOWLEDGMENT_COLLECTION: &str = "acknowledgments";

/// Acknowledgment document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AcknowledgmentDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// The acknowledged procedure
    pub procedure_id: ObjectId,

    /// The acknowledging principal's profile id
    pub user_id: String,

    /// When the acknowledgment was recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime>,
}

impl AcknowledgmentDoc {
    /// Create a new acknowledgment record
    pub fn new(procedure_id: ObjectId, user_id: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            procedure_id,
            user_id,
            acknowledged_at: Some(DateTime::now()),
        }
    }
}

impl IntoIndexes for AcknowledgmentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // At most one acknowledgment per (procedure, user)
            (
                doc! { "procedure_id": 1, "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("procedure_user_unique".to_string())
                        .build(),
                ),
            ),
            // Per-user lookups
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

impl MutMetadata for AcknowledgmentDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_index_declared() {
        let indices = AcknowledgmentDoc::into_indices();
        let (keys, opts) = &indices[0];
        assert_eq!(keys.get_i32("procedure_id").unwrap(), 1);
        assert_eq!(keys.get_i32("user_id").unwrap(), 1);
        assert_eq!(opts.as_ref().unwrap().unique, Some(true));
    }

    #[test]
    fn test_acknowledged_at_assigned_at_creation() {
        let ack = AcknowledgmentDoc::new(ObjectId::new(), "profile-1".into());
        assert!(ack.acknowledged_at.is_some());
    }
}
