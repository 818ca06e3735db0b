//! Procedure document schema
//!
//! A procedure is an organizational instruction distilled from a chat
//! message. Status is a free-form lifecycle label: any status may be set to
//! any other, there is no enforced transition graph.

use bson::{doc, oid::ObjectId, Document};
use chrono::NaiveDate;
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for procedures
pub const PROCEDURE_COLLECTION: &str = "procedures";

/// Lifecycle status of a procedure
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureStatus {
    /// In force; the only status that accepts acknowledgments
    #[default]
    Active,
    /// No longer in force
    Archived,
    /// Superseded by a newer procedure
    Replaced,
}

impl fmt::Display for ProcedureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcedureStatus::Active => write!(f, "active"),
            ProcedureStatus::Archived => write!(f, "archived"),
            ProcedureStatus::Replaced => write!(f, "replaced"),
        }
    }
}

/// Procedure document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ProcedureDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Title (required, non-empty)
    pub title: String,

    /// Body text, typically the pasted chat message (may be empty)
    #[serde(default)]
    pub description: String,

    /// Where the procedure came from (free text; the UI suggests
    /// Teams/Slack/WhatsApp/Email/Other but nothing is enforced)
    #[serde(default)]
    pub source: String,

    /// Link back to the originating message (optional)
    #[serde(default)]
    pub source_link: String,

    /// Calendar date the procedure takes effect
    pub effective_date: NaiveDate,

    /// Lifecycle status
    #[serde(default)]
    pub status: ProcedureStatus,

    /// Profile id of the creator; None if unknown
    #[serde(default)]
    pub created_by: Option<String>,
}

impl ProcedureDoc {
    /// Create a new procedure record
    ///
    /// Newly created procedures always start active; status only becomes
    /// editable on an existing record.
    pub fn new(
        title: String,
        description: String,
        source: String,
        source_link: String,
        effective_date: NaiveDate,
        created_by: String,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            title,
            description,
            source,
            source_link,
            effective_date,
            status: ProcedureStatus::Active,
            created_by: Some(created_by),
        }
    }

    /// Hex string form of the document id, if assigned
    pub fn id_hex(&self) -> Option<String> {
        self._id.map(|id| id.to_hex())
    }
}

impl IntoIndexes for ProcedureDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Creation-order listing
            (
                doc! { "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("created_at_desc".to_string())
                        .build(),
                ),
            ),
            // Status filter
            (
                doc! { "status": 1 },
                Some(
                    IndexOptions::builder()
                        .name("status_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ProcedureDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_procedure_starts_active() {
        let proc = ProcedureDoc::new(
            "New EFT Process".into(),
            "Wire instructions changed".into(),
            "Teams".into(),
            "".into(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            "profile-1".into(),
        );
        assert_eq!(proc.status, ProcedureStatus::Active);
        assert_eq!(proc.created_by.as_deref(), Some("profile-1"));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ProcedureStatus::Replaced).unwrap(),
            "\"replaced\""
        );
        let status: ProcedureStatus = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(status, ProcedureStatus::Archived);
    }

    #[test]
    fn test_effective_date_round_trip() {
        let proc = ProcedureDoc::new(
            "t".into(),
            "".into(),
            "".into(),
            "".into(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "p".into(),
        );
        let json = serde_json::to_string(&proc).unwrap();
        assert!(json.contains("\"effective_date\":\"2024-03-01\""));

        let back: ProcedureDoc = serde_json::from_str(&json).unwrap();
        assert_eq!(back.effective_date, proc.effective_date);
    }
}
