//! Common metadata for all documents
//!
//! Tracks creation and update timestamps. No entity in this system is ever
//! deleted, so there is no deletion bookkeeping.

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Common metadata for all documents
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    /// When the document was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    /// When the document was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    /// Create new metadata with current timestamp
    pub fn new() -> Self {
        Self {
            updated_at: Some(DateTime::now()),
            created_at: Some(DateTime::now()),
        }
    }
}
