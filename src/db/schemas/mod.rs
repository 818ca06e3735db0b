//! Database schemas for Procedure Hub
//!
//! Defines MongoDB document structures for credentials, profiles,
//! procedures, and acknowledgments.

mod acknowledgment;
mod credential;
mod metadata;
mod procedure;
mod profile;

pub use acknowledgment::{AcknowledgmentDoc, ACKNOWLEDGMENT_COLLECTION};
pub use credential::{CredentialDoc, CREDENTIAL_COLLECTION};
pub use metadata::Metadata;
pub use procedure::{ProcedureDoc, ProcedureStatus, PROCEDURE_COLLECTION};
pub use profile::{ProfileDoc, Role, PROFILE_COLLECTION};
