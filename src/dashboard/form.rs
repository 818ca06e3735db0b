//! Procedure editor form state
//!
//! A single explicit record type for both create and edit submissions, with
//! a structured validation result instead of ad hoc string checks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::schemas::{ProcedureDoc, ProcedureStatus};

/// Advisory source suggestions shown by clients. Free text is accepted;
/// nothing is validated against this list.
pub const SOURCE_SUGGESTIONS: [&str; 5] = ["Teams", "Slack", "WhatsApp", "Email", "Other"];

/// A single field-level validation failure
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the offending field
    pub field: &'static str,
    /// What is wrong with it
    pub message: &'static str,
}

/// Editor form state for creating or editing a procedure
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ProcedureForm {
    /// Title (required)
    #[serde(default)]
    pub title: String,

    /// Body text (optional)
    #[serde(default)]
    pub description: String,

    /// Origin of the procedure (optional, free text)
    #[serde(default)]
    pub source: String,

    /// Link back to the originating message (optional)
    #[serde(default)]
    pub source_link: String,

    /// Effective calendar date (required)
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,

    /// Lifecycle status; only honored on edit, creation always starts active
    #[serde(default)]
    pub status: ProcedureStatus,
}

impl ProcedureForm {
    /// Fresh form for create mode: empty fields, today's date, active status
    pub fn for_create(today: NaiveDate) -> Self {
        Self {
            effective_date: Some(today),
            ..Default::default()
        }
    }

    /// Form for edit mode, pre-populated from the record's current values
    pub fn for_edit(procedure: &ProcedureDoc) -> Self {
        Self {
            title: procedure.title.clone(),
            description: procedure.description.clone(),
            source: procedure.source.clone(),
            source_link: procedure.source_link.clone(),
            effective_date: Some(procedure.effective_date),
            status: procedure.status,
        }
    }

    /// Validate the form, returning every field error at once.
    ///
    /// Required fields: title, effective_date. All others are optional.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(FieldError {
                field: "title",
                message: "Title is required",
            });
        }

        if self.effective_date.is_none() {
            errors.push(FieldError {
                field: "effective_date",
                message: "Effective date is required",
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ProcedureForm {
        ProcedureForm {
            title: "New EFT Process".into(),
            effective_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_form_passes() {
        assert!(valid_form().validate().is_ok());
    }

    #[test]
    fn test_missing_title_rejected() {
        let mut form = valid_form();
        form.title = "   ".into();

        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "title");
    }

    #[test]
    fn test_missing_date_rejected() {
        let mut form = valid_form();
        form.effective_date = None;

        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "effective_date");
    }

    #[test]
    fn test_all_errors_reported_at_once() {
        let form = ProcedureForm::default();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_optional_fields_may_be_empty() {
        let form = valid_form();
        assert!(form.description.is_empty());
        assert!(form.source.is_empty());
        assert!(form.source_link.is_empty());
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_create_mode_defaults() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let form = ProcedureForm::for_create(today);

        assert!(form.title.is_empty());
        assert!(form.description.is_empty());
        assert!(form.source.is_empty());
        assert!(form.source_link.is_empty());
        assert_eq!(form.effective_date, Some(today));
        assert_eq!(form.status, ProcedureStatus::Active);
    }

    #[test]
    fn test_edit_mode_prefills_from_record() {
        let mut procedure = ProcedureDoc::new(
            "Badge Access".into(),
            "Front desk issues badges".into(),
            "WhatsApp".into(),
            "https://chat.example/msg/1".into(),
            NaiveDate::from_ymd_opt(2024, 2, 20).unwrap(),
            "profile-1".into(),
        );
        procedure.status = ProcedureStatus::Replaced;

        let form = ProcedureForm::for_edit(&procedure);
        assert_eq!(form.title, "Badge Access");
        assert_eq!(form.description, "Front desk issues badges");
        assert_eq!(form.source, "WhatsApp");
        assert_eq!(form.source_link, "https://chat.example/msg/1");
        assert_eq!(form.effective_date, Some(procedure.effective_date));
        assert_eq!(form.status, ProcedureStatus::Replaced);
    }

    #[test]
    fn test_json_body_with_missing_optionals() {
        let form: ProcedureForm =
            serde_json::from_str(r#"{"title":"T","effective_date":"2024-01-15"}"#).unwrap();
        assert!(form.validate().is_ok());
        assert_eq!(form.status, ProcedureStatus::Active);
    }

    #[test]
    fn test_source_suggestions_are_advisory() {
        assert!(SOURCE_SUGGESTIONS.contains(&"Teams"));

        // Free text outside the suggestion list is accepted
        let mut form = valid_form();
        form.source = "Carrier pigeon".into();
        assert!(form.validate().is_ok());
    }
}
