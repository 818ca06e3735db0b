//! Dashboard view-state rules
//!
//! The pure logic behind the procedure list and per-procedure cards:
//! filter/search/sort derivation, editor form validation, and
//! acknowledgment completion statistics. Route handlers apply these rules;
//! nothing in this module touches the store.

pub mod card;
pub mod form;
pub mod list;

pub use card::{can_acknowledge, CardStats};
pub use form::{FieldError, ProcedureForm, SOURCE_SUGGESTIONS};
pub use list::{empty_state_message, ListQuery, SortKey, StatusFilter};
