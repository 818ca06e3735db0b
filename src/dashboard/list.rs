//! Procedure list view state
//!
//! The list endpoint always loads the full procedure set in creation order;
//! the displayed list is derived from it by filtering and sorting here.
//! Derivation never mutates the authoritative list.

use serde::{Deserialize, Serialize};

use crate::db::schemas::{ProcedureDoc, ProcedureStatus};

/// Status filter for the procedure list
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    All,
    #[default]
    Active,
    Archived,
    Replaced,
}

impl StatusFilter {
    /// Whether a procedure with the given status passes this filter
    pub fn matches(&self, status: ProcedureStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => status == ProcedureStatus::Active,
            StatusFilter::Archived => status == ProcedureStatus::Archived,
            StatusFilter::Replaced => status == ProcedureStatus::Replaced,
        }
    }
}

/// Sort order for the procedure list
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Newest effective date first (default)
    #[default]
    #[serde(rename = "date-desc")]
    EffectiveDateDesc,
    /// Oldest effective date first
    #[serde(rename = "date-asc")]
    EffectiveDateAsc,
    /// Title A-Z
    #[serde(rename = "title")]
    Title,
}

/// User-controlled view state, deserialized from the query string
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ListQuery {
    /// Free-text search query
    #[serde(default, rename = "q")]
    pub search: String,

    /// Status filter (defaults to active)
    #[serde(default)]
    pub status: StatusFilter,

    /// Sort key (defaults to newest effective date first)
    #[serde(default)]
    pub sort: SortKey,
}

impl ListQuery {
    /// Derive the displayed list from the authoritative list.
    ///
    /// Order of operations: status filter, then search match, then sort.
    /// The search query matches a procedure if it is a case-insensitive
    /// substring of the title, description, OR source. Sorts are stable.
    pub fn apply(&self, procedures: &[ProcedureDoc]) -> Vec<ProcedureDoc> {
        let mut filtered: Vec<ProcedureDoc> = procedures
            .iter()
            .filter(|p| self.status.matches(p.status))
            .filter(|p| self.matches_search(p))
            .cloned()
            .collect();

        match self.sort {
            SortKey::EffectiveDateDesc => {
                filtered.sort_by(|a, b| b.effective_date.cmp(&a.effective_date));
            }
            SortKey::EffectiveDateAsc => {
                filtered.sort_by(|a, b| a.effective_date.cmp(&b.effective_date));
            }
            SortKey::Title => {
                filtered.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
            }
        }

        filtered
    }

    /// Whether an active (non-blank) search query is present
    pub fn has_search(&self) -> bool {
        !self.search.trim().is_empty()
    }

    fn matches_search(&self, procedure: &ProcedureDoc) -> bool {
        let query = self.search.trim();
        if query.is_empty() {
            return true;
        }

        let query = query.to_lowercase();
        procedure.title.to_lowercase().contains(&query)
            || procedure.description.to_lowercase().contains(&query)
            || procedure.source.to_lowercase().contains(&query)
    }
}

/// Copy for an empty derived list, keyed on the cause.
///
/// Three distinct cases: an active search found nothing, an admin has not
/// created anything yet, and a non-admin is looking at an empty system.
pub fn empty_state_message(has_search: bool, is_admin: bool) -> &'static str {
    if has_search {
        "Try adjusting your search or filters"
    } else if is_admin {
        "Get started by adding your first procedure"
    } else {
        "No procedures have been added yet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn procedure(title: &str, description: &str, source: &str, status: ProcedureStatus, date: &str) -> ProcedureDoc {
        ProcedureDoc {
            title: title.into(),
            description: description.into(),
            source: source.into(),
            status,
            effective_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            ..Default::default()
        }
    }

    fn sample_set() -> Vec<ProcedureDoc> {
        vec![
            procedure("New EFT Process", "Wire instructions changed", "Teams", ProcedureStatus::Active, "2024-01-15"),
            procedure("Expense Policy", "Receipts over $50", "Slack", ProcedureStatus::Active, "2024-03-01"),
            procedure("Old VPN Setup", "Use the legacy client", "Email", ProcedureStatus::Archived, "2023-06-10"),
            procedure("Badge Access", "Front desk issues badges", "WhatsApp", ProcedureStatus::Replaced, "2024-02-20"),
            procedure("after-hours support", "Page the on-call channel", "Teams", ProcedureStatus::Active, "2024-02-20"),
        ]
    }

    #[test]
    fn test_default_view_state() {
        let query = ListQuery::default();
        assert_eq!(query.status, StatusFilter::Active);
        assert_eq!(query.sort, SortKey::EffectiveDateDesc);
        assert!(!query.has_search());
    }

    #[test]
    fn test_query_string_parsing() {
        let query: ListQuery = serde_urlencoded::from_str("q=eft&status=archived&sort=title").unwrap();
        assert_eq!(query.search, "eft");
        assert_eq!(query.status, StatusFilter::Archived);
        assert_eq!(query.sort, SortKey::Title);

        // Missing parameters fall back to defaults
        let query: ListQuery = serde_urlencoded::from_str("").unwrap();
        assert_eq!(query.status, StatusFilter::Active);
        assert_eq!(query.sort, SortKey::EffectiveDateDesc);
    }

    #[test]
    fn test_status_filter_totality() {
        // Every element of a filtered result has the filtered status
        for (filter, status) in [
            (StatusFilter::Active, ProcedureStatus::Active),
            (StatusFilter::Archived, ProcedureStatus::Archived),
            (StatusFilter::Replaced, ProcedureStatus::Replaced),
        ] {
            let query = ListQuery {
                status: filter,
                ..Default::default()
            };
            let result = query.apply(&sample_set());
            assert!(!result.is_empty());
            assert!(result.iter().all(|p| p.status == status));
        }

        // The all filter keeps everything
        let query = ListQuery {
            status: StatusFilter::All,
            ..Default::default()
        };
        assert_eq!(query.apply(&sample_set()).len(), sample_set().len());
    }

    #[test]
    fn test_search_is_subset_under_predicate() {
        let query = ListQuery {
            search: "teams".into(),
            status: StatusFilter::All,
            ..Default::default()
        };
        let result = query.apply(&sample_set());
        assert_eq!(result.len(), 2);
        for p in &result {
            let q = "teams";
            assert!(
                p.title.to_lowercase().contains(q)
                    || p.description.to_lowercase().contains(q)
                    || p.source.to_lowercase().contains(q)
            );
        }
    }

    #[test]
    fn test_search_matches_any_of_three_fields() {
        let all = StatusFilter::All;

        // Title match
        let query = ListQuery { search: "EFT".into(), status: all, ..Default::default() };
        assert_eq!(query.apply(&sample_set()).len(), 1);

        // Description match
        let query = ListQuery { search: "receipts".into(), status: all, ..Default::default() };
        assert_eq!(query.apply(&sample_set()).len(), 1);

        // Source match
        let query = ListQuery { search: "whatsapp".into(), status: all, ..Default::default() };
        assert_eq!(query.apply(&sample_set()).len(), 1);

        // No match
        let query = ListQuery { search: "nonexistent".into(), status: all, ..Default::default() };
        assert!(query.apply(&sample_set()).is_empty());
    }

    #[test]
    fn test_status_filter_runs_before_search() {
        // Both Teams-sourced records are active, so an archived filter
        // leaves nothing for the search to match
        let query = ListQuery {
            search: "teams".into(),
            status: StatusFilter::Archived,
            ..Default::default()
        };
        assert!(query.apply(&sample_set()).is_empty());
    }

    #[test]
    fn test_sort_by_date_desc_and_asc_are_reverses() {
        // Use records with distinct dates only
        let set: Vec<ProcedureDoc> = sample_set()
            .into_iter()
            .filter(|p| p.title != "after-hours support")
            .collect();

        let desc = ListQuery {
            status: StatusFilter::All,
            sort: SortKey::EffectiveDateDesc,
            ..Default::default()
        }
        .apply(&set);
        let asc = ListQuery {
            status: StatusFilter::All,
            sort: SortKey::EffectiveDateAsc,
            ..Default::default()
        }
        .apply(&set);

        let desc_titles: Vec<&str> = desc.iter().map(|p| p.title.as_str()).collect();
        let mut asc_titles: Vec<&str> = asc.iter().map(|p| p.title.as_str()).collect();
        asc_titles.reverse();
        assert_eq!(desc_titles, asc_titles);
    }

    #[test]
    fn test_sort_by_title_is_stable_and_idempotent() {
        let query = ListQuery {
            status: StatusFilter::All,
            sort: SortKey::Title,
            ..Default::default()
        };

        let once = query.apply(&sample_set());
        let twice = query.apply(&once);

        let titles_once: Vec<&str> = once.iter().map(|p| p.title.as_str()).collect();
        let titles_twice: Vec<&str> = twice.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles_once, titles_twice);

        // Case-insensitive: "after-hours support" sorts before "Badge Access"
        assert_eq!(titles_once[0], "after-hours support");
    }

    #[test]
    fn test_equal_dates_keep_creation_order() {
        // Two records share 2024-02-20; the stable sort keeps their
        // relative (creation) order
        let query = ListQuery {
            status: StatusFilter::All,
            sort: SortKey::EffectiveDateDesc,
            ..Default::default()
        };
        let result = query.apply(&sample_set());
        let badge = result.iter().position(|p| p.title == "Badge Access").unwrap();
        let support = result.iter().position(|p| p.title == "after-hours support").unwrap();
        assert!(badge < support);
    }

    #[test]
    fn test_apply_does_not_mutate_input() {
        let set = sample_set();
        let query = ListQuery {
            status: StatusFilter::All,
            sort: SortKey::Title,
            ..Default::default()
        };
        let _ = query.apply(&set);
        assert_eq!(set[0].title, "New EFT Process");
    }

    #[test]
    fn test_status_change_moves_record_between_filters() {
        let mut set = sample_set();
        let active = ListQuery::default();
        let replaced = ListQuery {
            status: StatusFilter::Replaced,
            ..Default::default()
        };

        assert!(active.apply(&set).iter().any(|p| p.title == "New EFT Process"));
        assert!(!replaced.apply(&set).iter().any(|p| p.title == "New EFT Process"));

        set[0].status = ProcedureStatus::Replaced;

        assert!(!active.apply(&set).iter().any(|p| p.title == "New EFT Process"));
        assert!(replaced.apply(&set).iter().any(|p| p.title == "New EFT Process"));
    }

    #[test]
    fn test_empty_state_copy_variants() {
        let searching = empty_state_message(true, false);
        let admin_empty = empty_state_message(false, true);
        let staff_empty = empty_state_message(false, false);

        assert_ne!(searching, admin_empty);
        assert_ne!(searching, staff_empty);
        assert_ne!(admin_empty, staff_empty);

        // An active search wins regardless of role
        assert_eq!(empty_state_message(true, true), searching);
    }
}
