//! Per-procedure acknowledgment statistics
//!
//! Completion is derived, never stored: acknowledgment count over the total
//! profile count, every role included in the denominator.

use serde::Serialize;

use crate::db::schemas::ProcedureStatus;

/// Aggregate acknowledgment counts for one procedure
#[derive(Serialize, Clone, Copy, Debug, Default)]
pub struct CardStats {
    /// Number of acknowledgments recorded for the procedure
    pub acknowledged_count: u64,
    /// Total number of profiles in the system (the denominator)
    pub profile_count: u64,
}

impl CardStats {
    /// Completion percentage, rounded to an integer.
    ///
    /// Zero when no profiles exist; the result is always within [0, 100]
    /// as long as the acknowledgment count cannot exceed the profile count.
    pub fn completion_percent(&self) -> u32 {
        if self.profile_count == 0 {
            return 0;
        }
        ((self.acknowledged_count as f64 / self.profile_count as f64) * 100.0).round() as u32
    }
}

/// Whether the acknowledge affordance is available to a viewer.
///
/// Only active procedures accept acknowledgments, and only from principals
/// who have not already acknowledged.
pub fn can_acknowledge(status: ProcedureStatus, has_acknowledged: bool) -> bool {
    status == ProcedureStatus::Active && !has_acknowledged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_profiles_is_zero_percent() {
        let stats = CardStats {
            acknowledged_count: 0,
            profile_count: 0,
        };
        assert_eq!(stats.completion_percent(), 0);
    }

    #[test]
    fn test_rounding() {
        let stats = CardStats {
            acknowledged_count: 1,
            profile_count: 3,
        };
        // 33.33... rounds down
        assert_eq!(stats.completion_percent(), 33);

        let stats = CardStats {
            acknowledged_count: 2,
            profile_count: 3,
        };
        // 66.66... rounds up
        assert_eq!(stats.completion_percent(), 67);
    }

    #[test]
    fn test_percentage_bounds() {
        for acknowledged in 0..=10u64 {
            let stats = CardStats {
                acknowledged_count: acknowledged,
                profile_count: 10,
            };
            let percent = stats.completion_percent();
            assert!(percent <= 100);
        }

        let full = CardStats {
            acknowledged_count: 10,
            profile_count: 10,
        };
        assert_eq!(full.completion_percent(), 100);
    }

    #[test]
    fn test_fresh_procedure_shows_zero_percent() {
        // A newly created procedure has no acknowledgments yet
        let stats = CardStats {
            acknowledged_count: 0,
            profile_count: 5,
        };
        assert_eq!(stats.completion_percent(), 0);
    }

    #[test]
    fn test_single_acknowledgment_increments_count_once() {
        let before = CardStats {
            acknowledged_count: 2,
            profile_count: 4,
        };
        let after = CardStats {
            acknowledged_count: 3,
            profile_count: 4,
        };
        assert_eq!(before.completion_percent(), 50);
        assert_eq!(after.completion_percent(), 75);

        // A repeat acknowledgment by the same principal is a no-op: the
        // affordance is gone and the counts do not move
        assert!(!can_acknowledge(ProcedureStatus::Active, true));
    }

    #[test]
    fn test_percentage_is_idempotent() {
        let stats = CardStats {
            acknowledged_count: 4,
            profile_count: 7,
        };
        assert_eq!(stats.completion_percent(), stats.completion_percent());
    }

    #[test]
    fn test_acknowledge_affordance() {
        assert!(can_acknowledge(ProcedureStatus::Active, false));
        assert!(!can_acknowledge(ProcedureStatus::Active, true));
        assert!(!can_acknowledge(ProcedureStatus::Archived, false));
        assert!(!can_acknowledge(ProcedureStatus::Replaced, false));
    }
}
