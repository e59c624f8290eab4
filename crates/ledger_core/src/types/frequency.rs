//! Contribution frequency for systematic investment plans.

use std::fmt;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// How often a systematic investment plan contributes.
///
/// A plan's next due date always advances from the *previous* due date, never
/// from the wall clock, so a late scheduler tick does not shift the whole
/// schedule forward.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use ledger_core::types::ContributionFrequency;
///
/// let due = Utc.with_ymd_and_hms(2026, 1, 31, 9, 0, 0).unwrap();
/// let next = ContributionFrequency::Monthly.next_after(due);
/// // Clamped to the end of February
/// assert_eq!(next, Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionFrequency {
    /// One installment per calendar month (day-of-month preserving, clamped).
    Monthly,
    /// One installment every seven days.
    Weekly,
    /// One installment every `days` days.
    Custom {
        /// Interval length in days; must be at least 1.
        days: u32,
    },
}

impl ContributionFrequency {
    /// Returns the next due date strictly after the previous one.
    ///
    /// Monthly schedules advance by one calendar month with end-of-month
    /// clamping (Jan 31 -> Feb 28). Weekly and custom schedules advance by a
    /// fixed number of days.
    #[inline]
    pub fn next_after(&self, previous_due: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            ContributionFrequency::Monthly => previous_due
                .checked_add_months(Months::new(1))
                .unwrap_or(previous_due + Duration::days(30)),
            ContributionFrequency::Weekly => previous_due + Duration::weeks(1),
            ContributionFrequency::Custom { days } => {
                previous_due + Duration::days(i64::from((*days).max(1)))
            }
        }
    }

    /// Returns the fixed period length in days, if the frequency has one.
    ///
    /// Monthly schedules follow the calendar and return `None`.
    #[inline]
    pub fn period_days(&self) -> Option<u32> {
        match self {
            ContributionFrequency::Monthly => None,
            ContributionFrequency::Weekly => Some(7),
            ContributionFrequency::Custom { days } => Some((*days).max(1)),
        }
    }
}

impl fmt::Display for ContributionFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContributionFrequency::Monthly => write!(f, "monthly"),
            ContributionFrequency::Weekly => write!(f, "weekly"),
            ContributionFrequency::Custom { days } => write!(f, "every {} days", days),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    #[test]
    fn weekly_advances_seven_days() {
        assert_eq!(
            ContributionFrequency::Weekly.next_after(at(2026, 3, 1)),
            at(2026, 3, 8)
        );
    }

    #[test]
    fn monthly_preserves_day_of_month() {
        assert_eq!(
            ContributionFrequency::Monthly.next_after(at(2026, 3, 15)),
            at(2026, 4, 15)
        );
    }

    #[test]
    fn monthly_clamps_end_of_month() {
        assert_eq!(
            ContributionFrequency::Monthly.next_after(at(2026, 1, 31)),
            at(2026, 2, 28)
        );
    }

    #[test]
    fn custom_interval_uses_its_day_count() {
        let freq = ContributionFrequency::Custom { days: 10 };
        assert_eq!(freq.next_after(at(2026, 3, 1)), at(2026, 3, 11));
    }

    #[test]
    fn zero_day_custom_interval_still_advances() {
        let freq = ContributionFrequency::Custom { days: 0 };
        assert!(freq.next_after(at(2026, 3, 1)) > at(2026, 3, 1));
    }

    #[test]
    fn repeated_advances_do_not_drift() {
        let start = at(2026, 1, 10);
        let mut due = start;
        for _ in 0..12 {
            due = ContributionFrequency::Monthly.next_after(due);
        }
        assert_eq!(due, at(2027, 1, 10));
    }
}
