//! Record types for cohorts and touchpoints.
//!
//! Records are immutable once created. Blank owners and channels are kept as
//! entered and normalised to sentinels only when grouping.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Grouping key for touchpoints without an owner.
pub const UNASSIGNED_OWNER: &str = "Unassigned";

/// Grouping key for touchpoints without a channel.
pub const UNSPECIFIED_CHANNEL: &str = "Unspecified";

/// A named group of program participants tracked over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    /// Stable identifier assigned at creation
    pub id: String,
    pub name: String,
    /// First program day (inclusive)
    pub start_date: NaiveDate,
    /// Last program day (inclusive)
    pub end_date: NaiveDate,
    /// Number of participants
    pub size: u32,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Cohort {
    /// Lifecycle position of the cohort relative to `today`.
    pub fn lifecycle(&self, today: NaiveDate) -> Lifecycle {
        if self.end_date < today {
            Lifecycle::Ended
        } else if self.start_date > today {
            Lifecycle::Upcoming
        } else {
            Lifecycle::Active
        }
    }

    /// Whether `identifier` names this cohort, by exact id or by
    /// case-insensitive name.
    pub fn matches(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        self.id == identifier || self.name.trim().eq_ignore_ascii_case(identifier)
    }
}

/// Three-state cohort lifecycle.
///
/// Variant order is the sort priority used by status reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Active,
    Upcoming,
    Ended,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifecycle::Active => write!(f, "active"),
            Lifecycle::Upcoming => write!(f, "upcoming"),
            Lifecycle::Ended => write!(f, "ended"),
        }
    }
}

/// A single dated outreach event tied to one cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Touchpoint {
    pub id: String,
    /// Cohort this touchpoint was logged against
    pub cohort_id: String,
    /// Copy of the cohort's name at creation time (not kept in sync)
    pub cohort_name: String,
    pub title: String,
    /// Day the touchpoint happens
    pub date: NaiveDate,
    pub owner: String,
    pub channel: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Touchpoint {
    /// Owner used for grouping; blank owners become [`UNASSIGNED_OWNER`].
    pub fn owner_key(&self) -> &str {
        non_blank_or(&self.owner, UNASSIGNED_OWNER)
    }

    /// Channel used for grouping; blank channels become [`UNSPECIFIED_CHANNEL`].
    pub fn channel_key(&self) -> &str {
        non_blank_or(&self.channel, UNSPECIFIED_CHANNEL)
    }

    /// Whether the owner was left blank.
    pub fn is_unowned(&self) -> bool {
        self.owner.trim().is_empty()
    }
}

fn non_blank_or<'a>(value: &'a str, sentinel: &'a str) -> &'a str {
    match value.trim() {
        "" => sentinel,
        trimmed => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cohort(start: &str, end: &str) -> Cohort {
        Cohort {
            id: "cohort-1".to_string(),
            name: "Alpha Fellows".to_string(),
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            size: 20,
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_lifecycle_boundaries() {
        let today: NaiveDate = "2026-02-01".parse().unwrap();

        assert_eq!(cohort("2026-01-01", "2026-01-31").lifecycle(today), Lifecycle::Ended);
        assert_eq!(cohort("2026-02-02", "2026-06-30").lifecycle(today), Lifecycle::Upcoming);
        assert_eq!(cohort("2026-02-01", "2026-02-01").lifecycle(today), Lifecycle::Active);
        assert_eq!(cohort("2026-01-01", "2026-02-01").lifecycle(today), Lifecycle::Active);
    }

    #[test]
    fn test_cohort_matches_id_or_name() {
        let cohort = cohort("2026-01-01", "2026-06-30");
        assert!(cohort.matches("cohort-1"));
        assert!(cohort.matches("  alpha fellows "));
        assert!(!cohort.matches("Cohort-1"));
        assert!(!cohort.matches("Alpha"));
    }

    #[test]
    fn test_blank_keys_use_sentinels() {
        let touch = Touchpoint {
            id: "t-1".to_string(),
            cohort_id: "cohort-1".to_string(),
            cohort_name: "Alpha Fellows".to_string(),
            title: "Check-in".to_string(),
            date: "2026-02-03".parse().unwrap(),
            owner: "   ".to_string(),
            channel: String::new(),
            notes: String::new(),
            created_at: Utc::now(),
        };

        assert_eq!(touch.owner_key(), UNASSIGNED_OWNER);
        assert_eq!(touch.channel_key(), UNSPECIFIED_CHANNEL);
        assert!(touch.is_unowned());

        let padded = Touchpoint {
            owner: " Lead A ".to_string(),
            channel: "Zoom\t".to_string(),
            ..touch
        };
        assert_eq!(padded.owner_key(), "Lead A");
        assert_eq!(padded.channel_key(), "Zoom");
    }
}
