//! The cadence analytics engine.
//!
//! Every report builder is a pure function of a [`Snapshot`](crate::model::Snapshot),
//! the reference day and its parameters:
//! - Date windows and ISO week buckets
//! - Cohort status, gap and spacing classification
//! - Owner and channel workload aggregation
//! - Weekly agenda, coverage, capacity and conflict views
//! - The action plan

pub mod calendar;
pub mod grouping;
pub mod overview;
pub mod plan;
pub mod status;
pub mod windowing;
pub mod workload;

// Re-export commonly used types
pub use calendar::{
    cohort_coverage, owner_capacity, owner_conflicts, weekly_agenda, CapacityReport,
    ConflictReport, CoverageReport, WeeklyAgenda, DEFAULT_DAILY_LIMIT,
};
pub use grouping::{KeyCount, TouchpointFilter};
pub use overview::{summary, upcoming, SummaryReport, UpcomingReport};
pub use plan::{action_plan, ActionPlanEntry, ActionPlanReport, ActionReason};
pub use status::{
    cadence_metrics, cadence_status, cohort_report, gap_report, CadenceMetricsReport,
    CadenceStatusReport, CohortReport, GapCounts, GapReport, GapStatus,
};
pub use windowing::{week_buckets, week_start, window, DateWindow, WeekBucket};
pub use workload::{
    channel_report, owner_balance, owner_load, weekday_report, BalanceStatus, ChannelReport,
    OwnerBalanceReport, OwnerLoadReport, WeekdayReport, DEFAULT_BALANCE_THRESHOLD,
};
