//! Headline views: what is coming up and how big the record set is.

use crate::core::grouping::{in_window, sorted_by_date, TouchpointFilter};
use crate::core::windowing::{window, DateWindow};
use crate::model::{Snapshot, Touchpoint};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpcomingReport {
    pub days: u32,
    pub window: DateWindow,
    pub count: usize,
    pub touchpoints: Vec<Touchpoint>,
}

/// Touchpoints dated from today through `today + days`, earliest first.
pub fn upcoming(snapshot: &Snapshot, today: NaiveDate, days: u32) -> UpcomingReport {
    let window = window(today, 0, days);
    let touchpoints = sorted_by_date(in_window(snapshot, window, &TouchpointFilter::default()));
    UpcomingReport {
        days,
        window,
        count: touchpoints.len(),
        touchpoints,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub days: u32,
    pub cohort_count: usize,
    pub touchpoint_count: usize,
    pub upcoming: UpcomingReport,
}

pub fn summary(snapshot: &Snapshot, today: NaiveDate, days: u32) -> SummaryReport {
    SummaryReport {
        days,
        cohort_count: snapshot.cohorts.len(),
        touchpoint_count: snapshot.touchpoints.len(),
        upcoming: upcoming(snapshot, today, days),
    }
}
