//! Per-cohort cadence classification.
//!
//! Three independent views of the same touchpoint history:
//! - `cadence_status`: lifecycle plus a stale flag against a day threshold
//! - `gap_report`: a four-way health status from lookback/lookahead windows
//! - `cadence_metrics`: spacing statistics between consecutive touchpoints
//!
//! `cohort_report` drills into a single cohort.

use crate::core::grouping::{earliest, latest, round_to, sorted_by_date};
use crate::core::windowing::{days_between, window};
use crate::error::Result;
use crate::model::{Cohort, Lifecycle, Snapshot, Touchpoint};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::debug;

/// The most recent past and nearest future touchpoint of a cohort.
///
/// A touchpoint dated today is both.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Bearings<'a> {
    pub last: Option<&'a Touchpoint>,
    pub next: Option<&'a Touchpoint>,
}

impl<'a> Bearings<'a> {
    pub fn locate(touches: &[&'a Touchpoint], today: NaiveDate) -> Self {
        Self {
            last: latest(touches.iter().copied().filter(|t| t.date <= today)),
            next: earliest(touches.iter().copied().filter(|t| t.date >= today)),
        }
    }

    pub fn days_since_last(&self, today: NaiveDate) -> Option<i64> {
        self.last.map(|touch| days_between(touch.date, today))
    }

    pub fn days_until_next(&self, today: NaiveDate) -> Option<i64> {
        self.next.map(|touch| days_between(today, touch.date))
    }
}

/// Index touchpoints by cohort id, keeping snapshot order.
pub(crate) fn touches_by_cohort(snapshot: &Snapshot) -> HashMap<&str, Vec<&Touchpoint>> {
    let mut index: HashMap<&str, Vec<&Touchpoint>> = HashMap::new();
    for touch in &snapshot.touchpoints {
        index.entry(touch.cohort_id.as_str()).or_default().push(touch);
    }
    index
}

pub(crate) fn touches_of<'a>(index: &HashMap<&str, Vec<&'a Touchpoint>>, cohort: &Cohort) -> Vec<&'a Touchpoint> {
    index.get(cohort.id.as_str()).cloned().unwrap_or_default()
}

// ============================================================================
// Cadence status
// ============================================================================

/// Status of one cohort relative to today.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceStatusEntry {
    pub cohort: Cohort,
    pub status: Lifecycle,
    pub last_touchpoint: Option<Touchpoint>,
    pub next_touchpoint: Option<Touchpoint>,
    /// Days since the last touchpoint, or since the cohort started when
    /// nothing has happened yet
    pub days_since_last: Option<i64>,
    pub days_until_next: Option<i64>,
    pub next_within_lookahead: bool,
    /// Active and quiet for longer than the stale threshold
    pub stale: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceStatusReport {
    pub stale_days: u32,
    pub lookahead_days: u32,
    pub stale_count: usize,
    pub entries: Vec<CadenceStatusEntry>,
}

/// Classify every cohort's lifecycle and staleness.
///
/// Entries are ordered stale first, then active, upcoming, ended, then by
/// descending `days_since_last` (missing values last).
pub fn cadence_status(
    snapshot: &Snapshot,
    today: NaiveDate,
    stale_days: u32,
    lookahead_days: u32,
) -> CadenceStatusReport {
    let index = touches_by_cohort(snapshot);
    let lookahead = window(today, 0, lookahead_days);

    let mut entries: Vec<CadenceStatusEntry> = snapshot
        .cohorts
        .iter()
        .map(|cohort| {
            let touches = touches_of(&index, cohort);
            let bearings = Bearings::locate(&touches, today);
            let status = cohort.lifecycle(today);

            let days_since_last = bearings.days_since_last(today).or_else(|| {
                (cohort.start_date <= today).then(|| days_between(cohort.start_date, today))
            });
            let stale = status == Lifecycle::Active
                && days_since_last.is_some_and(|days| days > i64::from(stale_days));

            CadenceStatusEntry {
                cohort: cohort.clone(),
                status,
                last_touchpoint: bearings.last.cloned(),
                next_touchpoint: bearings.next.cloned(),
                days_since_last,
                days_until_next: bearings.days_until_next(today),
                next_within_lookahead: bearings.next.is_some_and(|t| t.date <= lookahead.end),
                stale,
            }
        })
        .collect();

    entries.sort_by_key(|entry| {
        (
            !entry.stale,
            entry.status,
            Reverse(entry.days_since_last.unwrap_or(-1)),
        )
    });

    let stale_count = entries.iter().filter(|entry| entry.stale).count();
    debug!(cohorts = entries.len(), stale_count, "computed cadence status");

    CadenceStatusReport {
        stale_days,
        lookahead_days,
        stale_count,
        entries,
    }
}

// ============================================================================
// Gap report
// ============================================================================

/// Four-way cohort health from recent and scheduled coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapStatus {
    AtRisk,
    Stale,
    Unscheduled,
    OnTrack,
}

impl GapStatus {
    pub const ALL: [GapStatus; 4] = [
        GapStatus::AtRisk,
        GapStatus::Stale,
        GapStatus::Unscheduled,
        GapStatus::OnTrack,
    ];

    /// Decision table over the two gap flags.
    pub fn classify(stale: bool, unscheduled: bool) -> Self {
        match (stale, unscheduled) {
            (true, true) => GapStatus::AtRisk,
            (true, false) => GapStatus::Stale,
            (false, true) => GapStatus::Unscheduled,
            (false, false) => GapStatus::OnTrack,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GapStatus::AtRisk => "at-risk",
            GapStatus::Stale => "stale",
            GapStatus::Unscheduled => "unscheduled",
            GapStatus::OnTrack => "on-track",
        }
    }
}

impl std::fmt::Display for GapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GapStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        GapStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| {
                let allowed: Vec<&str> = GapStatus::ALL.iter().map(GapStatus::as_str).collect();
                format!("Invalid status {s}. Use one of: {}", allowed.join(", "))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapEntry {
    pub cohort: Cohort,
    pub status: GapStatus,
    pub last_touchpoint: Option<NaiveDate>,
    pub next_touchpoint: Option<NaiveDate>,
    pub days_since_last: Option<i64>,
    pub days_until_next: Option<i64>,
}

/// Number of cohorts per gap status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GapCounts {
    pub at_risk: usize,
    pub stale: usize,
    pub unscheduled: usize,
    pub on_track: usize,
}

impl GapCounts {
    fn record(&mut self, status: GapStatus) {
        match status {
            GapStatus::AtRisk => self.at_risk += 1,
            GapStatus::Stale => self.stale += 1,
            GapStatus::Unscheduled => self.unscheduled += 1,
            GapStatus::OnTrack => self.on_track += 1,
        }
    }

    pub fn get(&self, status: GapStatus) -> usize {
        match status {
            GapStatus::AtRisk => self.at_risk,
            GapStatus::Stale => self.stale,
            GapStatus::Unscheduled => self.unscheduled,
            GapStatus::OnTrack => self.on_track,
        }
    }

    pub fn total(&self) -> usize {
        self.at_risk + self.stale + self.unscheduled + self.on_track
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapReport {
    pub lookback_days: u32,
    pub lookahead_days: u32,
    pub counts: GapCounts,
    pub entries: Vec<GapEntry>,
}

impl GapReport {
    /// Keep only entries with the given status. Counts are left untouched.
    pub fn retain_status(&mut self, status: GapStatus) {
        self.entries.retain(|entry| entry.status == status);
    }
}

/// Classify each cohort by whether it was touched within the lookback and is
/// scheduled within the lookahead. Entries are ordered by start date.
pub fn gap_report(
    snapshot: &Snapshot,
    today: NaiveDate,
    lookback_days: u32,
    lookahead_days: u32,
) -> GapReport {
    let index = touches_by_cohort(snapshot);
    let mut counts = GapCounts::default();

    let mut entries: Vec<GapEntry> = snapshot
        .cohorts
        .iter()
        .map(|cohort| {
            let touches = touches_of(&index, cohort);
            let bearings = Bearings::locate(&touches, today);
            let days_since_last = bearings.days_since_last(today);
            let days_until_next = bearings.days_until_next(today);

            let stale = days_since_last.map_or(true, |days| days > i64::from(lookback_days));
            let unscheduled = days_until_next.map_or(true, |days| days > i64::from(lookahead_days));
            let status = GapStatus::classify(stale, unscheduled);
            counts.record(status);

            GapEntry {
                cohort: cohort.clone(),
                status,
                last_touchpoint: bearings.last.map(|t| t.date),
                next_touchpoint: bearings.next.map(|t| t.date),
                days_since_last,
                days_until_next,
            }
        })
        .collect();

    entries.sort_by_key(|entry| entry.cohort.start_date);
    debug!(cohorts = entries.len(), at_risk = counts.at_risk, "computed gap report");

    GapReport {
        lookback_days,
        lookahead_days,
        counts,
        entries,
    }
}

// ============================================================================
// Cadence metrics
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceMetricsEntry {
    pub cohort: Cohort,
    pub touchpoint_count: usize,
    /// Mean days between consecutive touchpoints (2 decimals)
    pub avg_gap_days: Option<f64>,
    pub min_gap_days: Option<i64>,
    pub max_gap_days: Option<i64>,
    /// Largest gap exceeds the configured threshold
    pub gap_flag: bool,
    pub last_touchpoint: Option<Touchpoint>,
    pub next_touchpoint: Option<Touchpoint>,
    pub days_since_last: Option<i64>,
    pub days_until_next: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceMetricsReport {
    pub max_gap_days: Option<u32>,
    pub cohort_count: usize,
    pub flagged_count: usize,
    pub entries: Vec<CadenceMetricsEntry>,
}

/// Spacing statistics between each cohort's consecutive touchpoints.
///
/// Entries are ordered flagged first, then by descending max gap (missing
/// values last), then by start date.
pub fn cadence_metrics(
    snapshot: &Snapshot,
    today: NaiveDate,
    max_gap_days: Option<u32>,
) -> CadenceMetricsReport {
    let index = touches_by_cohort(snapshot);

    let mut entries: Vec<CadenceMetricsEntry> = snapshot
        .cohorts
        .iter()
        .map(|cohort| {
            let touches = touches_of(&index, cohort);
            let bearings = Bearings::locate(&touches, today);

            let mut dates: Vec<NaiveDate> = touches.iter().map(|t| t.date).collect();
            dates.sort();
            let gaps: Vec<i64> = dates
                .windows(2)
                .map(|pair| days_between(pair[0], pair[1]))
                .collect();

            let (avg_gap_days, min_gap_days, max_gap_days_seen) = if gaps.is_empty() {
                (None, None, None)
            } else {
                (
                    Some(round_to(mean_gap(&gaps), 2)),
                    gaps.iter().copied().min(),
                    gaps.iter().copied().max(),
                )
            };
            let gap_flag = match (max_gap_days, max_gap_days_seen) {
                (Some(threshold), Some(seen)) => seen > i64::from(threshold),
                _ => false,
            };

            CadenceMetricsEntry {
                cohort: cohort.clone(),
                touchpoint_count: touches.len(),
                avg_gap_days,
                min_gap_days,
                max_gap_days: max_gap_days_seen,
                gap_flag,
                last_touchpoint: bearings.last.cloned(),
                next_touchpoint: bearings.next.cloned(),
                days_since_last: bearings.days_since_last(today),
                days_until_next: bearings.days_until_next(today),
            }
        })
        .collect();

    entries.sort_by_key(|entry| {
        (
            !entry.gap_flag,
            Reverse(entry.max_gap_days.unwrap_or(-1)),
            entry.cohort.start_date,
        )
    });

    let flagged_count = entries.iter().filter(|entry| entry.gap_flag).count();

    CadenceMetricsReport {
        max_gap_days,
        cohort_count: entries.len(),
        flagged_count,
        entries,
    }
}

fn mean_gap(gaps: &[i64]) -> f64 {
    use statrs::statistics::Statistics;
    gaps.iter().map(|&gap| gap as f64).mean()
}

// ============================================================================
// Single cohort
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortReport {
    pub cohort: Cohort,
    pub lookback_days: u32,
    pub lookahead_days: u32,
    pub touchpoint_count: usize,
    pub last_touchpoint: Option<Touchpoint>,
    pub next_touchpoint: Option<Touchpoint>,
    pub days_since_last: Option<i64>,
    pub days_until_next: Option<i64>,
    /// Touchpoints in `[today - lookback, today]`
    pub recent_touchpoints: Vec<Touchpoint>,
    /// Touchpoints in `[today, today + lookahead]`
    pub upcoming_touchpoints: Vec<Touchpoint>,
}

/// Recent and upcoming activity for one cohort, looked up by id or name.
pub fn cohort_report(
    snapshot: &Snapshot,
    today: NaiveDate,
    identifier: &str,
    lookback_days: u32,
    lookahead_days: u32,
) -> Result<CohortReport> {
    let cohort = snapshot.find_cohort(identifier)?;
    let touches: Vec<&Touchpoint> = snapshot.touchpoints_for(&cohort.id).collect();
    let bearings = Bearings::locate(&touches, today);
    let recent = window(today, lookback_days, 0);
    let upcoming = window(today, 0, lookahead_days);

    Ok(CohortReport {
        cohort: cohort.clone(),
        lookback_days,
        lookahead_days,
        touchpoint_count: touches.len(),
        last_touchpoint: bearings.last.cloned(),
        next_touchpoint: bearings.next.cloned(),
        days_since_last: bearings.days_since_last(today),
        days_until_next: bearings.days_until_next(today),
        recent_touchpoints: sorted_by_date(touches.iter().copied().filter(|t| recent.contains(t.date))),
        upcoming_touchpoints: sorted_by_date(
            touches.iter().copied().filter(|t| upcoming.contains(t.date)),
        ),
    })
}
