//! Week- and day-bucketed scheduling views.

use crate::core::grouping::{group_by, in_window, non_blank, sorted_by_date, TouchpointFilter};
use crate::core::windowing::{
    agenda_window, day_span, week_buckets, weeks_spanning, DateWindow, WeekBucket,
};
use crate::error::Result;
use crate::model::{Cohort, Snapshot, Touchpoint};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-owner daily limit used when none is supplied.
pub const DEFAULT_DAILY_LIMIT: u32 = 2;

fn by_week<'a>(touches: &[&'a Touchpoint]) -> BTreeMap<WeekBucket, Vec<&'a Touchpoint>> {
    let mut weeks: BTreeMap<WeekBucket, Vec<&'a Touchpoint>> = BTreeMap::new();
    for touch in touches {
        weeks.entry(WeekBucket::containing(touch.date)).or_default().push(*touch);
    }
    weeks
}

// ============================================================================
// Weekly agenda
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgendaWeek {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub count: usize,
    pub touchpoints: Vec<Touchpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyAgenda {
    pub weeks: u32,
    pub window: DateWindow,
    pub owner_filter: Option<String>,
    pub cohort_filter: Option<String>,
    pub total_touchpoints: usize,
    /// Weeks holding at least one touchpoint, in calendar order
    pub agenda: Vec<AgendaWeek>,
}

/// Touchpoints scheduled over the next `weeks` weeks, bucketed by ISO week.
pub fn weekly_agenda(
    snapshot: &Snapshot,
    today: NaiveDate,
    weeks: u32,
    owner_filter: Option<&str>,
    cohort_filter: Option<&str>,
) -> Result<WeeklyAgenda> {
    let window = agenda_window(today, weeks)?;
    let filter = TouchpointFilter::resolve(snapshot, owner_filter, cohort_filter)?;
    let touches = in_window(snapshot, window, &filter);

    let agenda = by_week(&touches)
        .into_iter()
        .map(|(bucket, group)| AgendaWeek {
            week_start: bucket.week_start,
            week_end: bucket.week_end,
            count: group.len(),
            touchpoints: sorted_by_date(group),
        })
        .collect();

    Ok(WeeklyAgenda {
        weeks,
        window,
        owner_filter: filter.owner,
        cohort_filter: non_blank(cohort_filter).map(str::to_string),
        total_touchpoints: touches.len(),
        agenda,
    })
}

// ============================================================================
// Cohort coverage
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekCount {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageEntry {
    pub cohort: Cohort,
    pub total_touchpoints: usize,
    pub weeks_tracked: usize,
    pub weeks_with_touchpoints: usize,
    pub weeks_without_touchpoints: usize,
    /// `weeks_with_touchpoints / weeks_tracked`
    pub coverage_rate: f64,
    /// Longest run of consecutive empty weeks
    pub longest_gap_weeks: usize,
    pub empty_weeks: Vec<WeekBucket>,
    pub weeks: Vec<WeekCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageReport {
    pub weeks: u32,
    pub window: DateWindow,
    pub weeks_tracked: usize,
    pub cohort_count: usize,
    pub entries: Vec<CoverageEntry>,
}

/// Which of the next `weeks` ISO weeks each cohort has touchpoints in.
///
/// Entries are ordered by descending weeks covered, then cohort name.
pub fn cohort_coverage(
    snapshot: &Snapshot,
    today: NaiveDate,
    weeks: u32,
    cohort_filter: Option<&str>,
) -> Result<CoverageReport> {
    let buckets = week_buckets(today, weeks)?;
    let window = match (buckets.first(), buckets.last()) {
        (Some(first), Some(last)) => DateWindow::new(first.week_start, last.week_end),
        _ => DateWindow::empty_at(WeekBucket::containing(today).week_start),
    };

    let cohorts: Vec<&Cohort> = match non_blank(cohort_filter) {
        Some(identifier) => vec![snapshot.find_cohort(identifier)?],
        None => snapshot.cohorts.iter().collect(),
    };

    let mut entries: Vec<CoverageEntry> = cohorts
        .into_iter()
        .map(|cohort| coverage_for(snapshot, cohort, &buckets, window))
        .collect();
    entries.sort_by(|a, b| {
        b.weeks_with_touchpoints
            .cmp(&a.weeks_with_touchpoints)
            .then_with(|| a.cohort.name.cmp(&b.cohort.name))
    });

    Ok(CoverageReport {
        weeks,
        window,
        weeks_tracked: buckets.len(),
        cohort_count: entries.len(),
        entries,
    })
}

fn coverage_for(
    snapshot: &Snapshot,
    cohort: &Cohort,
    buckets: &[WeekBucket],
    window: DateWindow,
) -> CoverageEntry {
    let touches: Vec<&Touchpoint> = snapshot
        .touchpoints_for(&cohort.id)
        .filter(|touch| window.contains(touch.date))
        .collect();

    let weeks: Vec<WeekCount> = buckets
        .iter()
        .map(|bucket| WeekCount {
            week_start: bucket.week_start,
            week_end: bucket.week_end,
            count: touches.iter().filter(|t| bucket.contains(t.date)).count(),
        })
        .collect();

    let empty_weeks: Vec<WeekBucket> = buckets
        .iter()
        .zip(&weeks)
        .filter(|(_, week)| week.count == 0)
        .map(|(bucket, _)| *bucket)
        .collect();

    let mut longest_gap_weeks = 0;
    let mut run = 0;
    for week in &weeks {
        if week.count == 0 {
            run += 1;
            longest_gap_weeks = longest_gap_weeks.max(run);
        } else {
            run = 0;
        }
    }

    let weeks_tracked = weeks.len();
    let weeks_with_touchpoints = weeks_tracked - empty_weeks.len();
    let coverage_rate = if weeks_tracked == 0 {
        0.0
    } else {
        weeks_with_touchpoints as f64 / weeks_tracked as f64
    };

    CoverageEntry {
        cohort: cohort.clone(),
        total_touchpoints: touches.len(),
        weeks_tracked,
        weeks_with_touchpoints,
        weeks_without_touchpoints: empty_weeks.len(),
        coverage_rate,
        longest_gap_weeks,
        empty_weeks,
        weeks,
    }
}

// ============================================================================
// Owner capacity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityWeek {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub count: usize,
    /// Count exceeds the weekly limit
    pub over_limit: bool,
    pub touchpoints: Vec<Touchpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerCapacity {
    pub owner: String,
    pub total_touchpoints: usize,
    pub weeks_tracked: usize,
    pub over_limit_weeks: usize,
    pub weeks: Vec<CapacityWeek>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityReport {
    pub weeks: u32,
    pub window: DateWindow,
    pub weekly_limit: Option<u32>,
    pub owner_filter: Option<String>,
    pub total_touchpoints: usize,
    pub owners_count: usize,
    /// Over-limit weeks summed across owners
    pub over_limit_weeks: usize,
    pub owners: Vec<OwnerCapacity>,
}

/// Weekly touchpoint counts per owner over the next `weeks` weeks, checked
/// against an optional per-week limit.
///
/// Every ISO week overlapping the window is listed for every owner, empty
/// weeks included.
pub fn owner_capacity(
    snapshot: &Snapshot,
    today: NaiveDate,
    weeks: u32,
    weekly_limit: Option<u32>,
    owner_filter: Option<&str>,
) -> Result<CapacityReport> {
    let window = agenda_window(today, weeks)?;
    let filter = TouchpointFilter::owner(owner_filter);
    let touches = in_window(snapshot, window, &filter);
    let buckets = weeks_spanning(window);

    let mut owners: Vec<OwnerCapacity> = group_by(touches.iter().copied(), Touchpoint::owner_key)
        .into_iter()
        .map(|(owner, group)| {
            let mut per_week = by_week(&group);
            let weeks: Vec<CapacityWeek> = buckets
                .iter()
                .map(|bucket| {
                    let week_touches = per_week.remove(bucket).unwrap_or_default();
                    let count = week_touches.len();
                    CapacityWeek {
                        week_start: bucket.week_start,
                        week_end: bucket.week_end,
                        count,
                        over_limit: weekly_limit.is_some_and(|limit| count > limit as usize),
                        touchpoints: sorted_by_date(week_touches),
                    }
                })
                .collect();
            OwnerCapacity {
                owner,
                total_touchpoints: group.len(),
                weeks_tracked: weeks.len(),
                over_limit_weeks: weeks.iter().filter(|week| week.over_limit).count(),
                weeks,
            }
        })
        .collect();
    owners.sort_by(|a, b| {
        b.total_touchpoints
            .cmp(&a.total_touchpoints)
            .then_with(|| a.owner.cmp(&b.owner))
    });

    let over_limit_weeks = owners.iter().map(|owner| owner.over_limit_weeks).sum();
    debug!(owners = owners.len(), over_limit_weeks, "computed owner capacity");

    Ok(CapacityReport {
        weeks,
        window,
        weekly_limit,
        owner_filter: filter.owner,
        total_touchpoints: touches.len(),
        owners_count: owners.len(),
        over_limit_weeks,
        owners,
    })
}

// ============================================================================
// Owner conflicts
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictDay {
    pub date: NaiveDate,
    pub count: usize,
    pub touchpoints: Vec<Touchpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerConflicts {
    pub owner: String,
    /// All of the owner's touchpoints in the window
    pub total_touchpoints: usize,
    pub conflict_days: usize,
    pub days: Vec<ConflictDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictReport {
    pub days: u32,
    pub window: DateWindow,
    pub daily_limit: u32,
    pub owner_filter: Option<String>,
    pub total_touchpoints: usize,
    /// Owners with at least one conflict day
    pub owners_count: usize,
    /// Conflict days summed across owners
    pub conflict_days: usize,
    pub owners: Vec<OwnerConflicts>,
}

/// Days in the next `days` days on which an owner has more than
/// `daily_limit` touchpoints. Owners without such days are left out.
pub fn owner_conflicts(
    snapshot: &Snapshot,
    today: NaiveDate,
    days: u32,
    daily_limit: u32,
    owner_filter: Option<&str>,
) -> ConflictReport {
    let window = day_span(today, days);
    let filter = TouchpointFilter::owner(owner_filter);
    let touches = in_window(snapshot, window, &filter);

    let mut owners: Vec<OwnerConflicts> = group_by(touches.iter().copied(), Touchpoint::owner_key)
        .into_iter()
        .filter_map(|(owner, group)| {
            let mut per_day: BTreeMap<NaiveDate, Vec<&Touchpoint>> = BTreeMap::new();
            for touch in &group {
                per_day.entry(touch.date).or_default().push(*touch);
            }
            let conflicts: Vec<ConflictDay> = per_day
                .into_iter()
                .filter(|(_, day)| day.len() > daily_limit as usize)
                .map(|(date, day)| ConflictDay {
                    date,
                    count: day.len(),
                    touchpoints: sorted_by_date(day),
                })
                .collect();
            (!conflicts.is_empty()).then(|| OwnerConflicts {
                owner,
                total_touchpoints: group.len(),
                conflict_days: conflicts.len(),
                days: conflicts,
            })
        })
        .collect();
    owners.sort_by(|a, b| {
        b.conflict_days
            .cmp(&a.conflict_days)
            .then_with(|| a.owner.cmp(&b.owner))
    });

    let conflict_days = owners.iter().map(|owner| owner.conflict_days).sum();

    ConflictReport {
        days,
        window,
        daily_limit,
        owner_filter: filter.owner,
        total_touchpoints: touches.len(),
        owners_count: owners.len(),
        conflict_days,
        owners,
    }
}
