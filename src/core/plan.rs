//! Recommendation engine: which cohorts need a new touchpoint, when, and
//! who should own it.

use crate::core::grouping::tally;
use crate::core::status::{touches_by_cohort, touches_of, Bearings};
use crate::core::windowing::{days_after, days_between};
use crate::model::{Cohort, Lifecycle, Snapshot, Touchpoint, UNASSIGNED_OWNER};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Why a cohort shows up in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionReason {
    /// Active cohort with no touchpoints at all
    NoTouchpoints,
    /// Active cohort with nothing on or after today
    NothingScheduled,
    /// Active cohort whose next touchpoint is further out than the target gap
    NextBeyondTargetGap,
    /// Upcoming cohort with nothing booked soon enough after it starts
    KickoffNotScheduled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlanEntry {
    pub cohort: Cohort,
    pub status: Lifecycle,
    pub reason: ActionReason,
    pub last_touchpoint: Option<Touchpoint>,
    pub next_touchpoint: Option<Touchpoint>,
    pub days_since_last: Option<i64>,
    pub recommended_date: NaiveDate,
    pub recommended_owner: String,
    pub within_lookahead: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlanReport {
    pub target_gap_days: u32,
    pub lookahead_days: u32,
    pub cohort_count: usize,
    pub action_count: usize,
    pub entries: Vec<ActionPlanEntry>,
}

/// Build the action plan. Only cohorts needing action are listed; the ones
/// due inside the lookahead come first, then by recommended date.
pub fn action_plan(
    snapshot: &Snapshot,
    today: NaiveDate,
    target_gap_days: u32,
    lookahead_days: u32,
) -> ActionPlanReport {
    let index = touches_by_cohort(snapshot);
    let horizon = days_after(today, lookahead_days);

    let mut entries: Vec<ActionPlanEntry> = snapshot
        .cohorts
        .iter()
        .filter_map(|cohort| {
            let touches = touches_of(&index, cohort);
            let bearings = Bearings::locate(&touches, today);
            let status = cohort.lifecycle(today);

            let (reason, recommended_date) = match status {
                Lifecycle::Ended => return None,
                Lifecycle::Active => {
                    let due_soon = |next: &Touchpoint| {
                        days_between(today, next.date) <= i64::from(target_gap_days)
                    };
                    let reason = match bearings.next {
                        Some(next) if due_soon(next) => return None,
                        Some(_) => ActionReason::NextBeyondTargetGap,
                        None if touches.is_empty() => ActionReason::NoTouchpoints,
                        None => ActionReason::NothingScheduled,
                    };
                    let date = bearings
                        .last
                        .map_or(today, |last| days_after(last.date, target_gap_days).max(today));
                    (reason, date)
                }
                Lifecycle::Upcoming => {
                    let kickoff_deadline = days_after(cohort.start_date, target_gap_days);
                    if bearings.next.is_some_and(|next| next.date <= kickoff_deadline) {
                        return None;
                    }
                    (ActionReason::KickoffNotScheduled, cohort.start_date)
                }
            };

            Some(ActionPlanEntry {
                cohort: cohort.clone(),
                status,
                reason,
                last_touchpoint: bearings.last.cloned(),
                next_touchpoint: bearings.next.cloned(),
                days_since_last: bearings.days_since_last(today),
                recommended_date,
                recommended_owner: recommend_owner(&touches, bearings.last),
                within_lookahead: recommended_date <= horizon,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.within_lookahead
            .cmp(&a.within_lookahead)
            .then_with(|| a.recommended_date.cmp(&b.recommended_date))
            .then_with(|| a.cohort.start_date.cmp(&b.cohort.start_date))
    });
    debug!(actions = entries.len(), "built action plan");

    ActionPlanReport {
        target_gap_days,
        lookahead_days,
        cohort_count: snapshot.cohorts.len(),
        action_count: entries.len(),
        entries,
    }
}

/// Owner of the last touchpoint, else the cohort's most frequent owner.
fn recommend_owner(touches: &[&Touchpoint], last: Option<&Touchpoint>) -> String {
    if let Some(last) = last.filter(|touch| !touch.is_unowned()) {
        return last.owner_key().to_string();
    }
    tally(
        touches
            .iter()
            .filter(|touch| !touch.is_unowned())
            .map(|touch| touch.owner_key()),
    )
    .into_iter()
    .next()
    .map_or_else(|| UNASSIGNED_OWNER.to_string(), |row| row.key)
}
