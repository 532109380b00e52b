//! Owner and channel workload views.
//!
//! Each builder filters touchpoints to a date window, groups them by a key
//! and summarises every group. Groups are ordered by descending count, then
//! by key.

use crate::core::grouping::{
    earliest, group_by, in_window, latest, non_blank, round_to, sorted_by_date, tally, KeyCount,
    TouchpointFilter,
};
use crate::core::windowing::{window, DateWindow};
use crate::error::Result;
use crate::model::{Snapshot, Touchpoint};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Imbalance tolerance used when none is supplied.
pub const DEFAULT_BALANCE_THRESHOLD: f64 = 0.25;

fn by_count_then_key<T>(rows: &mut [T], count: impl Fn(&T) -> usize, key: impl Fn(&T) -> &str) {
    rows.sort_by(|a, b| count(b).cmp(&count(a)).then_with(|| key(a).cmp(key(b))));
}

// ============================================================================
// Owner load
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerLoad {
    pub owner: String,
    pub count: usize,
    pub channels: Vec<KeyCount>,
    pub cohorts: Vec<KeyCount>,
    pub touchpoints: Vec<Touchpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerLoadReport {
    pub days: u32,
    pub window: DateWindow,
    pub owner_filter: Option<String>,
    pub total_touchpoints: usize,
    pub owners: Vec<OwnerLoad>,
}

/// Upcoming touchpoints per owner over `[today, today + days]`.
pub fn owner_load(
    snapshot: &Snapshot,
    today: NaiveDate,
    days: u32,
    owner_filter: Option<&str>,
) -> OwnerLoadReport {
    let window = window(today, 0, days);
    let filter = TouchpointFilter::owner(owner_filter);
    let touches = in_window(snapshot, window, &filter);

    let mut owners: Vec<OwnerLoad> = group_by(touches.iter().copied(), Touchpoint::owner_key)
        .into_iter()
        .map(|(owner, group)| OwnerLoad {
            owner,
            count: group.len(),
            channels: tally(group.iter().map(|t| t.channel_key())),
            cohorts: tally(group.iter().map(|t| t.cohort_name.as_str())),
            touchpoints: sorted_by_date(group),
        })
        .collect();
    by_count_then_key(&mut owners, |o| o.count, |o| o.owner.as_str());

    OwnerLoadReport {
        days,
        window,
        owner_filter: filter.owner,
        total_touchpoints: touches.len(),
        owners,
    }
}

// ============================================================================
// Owner balance
// ============================================================================

/// Where an owner's load sits relative to the team average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    Overloaded,
    Balanced,
    Underloaded,
}

impl BalanceStatus {
    /// `count` against `avg` widened by `threshold` on either side.
    pub fn classify(count: usize, avg: f64, threshold: f64) -> Self {
        let count = count as f64;
        if count > avg * (1.0 + threshold) {
            BalanceStatus::Overloaded
        } else if count < avg * (1.0 - threshold) {
            BalanceStatus::Underloaded
        } else {
            BalanceStatus::Balanced
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCounts {
    pub overloaded: usize,
    pub balanced: usize,
    pub underloaded: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerBalance {
    pub owner: String,
    pub count: usize,
    /// Fraction of all touchpoints (3 decimals)
    pub share: f64,
    /// `count - avg_per_owner` (2 decimals)
    pub delta_from_avg: f64,
    pub status: BalanceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerBalanceReport {
    pub days: u32,
    pub window: DateWindow,
    pub threshold: f64,
    pub total_touchpoints: usize,
    pub owners_count: usize,
    /// Touchpoints per owner (2 decimals), absent when nobody has any
    pub avg_per_owner: Option<f64>,
    pub status_counts: BalanceCounts,
    pub owners: Vec<OwnerBalance>,
}

/// Compare each owner's upcoming load over `[today, today + days]` to the
/// team average.
pub fn owner_balance(
    snapshot: &Snapshot,
    today: NaiveDate,
    days: u32,
    threshold: f64,
) -> OwnerBalanceReport {
    let window = window(today, 0, days);
    let filter = TouchpointFilter::default();
    let touches = in_window(snapshot, window, &filter);
    let total = touches.len();

    let groups = group_by(touches.iter().copied(), Touchpoint::owner_key);
    let owners_count = groups.len();
    let avg_per_owner = (owners_count > 0).then(|| round_to(total as f64 / owners_count as f64, 2));

    let mut status_counts = BalanceCounts::default();
    let mut owners: Vec<OwnerBalance> = groups
        .into_iter()
        .map(|(owner, group)| {
            let count = group.len();
            let avg = avg_per_owner.unwrap_or(0.0);
            let status = BalanceStatus::classify(count, avg, threshold);
            match status {
                BalanceStatus::Overloaded => status_counts.overloaded += 1,
                BalanceStatus::Balanced => status_counts.balanced += 1,
                BalanceStatus::Underloaded => status_counts.underloaded += 1,
            }
            OwnerBalance {
                owner,
                count,
                share: round_to(count as f64 / total as f64, 3),
                delta_from_avg: round_to(count as f64 - avg, 2),
                status,
            }
        })
        .collect();
    by_count_then_key(&mut owners, |o| o.count, |o| o.owner.as_str());

    debug!(total, owners_count, "computed owner balance");

    OwnerBalanceReport {
        days,
        window,
        threshold,
        total_touchpoints: total,
        owners_count,
        avg_per_owner,
        status_counts,
        owners,
    }
}

// ============================================================================
// Channel report
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub channel: String,
    pub count: usize,
    /// Touchpoints before today
    pub past_count: usize,
    /// Touchpoints today or later
    pub upcoming_count: usize,
    pub last_touchpoint: Option<Touchpoint>,
    pub next_touchpoint: Option<Touchpoint>,
    pub owners: Vec<KeyCount>,
    pub cohorts: Vec<KeyCount>,
    pub touchpoints: Vec<Touchpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelReport {
    pub lookback_days: u32,
    pub lookahead_days: u32,
    pub window: DateWindow,
    pub owner_filter: Option<String>,
    pub cohort_filter: Option<String>,
    pub total_touchpoints: usize,
    pub channels: Vec<ChannelSummary>,
}

/// Touchpoints per channel over `[today - lookback, today + lookahead]`.
pub fn channel_report(
    snapshot: &Snapshot,
    today: NaiveDate,
    lookback_days: u32,
    lookahead_days: u32,
    owner_filter: Option<&str>,
    cohort_filter: Option<&str>,
) -> Result<ChannelReport> {
    let window = window(today, lookback_days, lookahead_days);
    let filter = TouchpointFilter::resolve(snapshot, owner_filter, cohort_filter)?;
    let touches = in_window(snapshot, window, &filter);

    let mut channels: Vec<ChannelSummary> =
        group_by(touches.iter().copied(), Touchpoint::channel_key)
            .into_iter()
            .map(|(channel, group)| {
                let (past, upcoming): (Vec<&Touchpoint>, Vec<&Touchpoint>) =
                    group.iter().copied().partition(|t| t.date < today);
                ChannelSummary {
                    channel,
                    count: group.len(),
                    past_count: past.len(),
                    upcoming_count: upcoming.len(),
                    last_touchpoint: latest(past).cloned(),
                    next_touchpoint: earliest(upcoming).cloned(),
                    owners: tally(group.iter().map(|t| t.owner_key())),
                    cohorts: tally(group.iter().map(|t| t.cohort_name.as_str())),
                    touchpoints: sorted_by_date(group),
                }
            })
            .collect();
    by_count_then_key(&mut channels, |c| c.count, |c| c.channel.as_str());

    Ok(ChannelReport {
        lookback_days,
        lookahead_days,
        window,
        owner_filter: filter.owner,
        cohort_filter: non_blank(cohort_filter).map(str::to_string),
        total_touchpoints: touches.len(),
        channels,
    })
}

// ============================================================================
// Weekday report
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekdaySummary {
    pub weekday: String,
    pub count: usize,
    pub past_count: usize,
    pub upcoming_count: usize,
    pub touchpoints: Vec<Touchpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekdayReport {
    pub lookback_days: u32,
    pub lookahead_days: u32,
    pub window: DateWindow,
    pub owner_filter: Option<String>,
    pub total_touchpoints: usize,
    /// Monday through Sunday, always seven entries
    pub weekdays: Vec<WeekdaySummary>,
}

/// Touchpoints per day of the week over `[today - lookback, today + lookahead]`.
pub fn weekday_report(
    snapshot: &Snapshot,
    today: NaiveDate,
    lookback_days: u32,
    lookahead_days: u32,
    owner_filter: Option<&str>,
) -> WeekdayReport {
    use chrono::Datelike;

    let window = window(today, lookback_days, lookahead_days);
    let filter = TouchpointFilter::owner(owner_filter);
    let touches = in_window(snapshot, window, &filter);

    let mut weekdays = Vec::with_capacity(7);
    let mut day = Weekday::Mon;
    for _ in 0..7 {
        let group: Vec<&Touchpoint> = touches
            .iter()
            .copied()
            .filter(|t| t.date.weekday() == day)
            .collect();
        let past_count = group.iter().filter(|t| t.date < today).count();
        weekdays.push(WeekdaySummary {
            weekday: weekday_name(day).to_string(),
            count: group.len(),
            past_count,
            upcoming_count: group.len() - past_count,
            touchpoints: sorted_by_date(group),
        });
        day = day.succ();
    }

    WeekdayReport {
        lookback_days,
        lookahead_days,
        window,
        owner_filter: filter.owner,
        total_touchpoints: touches.len(),
        weekdays,
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CadenceError;
    use crate::model::Cohort;
    use chrono::Utc;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn touch(cohort_id: &str, day: &str, owner: &str, channel: &str) -> Touchpoint {
        Touchpoint {
            id: format!("touch-{cohort_id}-{day}-{owner}-{channel}"),
            cohort_id: cohort_id.to_string(),
            cohort_name: format!("{cohort_id} fellows"),
            title: "Check-in".to_string(),
            date: date(day),
            owner: owner.to_string(),
            channel: channel.to_string(),
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    fn snapshot(touchpoints: Vec<Touchpoint>) -> Snapshot {
        let mut snapshot = Snapshot::new(Utc::now());
        for id in ["alpha", "beta"] {
            snapshot.cohorts.push(Cohort {
                id: id.to_string(),
                name: format!("{id} fellows"),
                start_date: date("2026-01-01"),
                end_date: date("2026-06-30"),
                size: 20,
                notes: String::new(),
                created_at: Utc::now(),
            });
        }
        snapshot.touchpoints = touchpoints;
        snapshot
    }

    #[test]
    fn test_owner_load_groups_and_breaks_ties_by_name() {
        let snap = snapshot(vec![
            touch("alpha", "2026-02-05", "Lead B", "Zoom"),
            touch("alpha", "2026-02-03", "Lead B", "Email"),
            touch("beta", "2026-02-04", "", "Zoom"),
            touch("beta", "2026-02-06", "Lead A", "Zoom"),
            touch("beta", "2026-02-07", "Lead A", ""),
            touch("beta", "2026-03-30", "Lead A", "Zoom"),
            touch("beta", "2026-01-30", "Lead A", "Zoom"),
        ]);
        let report = owner_load(&snap, date("2026-02-01"), 14, None);

        assert_eq!(report.total_touchpoints, 5);
        let owners: Vec<(&str, usize)> =
            report.owners.iter().map(|o| (o.owner.as_str(), o.count)).collect();
        assert_eq!(owners, vec![("Lead A", 2), ("Lead B", 2), ("Unassigned", 1)]);

        let lead_b = &report.owners[1];
        assert_eq!(lead_b.touchpoints[0].date, date("2026-02-03"));
        assert_eq!(lead_b.cohorts[0].key, "alpha fellows");

        let lead_a = &report.owners[0];
        assert_eq!(lead_a.channels.len(), 2);
        assert!(lead_a.channels.iter().any(|c| c.key == "Unspecified"));
    }

    #[test]
    fn test_padded_owner_and_channel_group_with_trimmed() {
        let snap = snapshot(vec![
            touch("alpha", "2026-02-03", "Lead A ", " Zoom"),
            touch("alpha", "2026-02-04", "Lead A", "Zoom"),
        ]);
        let load = owner_load(&snap, date("2026-02-01"), 14, None);
        assert_eq!(load.owners.len(), 1);
        assert_eq!(load.owners[0].owner, "Lead A");
        assert_eq!(load.owners[0].count, 2);
        assert_eq!(load.owners[0].channels.len(), 1);

        let channels = channel_report(&snap, date("2026-02-01"), 0, 14, None, None).unwrap();
        assert_eq!(channels.channels.len(), 1);
        assert_eq!(channels.channels[0].channel, "Zoom");
    }

    #[test]
    fn test_owner_load_filter() {
        let snap = snapshot(vec![
            touch("alpha", "2026-02-05", "Lead B", "Zoom"),
            touch("alpha", "2026-02-03", "Lead A", "Email"),
        ]);
        let report = owner_load(&snap, date("2026-02-01"), 14, Some(" lead a"));
        assert_eq!(report.total_touchpoints, 1);
        assert_eq!(report.owners.len(), 1);
        assert_eq!(report.owner_filter.as_deref(), Some("lead a"));
    }

    #[test]
    fn test_owner_balance_shares_sum_to_one() {
        let snap = snapshot(vec![
            touch("alpha", "2026-02-02", "A", "Zoom"),
            touch("alpha", "2026-02-03", "A", "Zoom"),
            touch("alpha", "2026-02-04", "B", "Zoom"),
            touch("alpha", "2026-02-05", "C", "Zoom"),
            touch("alpha", "2026-02-06", "D", "Zoom"),
            touch("alpha", "2026-02-07", "E", "Zoom"),
        ]);
        let report = owner_balance(&snap, date("2026-02-01"), 14, DEFAULT_BALANCE_THRESHOLD);

        assert_eq!(report.owners_count, 5);
        assert_eq!(report.avg_per_owner, Some(1.2));
        let share_sum: f64 = report.owners.iter().map(|o| o.share).sum();
        assert!((share_sum - 1.0).abs() < 0.01);

        let a = &report.owners[0];
        assert_eq!(a.owner, "A");
        assert_eq!(a.status, BalanceStatus::Overloaded);
        assert_eq!(a.delta_from_avg, 0.8);
        assert_eq!(report.status_counts.overloaded, 1);
        assert_eq!(report.status_counts.balanced, 4);
    }

    #[test]
    fn test_owner_balance_empty_window() {
        let snap = snapshot(vec![touch("alpha", "2026-05-02", "A", "Zoom")]);
        let report = owner_balance(&snap, date("2026-02-01"), 14, 0.25);
        assert_eq!(report.total_touchpoints, 0);
        assert_eq!(report.owners_count, 0);
        assert_eq!(report.avg_per_owner, None);
        assert!(report.owners.is_empty());
    }

    #[test]
    fn test_channel_report_cohort_filter() {
        let snap = snapshot(vec![
            touch("alpha", "2026-02-05", "Lead A", "Zoom"),
            touch("beta", "2026-02-16", "Lead B", "Email"),
            touch("beta", "2026-02-15", "Lead B", "Email"),
        ]);
        let report =
            channel_report(&snap, date("2026-02-15"), 14, 14, None, Some("Beta Fellows")).unwrap();

        assert_eq!(report.total_touchpoints, 2);
        assert_eq!(report.cohort_filter.as_deref(), Some("Beta Fellows"));
        let email = &report.channels[0];
        assert_eq!(email.past_count, 0);
        assert_eq!(email.upcoming_count, 2);
        assert_eq!(email.next_touchpoint.as_ref().unwrap().date, date("2026-02-15"));
        assert!(email.last_touchpoint.is_none());

        let err = channel_report(&snap, date("2026-02-15"), 14, 14, None, Some("Gamma"))
            .unwrap_err();
        assert!(matches!(err, CadenceError::NotFound(_)));
    }

    #[test]
    fn test_weekday_report_lists_every_day() {
        let snap = snapshot(vec![
            touch("alpha", "2026-02-09", "Lead A", "Zoom"),
            touch("alpha", "2026-02-10", "Lead A", "Email"),
            touch("alpha", "2026-02-16", "Lead B", "Email"),
            touch("alpha", "2026-02-01", "Lead A", "Chat"),
        ]);
        let report = weekday_report(&snap, date("2026-02-12"), 7, 7, None);

        assert_eq!(report.total_touchpoints, 3);
        assert_eq!(report.weekdays.len(), 7);
        assert_eq!(report.weekdays[0].weekday, "Monday");
        assert_eq!(report.weekdays[6].weekday, "Sunday");

        let monday = &report.weekdays[0];
        assert_eq!(monday.count, 2);
        assert_eq!(monday.past_count, 1);
        assert_eq!(monday.upcoming_count, 1);

        let tuesday = &report.weekdays[1];
        assert_eq!((tuesday.count, tuesday.past_count), (1, 1));
        assert_eq!(report.weekdays[6].count, 0);
    }

    #[test]
    fn test_weekday_report_owner_filter() {
        let snap = snapshot(vec![
            touch("alpha", "2026-02-09", "Lead A", "Zoom"),
            touch("alpha", "2026-02-10", "Lead B", "Email"),
        ]);
        let report = weekday_report(&snap, date("2026-02-10"), 7, 7, Some("Lead A"));
        assert_eq!(report.total_touchpoints, 1);
        assert_eq!(report.owner_filter.as_deref(), Some("Lead A"));
        assert_eq!(report.weekdays[0].count, 1);
    }
}
