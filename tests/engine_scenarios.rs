//! End-to-end checks of the report builders against hand-built snapshots.

use chrono::{NaiveDate, TimeZone, Utc};
use cohort_cadence::core::{
    self, ActionReason, BalanceStatus, GapStatus, DEFAULT_BALANCE_THRESHOLD,
};
use cohort_cadence::{Cohort, Snapshot, Touchpoint};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn cohort(id: &str, name: &str, start: &str, end: &str) -> Cohort {
    Cohort {
        id: id.to_string(),
        name: name.to_string(),
        start_date: date(start),
        end_date: date(end),
        size: 20,
        notes: "Test cohort".to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn touch(cohort: &Cohort, day: &str, owner: &str, channel: &str) -> Touchpoint {
    Touchpoint {
        id: format!("touch-{}-{day}-{owner}-{channel}", cohort.id),
        cohort_id: cohort.id.clone(),
        cohort_name: cohort.name.clone(),
        title: "Check-in".to_string(),
        date: date(day),
        owner: owner.to_string(),
        channel: channel.to_string(),
        notes: "Weekly sync".to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap(),
    }
}

fn snapshot(cohorts: Vec<Cohort>, touchpoints: Vec<Touchpoint>) -> Snapshot {
    let mut snapshot = Snapshot::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    snapshot.cohorts = cohorts;
    snapshot.touchpoints = touchpoints;
    snapshot
}

fn alpha() -> Cohort {
    cohort("cohort-1", "Alpha Fellows", "2026-01-01", "2026-06-30")
}

#[test]
fn action_plan_recommends_dates_and_owners() {
    let a = cohort("cohort-a", "Cohort A", "2026-01-01", "2026-06-30");
    let b = cohort("cohort-b", "Cohort B", "2026-01-01", "2026-06-30");
    let c = cohort("cohort-c", "Cohort C", "2026-03-10", "2026-08-31");
    let touches = vec![
        touch(&a, "2026-01-15", "Program Lead", "Zoom"),
        touch(&a, "2026-02-20", "Program Lead", "Zoom"),
        touch(&b, "2026-01-01", "Success Coach", "Email"),
    ];
    let snap = snapshot(vec![a, b, c], touches);

    let plan = core::action_plan(&snap, date("2026-02-01"), 21, 30);
    assert_eq!(plan.action_count, 2);

    let first = &plan.entries[0];
    assert_eq!(first.cohort.id, "cohort-b");
    assert_eq!(first.recommended_date, date("2026-02-01"));
    assert_eq!(first.recommended_owner, "Success Coach");
    assert!(first.within_lookahead);
    assert_eq!(first.reason, ActionReason::NothingScheduled);

    let second = &plan.entries[1];
    assert_eq!(second.cohort.id, "cohort-c");
    assert_eq!(second.recommended_date, date("2026-03-10"));
    assert_eq!(second.recommended_owner, "Unassigned");
    assert!(!second.within_lookahead);
    assert_eq!(second.reason, ActionReason::KickoffNotScheduled);
}

#[test]
fn owner_balance_flags_over_and_under_loaded() {
    let cohort = alpha();
    let touches = [
        ("2026-02-03", "Owner A"),
        ("2026-02-04", "Owner A"),
        ("2026-02-05", "Owner A"),
        ("2026-02-06", "Owner A"),
        ("2026-02-07", "Owner B"),
        ("2026-02-08", "Owner B"),
        ("2026-02-09", "Owner B"),
        ("2026-02-10", "Owner C"),
    ]
    .iter()
    .map(|(day, owner)| touch(&cohort, day, owner, "Zoom"))
    .collect();
    let snap = snapshot(vec![cohort], touches);

    let report = core::owner_balance(&snap, date("2026-02-01"), 14, DEFAULT_BALANCE_THRESHOLD);
    assert_eq!(report.total_touchpoints, 8);
    assert_eq!(report.owners_count, 3);
    assert_eq!(report.avg_per_owner, Some(2.67));

    let status_of = |owner: &str| {
        report
            .owners
            .iter()
            .find(|entry| entry.owner == owner)
            .map(|entry| entry.status)
    };
    assert_eq!(status_of("Owner A"), Some(BalanceStatus::Overloaded));
    assert_eq!(status_of("Owner B"), Some(BalanceStatus::Balanced));
    assert_eq!(status_of("Owner C"), Some(BalanceStatus::Underloaded));

    let share_total: f64 = report.owners.iter().map(|entry| entry.share).sum();
    assert!((share_total - 1.0).abs() < 0.01);
}

#[test]
fn owner_capacity_flags_weeks_over_limit() {
    let cohort = alpha();
    let touches = vec![
        touch(&cohort, "2026-02-03", "Owner A", "Zoom"),
        touch(&cohort, "2026-02-04", "Owner A", "Zoom"),
        touch(&cohort, "2026-02-05", "Owner A", "Zoom"),
        touch(&cohort, "2026-02-10", "Owner B", "Zoom"),
        touch(&cohort, "2026-02-20", "Owner A", "Zoom"),
    ];
    let snap = snapshot(vec![cohort], touches);

    let report = core::owner_capacity(&snap, date("2026-02-01"), 2, Some(2), None).unwrap();
    assert_eq!(report.total_touchpoints, 4);
    assert_eq!(report.owners_count, 2);
    assert_eq!(report.over_limit_weeks, 1);

    let owner_a = report.owners.iter().find(|o| o.owner == "Owner A").unwrap();
    let busy = owner_a
        .weeks
        .iter()
        .find(|week| week.week_start == date("2026-02-02"))
        .unwrap();
    assert_eq!(busy.count, 3);
    assert!(busy.over_limit);
    assert_eq!(owner_a.over_limit_weeks, 1);
    assert_eq!(owner_a.total_touchpoints, 3);

    let filtered = core::owner_capacity(&snap, date("2026-02-01"), 2, Some(2), Some("owner b")).unwrap();
    assert_eq!(filtered.owners_count, 1);
    assert_eq!(filtered.over_limit_weeks, 0);
}

#[test]
fn owner_conflicts_lists_only_days_over_limit() {
    let cohort = alpha();
    let touches = vec![
        touch(&cohort, "2026-02-03", "Owner A", "Zoom"),
        touch(&cohort, "2026-02-03", "Owner A", "Email"),
        touch(&cohort, "2026-02-03", "Owner A", "Slack"),
        touch(&cohort, "2026-02-04", "Owner B", "Zoom"),
        touch(&cohort, "2026-02-04", "Owner B", "Email"),
    ];
    let snap = snapshot(vec![cohort], touches);

    let report = core::owner_conflicts(&snap, date("2026-02-01"), 7, 2, None);
    assert_eq!(report.total_touchpoints, 5);
    assert_eq!(report.owners_count, 1);
    assert_eq!(report.conflict_days, 1);

    let owner_a = &report.owners[0];
    assert_eq!(owner_a.owner, "Owner A");
    assert_eq!(owner_a.days.len(), 1);
    assert_eq!(owner_a.days[0].date, date("2026-02-03"));
    assert_eq!(owner_a.days[0].count, 3);

    for owner in &report.owners {
        assert!(owner.days.iter().all(|day| day.count > report.daily_limit as usize));
    }
}

#[test]
fn cohort_coverage_tracks_empty_weeks() {
    let alpha = alpha();
    let beta = cohort("cohort-2", "Beta Fellows", "2026-01-01", "2026-06-30");
    let touches = vec![
        touch(&alpha, "2026-02-03", "Lead A", "Zoom"),
        touch(&alpha, "2026-02-10", "Lead A", "Zoom"),
    ];
    let snap = snapshot(vec![alpha, beta], touches);

    let report = core::cohort_coverage(&snap, date("2026-02-02"), 4, None).unwrap();
    assert_eq!(report.weeks_tracked, 4);

    let covered = report.entries.iter().find(|e| e.cohort.id == "cohort-1").unwrap();
    assert_eq!(covered.weeks_with_touchpoints, 2);
    assert_eq!(covered.coverage_rate, 0.5);
    assert_eq!(covered.longest_gap_weeks, 2);

    let empty = report.entries.iter().find(|e| e.cohort.id == "cohort-2").unwrap();
    assert_eq!(empty.weeks_with_touchpoints, 0);
    assert_eq!(empty.longest_gap_weeks, 4);

    for entry in &report.entries {
        let expected = entry.weeks_with_touchpoints as f64 / entry.weeks_tracked as f64;
        assert!((entry.coverage_rate - expected).abs() < 1e-9);
    }
}

#[test]
fn channel_report_groups_channels_and_windows() {
    let alpha = alpha();
    let beta = cohort("cohort-2", "Beta Fellows", "2026-01-01", "2026-06-30");
    let touches = vec![
        touch(&alpha, "2026-02-05", "Lead A", "Zoom"),
        touch(&alpha, "2026-02-16", "Lead A", "Email"),
        touch(&beta, "2026-02-20", "Lead B", "Email"),
        touch(&beta, "2026-02-12", "Lead B", ""),
        touch(&alpha, "2026-01-20", "Lead A", "Zoom"),
    ];
    let snap = snapshot(vec![alpha, beta], touches);

    let report = core::channel_report(&snap, date("2026-02-15"), 14, 14, None, None).unwrap();
    assert_eq!(report.total_touchpoints, 4);

    let find = |name: &str| report.channels.iter().find(|c| c.channel == name).unwrap();

    let email = find("Email");
    assert_eq!((email.count, email.past_count, email.upcoming_count), (2, 0, 2));
    assert_eq!(email.next_touchpoint.as_ref().unwrap().date, date("2026-02-16"));

    let zoom = find("Zoom");
    assert_eq!((zoom.count, zoom.past_count, zoom.upcoming_count), (1, 1, 0));
    assert_eq!(zoom.last_touchpoint.as_ref().unwrap().date, date("2026-02-05"));

    assert_eq!(find("Unspecified").count, 1);

    for channel in &report.channels {
        assert_eq!(channel.past_count + channel.upcoming_count, channel.count);
    }

    let lead_b = core::channel_report(&snap, date("2026-02-15"), 14, 14, Some("Lead B"), None)
        .unwrap();
    assert_eq!(lead_b.total_touchpoints, 2);

    let unknown = core::channel_report(&snap, date("2026-02-15"), 14, 14, None, Some("Gamma"));
    assert!(unknown.is_err());
}

#[test]
fn weekday_report_lists_every_weekday() {
    let cohort = alpha();
    let touches = vec![
        touch(&cohort, "2026-02-02", "Lead A", "Zoom"),
        touch(&cohort, "2026-02-09", "Lead A", "Zoom"),
        touch(&cohort, "2026-02-18", "Lead B", "Zoom"),
    ];
    let snap = snapshot(vec![cohort], touches);

    let report = core::weekday_report(&snap, date("2026-02-10"), 14, 14, None);
    assert_eq!(report.weekdays.len(), 7);
    assert_eq!(report.weekdays[0].weekday, "Monday");
    assert_eq!(report.weekdays[0].count, 2);
    assert_eq!(report.weekdays[0].past_count, 2);
    assert_eq!(report.weekdays[2].weekday, "Wednesday");
    assert_eq!(report.weekdays[2].upcoming_count, 1);
    assert_eq!(report.weekdays[6].count, 0);
}

#[test]
fn gap_report_assigns_exactly_one_status() {
    let on_track = cohort("on-track", "On Track", "2026-01-01", "2026-06-30");
    let stale = cohort("stale", "Stale", "2026-01-02", "2026-06-30");
    let unscheduled = cohort("unscheduled", "Unscheduled", "2026-01-03", "2026-06-30");
    let at_risk = cohort("at-risk", "At Risk", "2026-01-04", "2026-06-30");
    let touches = vec![
        touch(&on_track, "2026-01-25", "Lead A", "Zoom"),
        touch(&on_track, "2026-02-10", "Lead A", "Zoom"),
        touch(&stale, "2025-12-01", "Lead A", "Zoom"),
        touch(&stale, "2026-02-05", "Lead A", "Zoom"),
        touch(&unscheduled, "2026-01-28", "Lead A", "Zoom"),
    ];
    let snap = snapshot(vec![on_track, stale, unscheduled, at_risk], touches);

    let report = core::gap_report(&snap, date("2026-02-01"), 14, 14);
    assert_eq!(report.counts.total(), snap.cohorts.len());
    for status in GapStatus::ALL {
        assert_eq!(report.counts.get(status), 1, "{status}");
    }
    let status_of = |id: &str| report.entries.iter().find(|e| e.cohort.id == id).unwrap().status;
    assert_eq!(status_of("on-track"), GapStatus::OnTrack);
    assert_eq!(status_of("stale"), GapStatus::Stale);
    assert_eq!(status_of("unscheduled"), GapStatus::Unscheduled);
    assert_eq!(status_of("at-risk"), GapStatus::AtRisk);
}

#[test]
fn cadence_status_orders_stale_first() {
    let quiet = cohort("quiet", "Quiet", "2026-01-01", "2026-06-30");
    let busy = cohort("busy", "Busy", "2026-01-01", "2026-06-30");
    let future = cohort("future", "Future", "2026-04-01", "2026-06-30");
    let touches = vec![
        touch(&quiet, "2026-01-02", "Lead A", "Zoom"),
        touch(&busy, "2026-01-30", "Lead A", "Zoom"),
        touch(&busy, "2026-02-05", "Lead A", "Zoom"),
    ];
    let snap = snapshot(vec![future, busy, quiet], touches);

    let report = core::cadence_status(&snap, date("2026-02-01"), 21, 30);
    let ids: Vec<&str> = report.entries.iter().map(|e| e.cohort.id.as_str()).collect();
    assert_eq!(ids, vec!["quiet", "busy", "future"]);
    assert_eq!(report.stale_count, 1);
    assert_eq!(report.entries[0].days_since_last, Some(30));
    assert!(report.entries[1].next_within_lookahead);
    assert_eq!(report.entries[2].days_since_last, None);
}

#[test]
fn oversized_parameters_fail_cleanly_or_cover_the_calendar() {
    let a = alpha();
    let snap = snapshot(vec![a.clone()], vec![touch(&a, "2026-02-03", "Owner A", "Zoom")]);
    let empty = snapshot(vec![], vec![]);
    let today = date("2026-02-01");

    let channels = core::channel_report(&empty, today, 100_000_000, 14, None, None).unwrap();
    assert_eq!(channels.window.start, NaiveDate::MIN);
    assert_eq!(channels.total_touchpoints, 0);

    let load = core::owner_load(&snap, NaiveDate::MAX, u32::MAX, None);
    assert_eq!(load.total_touchpoints, 0);
    let gaps = core::gap_report(&snap, today, u32::MAX, u32::MAX);
    assert_eq!(gaps.entries.len(), 1);
    assert_eq!(core::upcoming(&snap, today, u32::MAX).count, 1);

    let err = core::cohort_coverage(&snap, today, 4_000_000_000, None).unwrap_err();
    assert!(err.to_string().contains("weeks"));
    assert!(core::owner_capacity(&snap, today, u32::MAX, None, None).is_err());
    assert!(core::weekly_agenda(&snap, NaiveDate::MAX, 1, None, None).is_err());
}
