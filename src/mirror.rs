//! Mirroring the snapshot into an external database.
//!
//! The contract is an idempotent upsert of cohorts and touchpoints keyed on
//! `id`, applied all-or-nothing, followed by one appended sync event. The
//! in-memory [`MemoryMirror`] implements the contract without a database
//! driver.

use crate::core::grouping::{in_window, sorted_by_date, TouchpointFilter};
use crate::core::status::cadence_status;
use crate::core::windowing::window;
use crate::error::{CadenceError, Result};
use crate::model::{Cohort, Snapshot, StoreMeta, Touchpoint, STORE_VERSION};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Preferred environment variable for the mirror connection URL.
pub const DATABASE_URL_VAR: &str = "GS_CADENCE_DATABASE_URL";
/// Fallback environment variable.
pub const FALLBACK_DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Connection settings for the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    pub database_url: String,
}

impl MirrorConfig {
    /// Read the connection URL from the process environment.
    ///
    /// ```no_run
    /// use cohort_cadence::MirrorConfig;
    ///
    /// match MirrorConfig::from_env() {
    ///     Ok(config) => println!("mirroring to {}", config.database_url),
    ///     Err(e) => eprintln!("{e}"),
    /// }
    /// ```
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the connection URL through `lookup`, trying the preferred
    /// variable first.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = [DATABASE_URL_VAR, FALLBACK_DATABASE_URL_VAR]
            .into_iter()
            .filter_map(|name| lookup(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .ok_or_else(|| {
                CadenceError::MirrorUnavailable(format!("{DATABASE_URL_VAR} is not set"))
            })?;

        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            return Err(CadenceError::MirrorUnavailable(
                "database URL must start with postgres:// or postgresql://".to_string(),
            ));
        }
        Ok(Self { database_url: url })
    }
}

/// One row of the sync log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub synced_at: DateTime<Utc>,
    pub cohorts: usize,
    pub touchpoints: usize,
}

/// An active cohort that has gone quiet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaleCohort {
    pub id: String,
    pub name: String,
    pub last_touchpoint: Option<NaiveDate>,
    pub days_since_last: Option<i64>,
}

/// Read-side view of the mirror.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorSummary {
    pub lookahead_days: u32,
    pub stale_days: u32,
    pub cohort_count: usize,
    pub touchpoint_count: usize,
    pub last_sync: Option<SyncEvent>,
    pub upcoming: Vec<Touchpoint>,
    pub stale_cohorts: Vec<StaleCohort>,
}

pub trait SnapshotMirror {
    /// Upsert every record of `snapshot` and log the sync.
    fn sync(&mut self, snapshot: &Snapshot, at: DateTime<Utc>) -> Result<SyncEvent>;

    /// Sync the fixed demonstration dataset.
    fn seed(&mut self, at: DateTime<Utc>) -> Result<SyncEvent> {
        self.sync(&demo_snapshot(), at)
    }

    fn summary(&self, today: NaiveDate, lookahead_days: u32, stale_days: u32)
        -> Result<MirrorSummary>;
}

/// Mirror held in memory, keyed like the database tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryMirror {
    cohorts: BTreeMap<String, Cohort>,
    touchpoints: BTreeMap<String, Touchpoint>,
    sync_events: Vec<SyncEvent>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cohort_rows(&self) -> usize {
        self.cohorts.len()
    }

    pub fn touchpoint_rows(&self) -> usize {
        self.touchpoints.len()
    }

    pub fn sync_events(&self) -> &[SyncEvent] {
        &self.sync_events
    }

    fn as_snapshot(&self) -> Snapshot {
        let created_at = self
            .sync_events
            .first()
            .map_or(DateTime::<Utc>::UNIX_EPOCH, |event| event.synced_at);
        Snapshot {
            meta: StoreMeta {
                created_at,
                version: STORE_VERSION,
            },
            cohorts: self.cohorts.values().cloned().collect(),
            touchpoints: self.touchpoints.values().cloned().collect(),
        }
    }
}

impl SnapshotMirror for MemoryMirror {
    fn sync(&mut self, snapshot: &Snapshot, at: DateTime<Utc>) -> Result<SyncEvent> {
        // A rejected sync must leave every table untouched
        let known: HashSet<&str> = self
            .cohorts
            .keys()
            .map(String::as_str)
            .chain(snapshot.cohorts.iter().map(|cohort| cohort.id.as_str()))
            .collect();
        if let Some(orphan) = snapshot
            .touchpoints
            .iter()
            .find(|touch| !known.contains(touch.cohort_id.as_str()))
        {
            return Err(CadenceError::validation(
                "cohort_id",
                format!(
                    "touchpoint {} references unknown cohort {}",
                    orphan.id, orphan.cohort_id
                ),
            ));
        }

        for cohort in &snapshot.cohorts {
            self.cohorts.insert(cohort.id.clone(), cohort.clone());
        }
        for touch in &snapshot.touchpoints {
            self.touchpoints.insert(touch.id.clone(), touch.clone());
        }

        let event = SyncEvent {
            synced_at: at,
            cohorts: snapshot.cohorts.len(),
            touchpoints: snapshot.touchpoints.len(),
        };
        self.sync_events.push(event);
        info!(
            cohorts = event.cohorts,
            touchpoints = event.touchpoints,
            "Synced snapshot to mirror"
        );
        Ok(event)
    }

    fn summary(
        &self,
        today: NaiveDate,
        lookahead_days: u32,
        stale_days: u32,
    ) -> Result<MirrorSummary> {
        let mirrored = self.as_snapshot();
        let upcoming = sorted_by_date(in_window(
            &mirrored,
            window(today, 0, lookahead_days),
            &TouchpointFilter::default(),
        ));
        let stale_cohorts: Vec<StaleCohort> = cadence_status(&mirrored, today, stale_days, lookahead_days)
            .entries
            .into_iter()
            .filter(|entry| entry.stale)
            .map(|entry| StaleCohort {
                id: entry.cohort.id,
                name: entry.cohort.name,
                last_touchpoint: entry.last_touchpoint.map(|touch| touch.date),
                days_since_last: entry.days_since_last,
            })
            .collect();
        debug!(stale = stale_cohorts.len(), upcoming = upcoming.len(), "Summarised mirror");

        Ok(MirrorSummary {
            lookahead_days,
            stale_days,
            cohort_count: self.cohorts.len(),
            touchpoint_count: self.touchpoints.len(),
            last_sync: self.sync_events.last().copied(),
            upcoming,
            stale_cohorts,
        })
    }
}

fn day(year: i32, month: u32, dom: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, dom).unwrap_or_default()
}

/// Fixed demonstration dataset used by [`SnapshotMirror::seed`].
pub fn demo_snapshot() -> Snapshot {
    let created_at = day(2026, 1, 5).and_time(NaiveTime::MIN).and_utc();
    let cohort = |id: &str, name: &str, start: NaiveDate, end: NaiveDate, size: u32| Cohort {
        id: id.to_string(),
        name: name.to_string(),
        start_date: start,
        end_date: end,
        size,
        notes: String::new(),
        created_at,
    };
    let cohorts = vec![
        cohort("cohort-demo-spring", "Spring Scholars", day(2026, 1, 12), day(2026, 5, 29), 24),
        cohort("cohort-demo-summer", "Summer Bridge", day(2026, 6, 1), day(2026, 8, 14), 16),
        cohort("cohort-demo-fall", "Fall Fellows", day(2025, 9, 2), day(2025, 12, 12), 20),
    ];

    let touch = |id: &str, cohort: &Cohort, title: &str, date: NaiveDate, owner: &str, channel: &str| {
        Touchpoint {
            id: id.to_string(),
            cohort_id: cohort.id.clone(),
            cohort_name: cohort.name.clone(),
            title: title.to_string(),
            date,
            owner: owner.to_string(),
            channel: channel.to_string(),
            notes: String::new(),
            created_at,
        }
    };
    let touchpoints = vec![
        touch("touchpoint-demo-1", &cohorts[0], "Kickoff", day(2026, 1, 12), "Success Coach", "Zoom"),
        touch("touchpoint-demo-2", &cohorts[0], "Mentor check-in", day(2026, 2, 9), "Mentor Lead", "Email"),
        touch("touchpoint-demo-3", &cohorts[0], "Midpoint survey", day(2026, 3, 16), "Success Coach", "Survey"),
        touch("touchpoint-demo-4", &cohorts[1], "Orientation", day(2026, 6, 1), "Program Manager", "In person"),
        touch("touchpoint-demo-5", &cohorts[2], "Closing session", day(2025, 12, 10), "Success Coach", "Zoom"),
    ];

    Snapshot {
        meta: StoreMeta {
            created_at,
            version: STORE_VERSION,
        },
        cohorts,
        touchpoints,
    }
}
