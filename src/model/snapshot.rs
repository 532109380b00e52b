//! In-memory snapshot of all records.
//!
//! A snapshot is loaded once per invocation, mutated in memory by the
//! creation operations, and handed back to the store to be written wholesale.

use crate::error::{CadenceError, Result};
use crate::model::types::{Cohort, Touchpoint};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current on-disk document version.
pub const STORE_VERSION: u32 = 1;

/// Document metadata written alongside the records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub created_at: DateTime<Utc>,
    pub version: u32,
}

/// All cohorts and touchpoints, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub meta: StoreMeta,
    pub cohorts: Vec<Cohort>,
    pub touchpoints: Vec<Touchpoint>,
}

/// Attributes for a new cohort.
#[derive(Debug, Clone)]
pub struct NewCohort {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub size: u32,
    pub notes: String,
}

/// Attributes for a new touchpoint. `cohort` is a cohort id or name.
#[derive(Debug, Clone)]
pub struct NewTouchpoint {
    pub cohort: String,
    pub title: String,
    pub date: NaiveDate,
    pub owner: String,
    pub channel: String,
    pub notes: String,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            meta: StoreMeta {
                created_at,
                version: STORE_VERSION,
            },
            cohorts: Vec::new(),
            touchpoints: Vec::new(),
        }
    }

    /// Resolve a cohort by id or case-insensitive name.
    pub fn find_cohort(&self, identifier: &str) -> Result<&Cohort> {
        self.cohorts
            .iter()
            .find(|cohort| cohort.matches(identifier))
            .ok_or_else(|| CadenceError::NotFound(identifier.trim().to_string()))
    }

    /// Touchpoints logged against `cohort_id`, in snapshot order.
    pub fn touchpoints_for<'a>(
        &'a self,
        cohort_id: &'a str,
    ) -> impl Iterator<Item = &'a Touchpoint> + 'a {
        self.touchpoints
            .iter()
            .filter(move |touch| touch.cohort_id == cohort_id)
    }

    /// Cohorts ordered by start date.
    pub fn list_cohorts(&self) -> Vec<&Cohort> {
        let mut cohorts: Vec<&Cohort> = self.cohorts.iter().collect();
        cohorts.sort_by_key(|cohort| cohort.start_date);
        cohorts
    }

    /// Validate and append a new cohort.
    pub fn add_cohort(&mut self, input: NewCohort, created_at: DateTime<Utc>) -> Result<Cohort> {
        let name = required("name", &input.name)?;
        if input.start_date > input.end_date {
            return Err(CadenceError::validation(
                "end_date",
                format!(
                    "{} is before start date {}",
                    input.end_date, input.start_date
                ),
            ));
        }
        if input.size == 0 {
            return Err(CadenceError::validation("size", "must be a positive integer"));
        }

        let cohort = Cohort {
            id: generate_id("cohort"),
            name,
            start_date: input.start_date,
            end_date: input.end_date,
            size: input.size,
            notes: input.notes.trim().to_string(),
            created_at,
        };
        self.cohorts.push(cohort.clone());
        Ok(cohort)
    }

    /// Validate and append a new touchpoint, copying the cohort's name.
    pub fn add_touchpoint(
        &mut self,
        input: NewTouchpoint,
        created_at: DateTime<Utc>,
    ) -> Result<Touchpoint> {
        let identifier = required("cohort", &input.cohort)?;
        let title = required("title", &input.title)?;
        let cohort = self.find_cohort(&identifier)?;

        let touchpoint = Touchpoint {
            id: generate_id("touchpoint"),
            cohort_id: cohort.id.clone(),
            cohort_name: cohort.name.clone(),
            title,
            date: input.date,
            owner: input.owner.trim().to_string(),
            channel: input.channel.trim().to_string(),
            notes: input.notes.trim().to_string(),
            created_at,
        };
        self.touchpoints.push(touchpoint.clone());
        Ok(touchpoint)
    }
}

fn required(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CadenceError::validation(field, "must not be blank"));
    }
    Ok(value.to_string())
}

fn generate_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}
