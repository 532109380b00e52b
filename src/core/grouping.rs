//! Shared grouping, filtering and rounding helpers for the report builders.

use crate::core::windowing::DateWindow;
use crate::error::Result;
use crate::model::{Snapshot, Touchpoint};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One row of a count breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCount {
    pub key: String,
    pub count: usize,
}

/// Count occurrences of each key, sorted by descending count then key.
pub fn tally<'a>(keys: impl IntoIterator<Item = &'a str>) -> Vec<KeyCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    let mut rows: Vec<KeyCount> = counts
        .into_iter()
        .map(|(key, count)| KeyCount {
            key: key.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    rows
}

/// Touchpoints dated inside `window` that pass `filter`, in snapshot order.
pub fn in_window<'a>(
    snapshot: &'a Snapshot,
    window: DateWindow,
    filter: &TouchpointFilter,
) -> Vec<&'a Touchpoint> {
    snapshot
        .touchpoints
        .iter()
        .filter(|touch| window.contains(touch.date) && filter.matches(touch))
        .collect()
}

/// Group touchpoints by a derived key. Groups keep snapshot order.
pub fn group_by<'a, F>(
    touches: impl IntoIterator<Item = &'a Touchpoint>,
    key: F,
) -> BTreeMap<String, Vec<&'a Touchpoint>>
where
    F: Fn(&Touchpoint) -> &str,
{
    let mut groups: BTreeMap<String, Vec<&'a Touchpoint>> = BTreeMap::new();
    for touch in touches {
        groups.entry(key(touch).to_string()).or_default().push(touch);
    }
    groups
}

/// Clone touchpoints into a date-ordered list. Same-day touchpoints keep
/// their snapshot order.
pub fn sorted_by_date<'a>(touches: impl IntoIterator<Item = &'a Touchpoint>) -> Vec<Touchpoint> {
    let mut sorted: Vec<Touchpoint> = touches.into_iter().cloned().collect();
    sorted.sort_by_key(|touch| touch.date);
    sorted
}

/// Touchpoint with the latest date; the first one wins a tie.
pub fn latest<'a>(touches: impl IntoIterator<Item = &'a Touchpoint>) -> Option<&'a Touchpoint> {
    touches.into_iter().fold(None, |best, touch| match best {
        Some(current) if current.date >= touch.date => Some(current),
        _ => Some(touch),
    })
}

/// Touchpoint with the earliest date; the first one wins a tie.
pub fn earliest<'a>(touches: impl IntoIterator<Item = &'a Touchpoint>) -> Option<&'a Touchpoint> {
    touches.into_iter().fold(None, |best, touch| match best {
        Some(current) if current.date <= touch.date => Some(current),
        _ => Some(touch),
    })
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Optional owner and cohort restrictions applied before grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchpointFilter {
    /// Owner to keep, compared case-insensitively against the owner key
    pub owner: Option<String>,
    /// Resolved cohort id to keep
    pub cohort_id: Option<String>,
}

impl TouchpointFilter {
    /// Build a filter from raw user input. Blank inputs mean "no filter";
    /// a cohort that does not resolve is an error.
    pub fn resolve(snapshot: &Snapshot, owner: Option<&str>, cohort: Option<&str>) -> Result<Self> {
        let cohort_id = match non_blank(cohort) {
            Some(identifier) => Some(snapshot.find_cohort(identifier)?.id.clone()),
            None => None,
        };
        Ok(Self {
            owner: non_blank(owner).map(str::to_string),
            cohort_id,
        })
    }

    /// Filter on owner only.
    pub fn owner(owner: Option<&str>) -> Self {
        Self {
            owner: non_blank(owner).map(str::to_string),
            cohort_id: None,
        }
    }

    pub fn matches(&self, touch: &Touchpoint) -> bool {
        let owner_ok = self
            .owner
            .as_deref()
            .map_or(true, |owner| touch.owner_key().trim().eq_ignore_ascii_case(owner));
        let cohort_ok = self
            .cohort_id
            .as_deref()
            .map_or(true, |id| touch.cohort_id == id);
        owner_ok && cohort_ok
    }
}

/// Trimmed input, or `None` when blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
