//! Calendar windows anchored to a reference day.
//!
//! Windows and week buckets are inclusive on both ends. Weeks are ISO weeks
//! starting on Monday.
//!
//! Day windows saturate at the ends of the calendar. Week spans that would
//! leave the calendar are rejected, since every week in them gets a bucket.

use crate::error::{CadenceError, Result};
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// An inclusive range of calendar days.
///
/// A window whose `end` is before its `start` is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// First day of the window
    pub start: NaiveDate,
    /// Last day of the window
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Check if a day falls within this window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days covered, zero for an empty window.
    pub fn day_count(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// An empty window anchored at `day`.
    pub fn empty_at(day: NaiveDate) -> Self {
        match day.pred_opt() {
            Some(prev) => Self::new(day, prev),
            None => Self::new(day.succ_opt().unwrap_or(day), day),
        }
    }
}

/// `date + count` days, saturating at the last representable day.
pub fn days_after(date: NaiveDate, count: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(count)))
        .unwrap_or(NaiveDate::MAX)
}

/// `date - count` days, saturating at the first representable day.
pub fn days_before(date: NaiveDate, count: u32) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(count)))
        .unwrap_or(NaiveDate::MIN)
}

/// `[today - lookback_days, today + lookahead_days]`.
pub fn window(today: NaiveDate, lookback_days: u32, lookahead_days: u32) -> DateWindow {
    DateWindow::new(
        days_before(today, lookback_days),
        days_after(today, lookahead_days),
    )
}

/// `[today, today + weeks * 7 - 1]`, the span covered by `weeks` weeks of
/// agenda starting today.
pub fn agenda_window(today: NaiveDate, weeks: u32) -> Result<DateWindow> {
    if weeks == 0 {
        return Ok(DateWindow::empty_at(today));
    }
    let end = today
        .checked_add_days(Days::new(u64::from(weeks) * 7 - 1))
        .ok_or_else(|| weeks_out_of_range(weeks))?;
    Ok(DateWindow::new(today, end))
}

/// `[today, today + span_days - 1]`, a window of exactly `span_days` days.
pub fn day_span(today: NaiveDate, span_days: u32) -> DateWindow {
    match span_days.checked_sub(1) {
        Some(extra) => DateWindow::new(today, days_after(today, extra)),
        None => DateWindow::empty_at(today),
    }
}

/// The Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    days_before(date, date.weekday().num_days_from_monday())
}

/// One Monday-to-Sunday week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekBucket {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

impl WeekBucket {
    /// The week containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let start = week_start(date);
        Self {
            week_start: start,
            week_end: days_after(start, 6),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.week_start && date <= self.week_end
    }

    /// The following week, if the calendar has one.
    pub fn next(&self) -> Option<Self> {
        self.week_end.succ_opt().map(Self::containing)
    }
}

/// `weeks` consecutive week buckets starting with the week containing `today`.
///
/// Fails with a validation error when the last week would fall past the end
/// of the calendar.
pub fn week_buckets(today: NaiveDate, weeks: u32) -> Result<Vec<WeekBucket>> {
    let first = WeekBucket::containing(today);
    if weeks > 0 {
        first
            .week_start
            .checked_add_days(Days::new(u64::from(weeks) * 7 - 1))
            .ok_or_else(|| weeks_out_of_range(weeks))?;
    }
    let mut buckets = Vec::new();
    let mut bucket = Some(first);
    while let Some(current) = bucket {
        if buckets.len() == weeks as usize {
            break;
        }
        buckets.push(current);
        bucket = current.next();
    }
    Ok(buckets)
}

/// Every week bucket overlapping `window`, in order.
pub fn weeks_spanning(window: DateWindow) -> Vec<WeekBucket> {
    let mut buckets = Vec::new();
    if window.is_empty() {
        return buckets;
    }
    let mut bucket = Some(WeekBucket::containing(window.start));
    while let Some(current) = bucket.filter(|b| b.week_start <= window.end) {
        buckets.push(current);
        bucket = current.next();
    }
    buckets
}

/// Signed number of days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

fn weeks_out_of_range(weeks: u32) -> CadenceError {
    CadenceError::validation("weeks", format!("{weeks} weeks runs past the end of the calendar"))
}
