//! Stateless queries over a snapshot of task records.
//!
//! Nothing here mutates or persists; views call these over whatever slice of
//! records they hold.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;

use crate::clock::{day_stamp, Timestamp};
use crate::error::{Error, Result};
use crate::task::{TaskRecord, TaskStatus};

fn day_stamps<I>(dates: I) -> HashSet<Timestamp>
where
    I: IntoIterator<Item = NaiveDate>,
{
    dates.into_iter().map(day_stamp).collect()
}

/// Records active on any of `dates`, in input order.
///
/// Pass a single date as `[date]`.
pub fn filter_by_active_dates<I>(records: &[TaskRecord], dates: I) -> Vec<&TaskRecord>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let stamps = day_stamps(dates);
    if stamps.is_empty() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|record| record.dates_active.iter().any(|day| stamps.contains(day)))
        .collect()
}

/// True if any record is active on any of `dates`.
pub fn any_active_on<I>(records: &[TaskRecord], dates: I) -> bool
where
    I: IntoIterator<Item = NaiveDate>,
{
    let stamps = day_stamps(dates);
    if stamps.is_empty() {
        return false;
    }
    records
        .iter()
        .any(|record| record.dates_active.iter().any(|day| stamps.contains(day)))
}

pub fn exists<P>(records: &[TaskRecord], predicate: P) -> bool
where
    P: FnMut(&TaskRecord) -> bool,
{
    records.iter().any(predicate)
}

fn status_rank(status: TaskStatus) -> u8 {
    match status {
        TaskStatus::Incomplete => 0,
        TaskStatus::Complete => 1,
    }
}

/// Incomplete before complete, then by title.
pub fn sort_comparator(left: &TaskRecord, right: &TaskRecord) -> Ordering {
    status_rank(left.status)
        .cmp(&status_rank(right.status))
        .then_with(|| left.title.cmp(&right.title))
}

/// Stable sort by [`sort_comparator`].
pub fn sort_tasks(records: &mut [TaskRecord]) {
    records.sort_by(sort_comparator);
}

/// Resolve user input to a record id: exact match first, then a unique
/// case-insensitive prefix.
pub fn resolve_id(records: &[TaskRecord], input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
    }

    if records.iter().any(|record| record.has_id(trimmed)) {
        return Ok(trimmed.to_string());
    }

    let needle = trimmed.to_lowercase();
    let mut matches: Vec<&str> = records
        .iter()
        .filter_map(|record| record.id())
        .filter(|id| id.to_lowercase().starts_with(&needle))
        .collect();
    matches.sort_unstable();
    matches.dedup();

    match matches.as_slice() {
        [] => Err(Error::TaskNotFound(trimmed.to_string())),
        [only] => Ok(only.to_string()),
        many => Err(Error::InvalidArgument(format!(
            "ambiguous task id '{}': {}",
            trimmed,
            many.join(", ")
        ))),
    }
}
