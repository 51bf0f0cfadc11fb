//! Per-session selection state: which day is current, which day is being
//! viewed, and which task is being edited.
//!
//! The store knows nothing about this. The selected task is a working copy;
//! edits to it are invisible to the store until pushed with `update`.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::task::{create_task_record, TaskRecord};

pub struct SessionState {
    clock: Arc<dyn Clock>,
    current_date: NaiveDate,
    selected_date: NaiveDate,
    selected_task: TaskRecord,
    selected_task_ids: Vec<String>,
}

impl SessionState {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let today = clock.today();
        let selected_task = create_task_record(clock.as_ref());
        Self {
            clock,
            current_date: today,
            selected_date: today,
            selected_task,
            selected_task_ids: Vec::new(),
        }
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    /// Advance `current_date` if the calendar has moved on. Returns whether
    /// it changed.
    pub fn assess_current(&mut self) -> bool {
        let today = self.clock.today();
        if self.current_date < today {
            self.current_date = today;
            info!(date = %today, "current date updated");
            return true;
        }
        false
    }

    /// Select a day to view. Days after today are rejected.
    pub fn select(&mut self, date: NaiveDate) -> Result<()> {
        self.validate_date(date)?;
        debug!(date = %date, "selected date");
        self.selected_date = date;
        Ok(())
    }

    pub fn select_today(&mut self) {
        self.selected_date = self.clock.today();
    }

    pub fn validate_date(&self, date: NaiveDate) -> Result<()> {
        if date > self.clock.today() {
            warn!(date = %date, "invalid date selection requested");
            return Err(Error::InvalidDateSelection(date));
        }
        Ok(())
    }

    pub fn selected_task(&self) -> &TaskRecord {
        &self.selected_task
    }

    pub fn selected_task_mut(&mut self) -> &mut TaskRecord {
        &mut self.selected_task
    }

    /// Start editing a copy of `record`.
    pub fn edit(&mut self, record: TaskRecord) {
        debug!(id = ?record.id, "selected task for editing");
        self.selected_task = record;
    }

    /// Hand back the working copy and reset to a blank record.
    pub fn take_selected_task(&mut self) -> TaskRecord {
        std::mem::replace(
            &mut self.selected_task,
            create_task_record(self.clock.as_ref()),
        )
    }

    pub fn selected_task_ids(&self) -> &[String] {
        &self.selected_task_ids
    }

    pub fn set_selected_task_ids(&mut self, ids: Vec<String>) {
        self.selected_task_ids = ids;
    }

    pub fn clear_selections(&mut self) {
        self.selected_task_ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::Duration;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).expect("date")
    }

    #[test]
    fn future_dates_are_rejected() {
        let clock = Arc::new(FixedClock::on_date(date(18)));
        let mut session = SessionState::new(clock);

        session.select(date(10)).expect("past date");
        assert_eq!(session.selected_date(), date(10));

        let err = session.select(date(19)).expect_err("future");
        assert!(matches!(err, Error::InvalidDateSelection(d) if d == date(19)));
        assert_eq!(session.selected_date(), date(10));

        session.select_today();
        assert_eq!(session.selected_date(), date(18));
    }

    #[test]
    fn assess_current_follows_the_clock() {
        let clock = Arc::new(FixedClock::on_date(date(18)));
        let mut session = SessionState::new(clock.clone());
        assert!(!session.assess_current());

        clock.advance(Duration::days(1));
        assert!(session.assess_current());
        assert_eq!(session.current_date(), date(19));
        assert!(!session.assess_current());
    }

    #[test]
    fn working_copy_is_independent() {
        let clock = Arc::new(FixedClock::on_date(date(18)));
        let mut session = SessionState::new(clock);
        let original = TaskRecord {
            id: Some("a".to_string()),
            title: "Original".to_string(),
            ..TaskRecord::default()
        };

        session.edit(original.clone());
        session.selected_task_mut().title = "Changed".to_string();
        assert_eq!(original.title, "Original");

        let taken = session.take_selected_task();
        assert_eq!(taken.title, "Changed");
        assert_eq!(session.selected_task().id, None);
    }

    #[test]
    fn selected_ids_replace_and_clear() {
        let clock = Arc::new(FixedClock::on_date(date(18)));
        let mut session = SessionState::new(clock);
        assert!(session.selected_task_ids().is_empty());

        session.set_selected_task_ids(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(session.selected_task_ids(), ["a", "b"]);

        session.set_selected_task_ids(vec!["c".to_string()]);
        assert_eq!(session.selected_task_ids(), ["c"]);

        session.clear_selections();
        assert!(session.selected_task_ids().is_empty());
    }
}
