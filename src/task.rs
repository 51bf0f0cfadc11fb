//! Task records and notes.
//!
//! Records serialize in the camelCase layout of the persisted document:
//!
//! ```text
//! { "tasks": [ { "id", "title", "description", "status", "sticky",
//!                "datesActive", "notes", "createdAt", "updatedAt" } ],
//!   "lastSave": 1760745600 }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, Timestamp};

/// Completion status of a task.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Incomplete,
    Complete,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Incomplete => "incomplete",
            TaskStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle tag of a note. Only `Active` is produced today.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    #[default]
    Active,
    Archived,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskNote {
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub status: NoteStatus,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default = "default_sticky")]
    pub sticky: bool,
    #[serde(default)]
    pub dates_active: Vec<Timestamp>,
    #[serde(default)]
    pub notes: Vec<TaskNote>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

fn default_sticky() -> bool {
    true
}

impl Default for TaskRecord {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            description: String::new(),
            status: TaskStatus::Incomplete,
            sticky: default_sticky(),
            dates_active: Vec::new(),
            notes: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl TaskRecord {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }

    pub fn is_complete(&self) -> bool {
        self.status == TaskStatus::Complete
    }

    pub fn is_active_on(&self, day: Timestamp) -> bool {
        self.dates_active.contains(&day)
    }

    /// Most recent active day, if any.
    pub fn last_active(&self) -> Option<Timestamp> {
        self.dates_active.last().copied()
    }

    /// Appends `day` unless it is already recorded. Returns whether it was added.
    pub fn mark_active(&mut self, day: Timestamp) -> bool {
        if self.is_active_on(day) {
            return false;
        }
        self.dates_active.push(day);
        true
    }
}

/// The full collection as written to and read from the key/value store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub last_save: Timestamp,
}

/// A new, unsaved record: no id, created at the start of today.
pub fn create_task_record(clock: &dyn Clock) -> TaskRecord {
    TaskRecord {
        created_at: Some(clock.today_stamp()),
        ..TaskRecord::default()
    }
}

/// A new, empty, active note created now.
pub fn create_task_note(clock: &dyn Clock) -> TaskNote {
    TaskNote {
        markdown: String::new(),
        status: NoteStatus::Active,
        created_at: clock.timestamp(),
        updated_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;

    fn clock() -> FixedClock {
        FixedClock::on_date(NaiveDate::from_ymd_opt(2026, 10, 18).expect("date"))
    }

    #[test]
    fn factory_defaults() {
        let clock = clock();
        let record = create_task_record(&clock);
        assert_eq!(record.id, None);
        assert_eq!(record.status, TaskStatus::Incomplete);
        assert!(record.sticky);
        assert!(record.dates_active.is_empty());
        assert!(record.notes.is_empty());
        assert_eq!(record.created_at, Some(clock.today_stamp()));
        assert_eq!(record.updated_at, None);

        let note = create_task_note(&clock);
        assert_eq!(note.status, NoteStatus::Active);
        assert!(note.markdown.is_empty());
        assert_eq!(note.created_at, clock.timestamp());
        assert_eq!(note.updated_at, None);
    }

    #[test]
    fn mark_active_skips_duplicates() {
        let mut record = TaskRecord::default();
        assert!(record.mark_active(100));
        assert!(record.mark_active(200));
        assert!(!record.mark_active(100));
        assert_eq!(record.dates_active, vec![100, 200]);
        assert_eq!(record.last_active(), Some(200));
    }

    #[test]
    fn serializes_camel_case_layout() {
        let record = TaskRecord {
            id: Some("abc".to_string()),
            title: "Write report".to_string(),
            dates_active: vec![1_760_745_600],
            created_at: Some(1_760_745_600),
            ..TaskRecord::default()
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["datesActive"], serde_json::json!([1_760_745_600]));
        assert_eq!(value["status"], "incomplete");
        assert_eq!(value["updatedAt"], serde_json::Value::Null);
        assert_eq!(value["sticky"], true);
    }

    #[test]
    fn missing_fields_take_factory_defaults() {
        let record: TaskRecord =
            serde_json::from_str(r#"{"id":"x","title":"Old"}"#).expect("deserialize");
        assert!(record.sticky);
        assert_eq!(record.status, TaskStatus::Incomplete);
        assert!(record.notes.is_empty());
    }
}
