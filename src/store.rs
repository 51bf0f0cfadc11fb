//! The task-record store.
//!
//! `TaskStore` owns the collection for the life of the process. Every
//! mutation runs synchronously against the in-memory records; when it
//! changed something the store stamps `lastSave`, hands a full snapshot to
//! the key/value adapter on a detached task and then notifies subscribers
//! before returning. Saves are never awaited by mutations and may finish out
//! of order; the adapter decides how concurrent writes land (last write
//! wins). Call [`TaskStore::settle`] before shutdown to wait for them.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, Timestamp};
use crate::error::{Error, Result};
use crate::observe::{Subscribers, Subscription};
use crate::storage::{validate_key, KeyValueStore};
use crate::task::{TaskRecord, TaskSnapshot, TaskStatus};

/// Default key the snapshot is stored under.
pub const DEFAULT_RECORDS_KEY: &str = "records";

/// A record or a bare id, for operations that accept either.
#[derive(Debug, Clone, Copy)]
pub enum TaskRef<'a> {
    Id(&'a str),
    Record(&'a TaskRecord),
}

impl<'a> TaskRef<'a> {
    pub fn id(&self) -> Option<&'a str> {
        match self {
            TaskRef::Id(id) => Some(id),
            TaskRef::Record(record) => record.id(),
        }
    }
}

impl<'a> From<&'a str> for TaskRef<'a> {
    fn from(id: &'a str) -> Self {
        TaskRef::Id(id)
    }
}

impl<'a> From<&'a String> for TaskRef<'a> {
    fn from(id: &'a String) -> Self {
        TaskRef::Id(id.as_str())
    }
}

impl<'a> From<&'a TaskRecord> for TaskRef<'a> {
    fn from(record: &'a TaskRecord) -> Self {
        TaskRef::Record(record)
    }
}

/// Where and how snapshots are written.
#[derive(Clone)]
pub struct Persistence {
    adapter: Arc<dyn KeyValueStore>,
    key: String,
    runtime: Handle,
}

impl fmt::Debug for Persistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persistence")
            .field("adapter", &self.adapter)
            .field("key", &self.key)
            .finish()
    }
}

impl Persistence {
    /// Bind `adapter` and `key` to the tokio runtime of the calling context.
    pub fn new(adapter: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|err| Error::Persistence(format!("no async runtime available: {err}")))?;
        Self::with_runtime(adapter, key, runtime)
    }

    pub fn with_runtime(
        adapter: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        runtime: Handle,
    ) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self {
            adapter,
            key,
            runtime,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the persisted snapshot, if one exists.
    pub async fn load(&self) -> Result<Option<TaskSnapshot>> {
        match self.adapter.get_item(&self.key).await? {
            Some(document) => Ok(Some(serde_json::from_value(document)?)),
            None => Ok(None),
        }
    }

    fn spawn_save(&self, document: Value, tasks: usize) -> JoinHandle<()> {
        let adapter = Arc::clone(&self.adapter);
        let key = self.key.clone();
        self.runtime.spawn(async move {
            match adapter.set_item(&key, document).await {
                Ok(()) => debug!(key = %key, tasks, "save of records completed"),
                Err(err) => error!(key = %key, error = %err, "failed to write records to storage"),
            }
        })
    }
}

pub struct TaskStore {
    snapshot: TaskSnapshot,
    persistence: Persistence,
    clock: Arc<dyn Clock>,
    subscribers: Subscribers<TaskSnapshot>,
    in_flight: Vec<JoinHandle<()>>,
}

impl fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStore")
            .field("tasks", &self.snapshot.tasks.len())
            .field("last_save", &self.snapshot.last_save)
            .field("persistence", &self.persistence)
            .field("subscribers", &self.subscribers)
            .finish()
    }
}

impl TaskStore {
    /// An empty store; `lastSave` starts at now.
    pub fn new(persistence: Persistence, clock: Arc<dyn Clock>) -> Self {
        let snapshot = TaskSnapshot {
            tasks: Vec::new(),
            last_save: clock.timestamp(),
        };
        Self {
            snapshot,
            persistence,
            clock,
            subscribers: Subscribers::new(),
            in_flight: Vec::new(),
        }
    }

    /// Startup load: an absent document yields an empty store, a present one
    /// is bulk-assigned. A document that does not parse is returned as an
    /// error rather than silently discarded.
    pub async fn load(persistence: Persistence, clock: Arc<dyn Clock>) -> Result<Self> {
        let loaded = persistence.load().await?;
        let mut store = Self::new(persistence, clock);
        match loaded {
            Some(snapshot) => store.bulk_assign(snapshot),
            None => info!(key = store.persistence.key(), "no saved records; starting empty"),
        }
        Ok(store)
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.snapshot.tasks
    }

    pub fn get(&self, id: &str) -> Option<&TaskRecord> {
        self.snapshot.tasks.iter().find(|record| record.has_id(id))
    }

    pub fn snapshot(&self) -> &TaskSnapshot {
        &self.snapshot
    }

    pub fn last_save(&self) -> Timestamp {
        self.snapshot.last_save
    }

    pub fn len(&self) -> usize {
        self.snapshot.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.tasks.is_empty()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Listen for committed changes. The listener receives the whole
    /// collection after each one.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription<TaskSnapshot>
    where
        F: Fn(&TaskSnapshot) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(listener)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert `record`, filling in the id, first active day and creation
    /// time when they are missing. Returns the id.
    pub fn add(&mut self, mut record: TaskRecord) -> Result<String> {
        let id = match record.id.take().filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                debug!(id = %id, "task had no id; assigned one");
                id
            }
        };
        if self.get(&id).is_some() {
            warn!(id = %id, "refusing to add a second task with an existing id");
            return Err(Error::InvalidArgument(format!("task id already exists: {id}")));
        }
        record.id = Some(id.clone());

        if record.dates_active.is_empty() {
            record.dates_active.push(self.clock.today_stamp());
        }
        if record.created_at.is_none() {
            record.created_at = Some(self.clock.timestamp());
        }

        info!(id = %id, "adding task record");
        self.snapshot.tasks.push(record);
        self.save();
        Ok(id)
    }

    /// Replace the stored record carrying `record.id`, stamping `updatedAt`.
    pub fn update(&mut self, mut record: TaskRecord) -> Result<()> {
        let Some(id) = record.id.clone() else {
            error!("task passed for update did not possess an id");
            return Err(Error::MissingId);
        };
        let Some(position) = self
            .snapshot
            .tasks
            .iter()
            .position(|entry| entry.has_id(&id))
        else {
            error!(id = %id, "unable to locate task record for update");
            return Err(Error::TaskNotFound(id));
        };

        record.updated_at = Some(self.clock.timestamp());
        info!(id = %id, "updating task record");
        self.snapshot.tasks[position] = record;
        self.save();
        Ok(())
    }

    /// Remove one record. Returns whether anything was removed.
    pub fn remove<'a>(&mut self, target: impl Into<TaskRef<'a>>) -> Result<bool> {
        let Some(id) = target.into().id() else {
            error!("request made to remove a record that did not have an id");
            return Err(Error::MissingId);
        };
        debug!(id = %id, "removing task record");
        Ok(self.remove_unmatched(|record| !record.has_id(id)))
    }

    /// Remove every record whose id is listed. Returns whether anything was
    /// removed.
    pub fn remove_all_of<S: AsRef<str>>(&mut self, ids: &[S]) -> bool {
        let ids = id_set(ids);
        debug!(count = ids.len(), "removing task records");
        self.remove_unmatched(|record| !record.id().is_some_and(|id| ids.contains(id)))
    }

    /// Keep only the records for which `keep` returns true; save if the
    /// collection shrank.
    pub fn remove_unmatched<P>(&mut self, mut keep: P) -> bool
    where
        P: FnMut(&TaskRecord) -> bool,
    {
        let before = self.snapshot.tasks.len();
        self.snapshot.tasks.retain(|record| keep(record));
        let changed = before != self.snapshot.tasks.len();
        if changed {
            info!(removed = before - self.snapshot.tasks.len(), "removed task records");
            self.save();
        }
        changed
    }

    pub fn complete<'a>(&mut self, target: impl Into<TaskRef<'a>>) -> Result<usize> {
        let Some(id) = target.into().id() else {
            error!("request made to complete a record that did not have an id");
            return Err(Error::MissingId);
        };
        Ok(self.complete_all_of(&[id]))
    }

    pub fn incomplete<'a>(&mut self, target: impl Into<TaskRef<'a>>) -> Result<usize> {
        let Some(id) = target.into().id() else {
            error!("request made to reopen a record that did not have an id");
            return Err(Error::MissingId);
        };
        Ok(self.incomplete_all_of(&[id]))
    }

    /// Mark the listed records complete. Returns how many changed.
    pub fn complete_all_of<S: AsRef<str>>(&mut self, ids: &[S]) -> usize {
        self.update_status_for_all(ids, TaskStatus::Complete, false)
    }

    /// Mark the listed records incomplete and active today. Returns how many
    /// changed.
    pub fn incomplete_all_of<S: AsRef<str>>(&mut self, ids: &[S]) -> usize {
        self.update_status_for_all(ids, TaskStatus::Incomplete, true)
    }

    fn update_status_for_all<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        status: TaskStatus,
        touch: bool,
    ) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let ids = id_set(ids);
        let now = self.clock.timestamp();
        let today = self.clock.today_stamp();

        let mut changed = 0;
        for record in &mut self.snapshot.tasks {
            let listed = record.id().is_some_and(|id| ids.contains(id));
            if !listed || record.status == status {
                continue;
            }
            debug!(id = ?record.id, status = %status, "changing task status");
            record.status = status;
            record.updated_at = Some(now);
            if touch {
                record.mark_active(today);
            }
            changed += 1;
        }

        if changed > 0 {
            info!(changed, status = %status, "updated task statuses");
            self.save();
        }
        changed
    }

    /// Make the listed records active today. Returns how many were touched.
    pub fn touch_all_of<S: AsRef<str>>(&mut self, ids: &[S], reactivate: bool) -> usize {
        let ids = id_set(ids);
        self.touch_matching(
            |record| record.id().is_some_and(|id| ids.contains(id)),
            reactivate,
        )
    }

    /// Make every record matching `predicate` active today, optionally
    /// forcing it back to incomplete. Every match counts as touched, even
    /// when today was already recorded.
    pub fn touch_matching<P>(&mut self, mut predicate: P, reactivate: bool) -> usize
    where
        P: FnMut(&TaskRecord) -> bool,
    {
        let now = self.clock.timestamp();
        let today = self.clock.today_stamp();

        let mut touched = 0;
        for record in self.snapshot.tasks.iter_mut() {
            if !predicate(record) {
                continue;
            }
            record.mark_active(today);
            if reactivate && record.status != TaskStatus::Incomplete {
                record.status = TaskStatus::Incomplete;
            }
            record.updated_at = Some(now);
            touched += 1;
        }

        if touched > 0 {
            info!(touched, reactivate, "touched task records");
            self.save();
        }
        touched
    }

    /// Roll sticky, unfinished tasks onto today.
    pub fn touch_sticky_tasks(&mut self) -> usize {
        debug!("touching sticky incomplete tasks for current date");
        self.touch_matching(|record| record.sticky && !record.is_complete(), false)
    }

    /// Replace the whole collection with a previously persisted snapshot.
    /// Does not save.
    pub fn bulk_assign(&mut self, content: TaskSnapshot) {
        info!(tasks = content.tasks.len(), "bulk assigning task records");
        self.snapshot = content;
        self.subscribers.publish(&self.snapshot);
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Stamp `lastSave`, start writing the snapshot and notify subscribers.
    /// The write is not awaited; failures only reach the log.
    pub fn save(&mut self) {
        self.snapshot.last_save = self.clock.timestamp();
        match serde_json::to_value(&self.snapshot) {
            Ok(document) => {
                let handle = self
                    .persistence
                    .spawn_save(document, self.snapshot.tasks.len());
                self.in_flight.retain(|pending| !pending.is_finished());
                self.in_flight.push(handle);
            }
            Err(err) => error!(error = %err, "failed to serialize records for saving"),
        }
        self.subscribers.publish(&self.snapshot);
    }

    /// Number of saves started and not yet finished.
    pub fn pending_saves(&self) -> usize {
        self.in_flight
            .iter()
            .filter(|pending| !pending.is_finished())
            .count()
    }

    /// Wait for every save started so far.
    pub async fn settle(&mut self) {
        for pending in self.in_flight.drain(..) {
            if let Err(err) = pending.await {
                error!(error = %err, "save task did not complete");
            }
        }
    }
}

fn id_set<S: AsRef<str>>(ids: &[S]) -> HashSet<&str> {
    ids.iter().map(|id| id.as_ref()).collect()
}
