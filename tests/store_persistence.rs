use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use daybook::clock::{day_stamp, Clock, FixedClock};
use daybook::error::Error;
use daybook::storage::FileStore;
use daybook::store::{Persistence, TaskStore, DEFAULT_RECORDS_KEY};
use daybook::task::{create_task_record, TaskRecord, TaskStatus};
use tempfile::TempDir;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).expect("date")
}

fn persistence(dir: &TempDir) -> Persistence {
    Persistence::new(Arc::new(FileStore::new(dir.path())), DEFAULT_RECORDS_KEY)
        .expect("persistence")
}

fn titled(clock: &FixedClock, title: &str) -> TaskRecord {
    TaskRecord {
        title: title.to_string(),
        ..create_task_record(clock)
    }
}

#[tokio::test]
async fn records_survive_a_reload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(FixedClock::on_date(day(18)));

    let mut store = TaskStore::load(persistence(&dir), clock.clone())
        .await
        .expect("load empty");
    assert!(store.is_empty());
    let id = store.add(titled(&clock, "Persist me")).expect("add");
    store.settle().await;
    store.complete(&id).expect("complete");
    store.settle().await;
    let saved_at = store.last_save();

    let reloaded = TaskStore::load(persistence(&dir), clock.clone())
        .await
        .expect("reload");
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.last_save(), saved_at);
    let task = reloaded.get(&id).expect("task");
    assert_eq!(task.title, "Persist me");
    assert_eq!(task.status, TaskStatus::Complete);
    assert_eq!(task.dates_active, vec![day_stamp(day(18))]);
}

#[tokio::test]
async fn persisted_document_uses_camel_case() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(FixedClock::on_date(day(18)));
    let mut store = TaskStore::load(persistence(&dir), clock.clone())
        .await
        .expect("load");
    store.add(titled(&clock, "Shape")).expect("add");
    store.settle().await;

    let raw = std::fs::read_to_string(dir.path().join("records.json")).expect("read");
    let doc: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert!(doc["lastSave"].is_number());
    let task = &doc["tasks"][0];
    assert!(task["datesActive"].is_array());
    assert!(task["createdAt"].is_number());
    assert_eq!(task["status"], "incomplete");
}

#[tokio::test]
async fn sticky_tasks_roll_onto_the_next_day() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(FixedClock::on_date(day(18)));
    let mut store = TaskStore::load(persistence(&dir), clock.clone())
        .await
        .expect("load");
    let sticky = store.add(titled(&clock, "Sticky")).expect("add");
    store.settle().await;
    let loose = store
        .add(TaskRecord {
            sticky: false,
            ..titled(&clock, "Loose")
        })
        .expect("add");
    store.settle().await;
    let done = store.add(titled(&clock, "Done")).expect("add");
    store.settle().await;
    store.complete(&done).expect("complete");
    store.settle().await;

    clock.advance(Duration::days(1));
    let mut store = TaskStore::load(persistence(&dir), clock.clone())
        .await
        .expect("reload");
    assert_eq!(store.touch_sticky_tasks(), 1);
    store.settle().await;

    let today = clock.today_stamp();
    assert!(store.get(&sticky).expect("sticky").is_active_on(today));
    assert!(!store.get(&loose).expect("loose").is_active_on(today));
    assert!(!store.get(&done).expect("done").is_active_on(today));
}

#[tokio::test]
async fn subscribers_see_each_committed_change() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(FixedClock::on_date(day(18)));
    let mut store = TaskStore::load(persistence(&dir), clock.clone())
        .await
        .expect("load");

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let subscription = store.subscribe(move |snapshot| {
        counter.store(snapshot.tasks.len(), Ordering::SeqCst);
    });

    store.add(titled(&clock, "One")).expect("add");
    store.add(titled(&clock, "Two")).expect("add");
    assert_eq!(seen.load(Ordering::SeqCst), 2);

    drop(subscription);
    store.add(titled(&clock, "Three")).expect("add");
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    store.settle().await;
}

#[tokio::test]
async fn malformed_document_fails_to_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("records.json"), "{\"tasks\": 7}").expect("write");
    let clock = Arc::new(FixedClock::on_date(day(18)));

    let err = TaskStore::load(persistence(&dir), clock)
        .await
        .expect_err("malformed");
    assert!(matches!(err, Error::Json(_)));
}

#[tokio::test]
async fn settled_saves_accumulate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(FixedClock::on_date(day(18)));
    let mut store = TaskStore::load(persistence(&dir), clock.clone())
        .await
        .expect("load");

    for n in 0..5 {
        store.add(titled(&clock, &format!("Task {n}"))).expect("add");
        store.settle().await;
    }
    assert_eq!(store.pending_saves(), 0);

    let reloaded = TaskStore::load(persistence(&dir), clock)
        .await
        .expect("reload");
    assert_eq!(reloaded.len(), 5);
}
