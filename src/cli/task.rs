//! Task commands: add, list, show, edit, status changes, touch, delete.

use chrono::NaiveDate;
use serde::Serialize;

use super::Context;
use crate::clock::date_of;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::query::{filter_by_active_dates, resolve_id, sort_tasks};
use crate::task::{create_task_record, TaskRecord};

const SHORT_ID_LEN: usize = 8;

#[derive(Debug)]
pub struct AddOptions {
    pub title: String,
    pub description: String,
    pub sticky: bool,
}

#[derive(Debug)]
pub struct ListOptions {
    pub dates: Vec<NaiveDate>,
    pub all: bool,
}

#[derive(Debug)]
pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub sticky: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
pub enum StatusChange {
    Complete,
    Incomplete,
}

#[derive(Serialize)]
struct TaskAddedOutput {
    id: String,
}

#[derive(Serialize)]
struct TaskListOutput {
    dates: Vec<NaiveDate>,
    total: usize,
    tasks: Vec<TaskRecord>,
}

#[derive(Serialize)]
struct TaskChangedOutput {
    ids: Vec<String>,
    changed: usize,
}

pub fn run_add(ctx: &mut Context, options: AddOptions) -> Result<()> {
    let title = options.title.trim();
    if title.is_empty() {
        return Err(Error::InvalidArgument("title cannot be empty".to_string()));
    }

    let record = TaskRecord {
        title: title.to_string(),
        description: options.description,
        sticky: options.sticky,
        ..create_task_record(ctx.clock.as_ref())
    };
    let id = ctx.store.add(record)?;

    let mut human = HumanOutput::new("Task added");
    human.push_summary("ID", id.clone());
    human.push_summary("Title", title);
    if !options.sticky {
        human.push_summary("Sticky", "no");
    }

    emit_success(ctx.output, "add", &TaskAddedOutput { id }, Some(&human))
}

pub fn run_list(ctx: &mut Context, options: ListOptions) -> Result<()> {
    let dates = if options.all {
        Vec::new()
    } else if options.dates.is_empty() {
        vec![ctx.session.selected_date()]
    } else {
        for date in &options.dates {
            ctx.session.select(*date)?;
        }
        options.dates
    };

    let mut tasks: Vec<TaskRecord> = if options.all {
        ctx.store.tasks().to_vec()
    } else {
        filter_by_active_dates(ctx.store.tasks(), dates.iter().copied())
            .into_iter()
            .cloned()
            .collect()
    };
    sort_tasks(&mut tasks);

    let header = if options.all {
        "All tasks".to_string()
    } else {
        let days: Vec<String> = dates.iter().map(NaiveDate::to_string).collect();
        format!("Tasks for {}", days.join(", "))
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("Total", tasks.len().to_string());
    for task in &tasks {
        human.push_detail(list_line(task));
    }

    let output = TaskListOutput {
        dates,
        total: tasks.len(),
        tasks,
    };
    emit_success(ctx.output, "list", &output, Some(&human))
}

pub fn run_show(ctx: &mut Context, id: &str) -> Result<()> {
    let resolved = resolve_id(ctx.store.tasks(), id)?;
    let task = ctx
        .store
        .get(&resolved)
        .ok_or_else(|| Error::TaskNotFound(resolved.clone()))?;

    let mut human = HumanOutput::new(format!("Task {resolved}"));
    human.push_summary("Title", task.title.clone());
    if !task.description.is_empty() {
        human.push_summary("Description", task.description.clone());
    }
    human.push_summary("Status", task.status.to_string());
    human.push_summary("Sticky", if task.sticky { "yes" } else { "no" });
    let days: Vec<String> = task
        .dates_active
        .iter()
        .filter_map(|stamp| date_of(*stamp))
        .map(|date| date.to_string())
        .collect();
    human.push_summary("Active", days.join(", "));
    for (index, note) in task.notes.iter().enumerate() {
        human.push_detail(format!("#{index} {}", note.markdown));
    }

    emit_success(ctx.output, "show", task, Some(&human))
}

pub fn run_edit(ctx: &mut Context, options: EditOptions) -> Result<()> {
    let resolved = resolve_id(ctx.store.tasks(), &options.id)?;
    let record = ctx
        .store
        .get(&resolved)
        .cloned()
        .ok_or_else(|| Error::TaskNotFound(resolved.clone()))?;

    ctx.session.edit(record);
    let draft = ctx.session.selected_task_mut();
    if let Some(title) = options.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidArgument("title cannot be empty".to_string()));
        }
        draft.title = title.to_string();
    }
    if let Some(description) = options.description {
        draft.description = description;
    }
    if let Some(sticky) = options.sticky {
        draft.sticky = sticky;
    }
    ctx.store.update(ctx.session.take_selected_task())?;

    let mut human = HumanOutput::new("Task updated");
    human.push_summary("ID", resolved.clone());
    emit_success(
        ctx.output,
        "edit",
        &TaskChangedOutput {
            ids: vec![resolved],
            changed: 1,
        },
        Some(&human),
    )
}

pub fn run_status(ctx: &mut Context, ids: &[String], change: StatusChange) -> Result<()> {
    select_ids(ctx, ids)?;
    let selected = ctx.session.selected_task_ids();
    let (changed, command, header, already) = match change {
        StatusChange::Complete => (
            ctx.store.complete_all_of(selected),
            "complete",
            "Tasks completed",
            "already complete",
        ),
        StatusChange::Incomplete => (
            ctx.store.incomplete_all_of(selected),
            "incomplete",
            "Tasks reopened",
            "already incomplete",
        ),
    };
    let unchanged = selected.len().saturating_sub(changed);
    let mut human = changed_output(header, selected, changed);
    if unchanged > 0 {
        human.push_warning(format!("{unchanged} task(s) {already}"));
    }
    finish_selection(ctx, command, human, changed)
}

pub fn run_touch(ctx: &mut Context, ids: &[String], reactivate: bool) -> Result<()> {
    select_ids(ctx, ids)?;
    let selected = ctx.session.selected_task_ids();
    let touched = ctx.store.touch_all_of(selected, reactivate);
    let human = changed_output("Tasks touched", selected, touched);
    finish_selection(ctx, "touch", human, touched)
}

pub fn run_delete(ctx: &mut Context, ids: &[String]) -> Result<()> {
    select_ids(ctx, ids)?;
    let selected = ctx.session.selected_task_ids();
    let count = if ctx.store.remove_all_of(selected) {
        selected.len()
    } else {
        0
    };
    let human = changed_output("Tasks deleted", selected, count);
    finish_selection(ctx, "delete", human, count)
}

/// Resolve `ids` and make them the session's selection.
fn select_ids(ctx: &mut Context, ids: &[String]) -> Result<()> {
    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        let id = resolve_id(ctx.store.tasks(), id)?;
        if !resolved.contains(&id) {
            resolved.push(id);
        }
    }
    ctx.session.set_selected_task_ids(resolved);
    Ok(())
}

fn changed_output(header: &str, ids: &[String], changed: usize) -> HumanOutput {
    let mut human = HumanOutput::new(header);
    human.push_summary("Changed", changed.to_string());
    for id in ids {
        human.push_detail(id.clone());
    }
    human
}

fn finish_selection(
    ctx: &mut Context,
    command: &str,
    human: HumanOutput,
    changed: usize,
) -> Result<()> {
    let ids = ctx.session.selected_task_ids().to_vec();
    ctx.session.clear_selections();
    emit_success(
        ctx.output,
        command,
        &TaskChangedOutput { ids, changed },
        Some(&human),
    )
}

pub(crate) fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn list_line(task: &TaskRecord) -> String {
    let mark = if task.is_complete() { "x" } else { " " };
    let id = task.id().map(short_id).unwrap_or("-");
    let mut line = format!("[{mark}] {id}  {}", task.title);
    if !task.notes.is_empty() {
        line.push_str(&format!(" ({} notes)", task.notes.len()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;

    #[test]
    fn short_id_truncates_long_ids() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn list_line_marks_completion() {
        let mut task = TaskRecord {
            id: Some("0123456789".to_string()),
            title: "Write report".to_string(),
            ..TaskRecord::default()
        };
        assert_eq!(list_line(&task), "[ ] 01234567  Write report");

        task.status = TaskStatus::Complete;
        assert_eq!(list_line(&task), "[x] 01234567  Write report");
    }
}
