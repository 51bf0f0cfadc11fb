//! Note commands. Notes are edited on the session's working copy and pushed
//! back with a single update.

use serde::Serialize;

use super::Context;
use crate::error::{Error, Result};
use crate::notes::{add_task_note, update_task_note};
use crate::output::{emit_success, HumanOutput};
use crate::query::resolve_id;

#[derive(Serialize)]
struct NoteOutput {
    id: String,
    index: usize,
    notes: usize,
}

pub fn run_add(ctx: &mut Context, id: &str, markdown: String) -> Result<()> {
    let resolved = select_for_edit(ctx, id)?;

    let clock = ctx.clock.as_ref();
    let draft = ctx.session.selected_task_mut();
    let index = add_task_note(draft, clock);
    update_task_note(draft, index, markdown, clock)?;
    let notes = draft.notes.len();
    ctx.store.update(ctx.session.take_selected_task())?;

    let mut human = HumanOutput::new("Note added");
    human.push_summary("Task", resolved.clone());
    human.push_summary("Index", index.to_string());
    emit_success(
        ctx.output,
        "note add",
        &NoteOutput {
            id: resolved,
            index,
            notes,
        },
        Some(&human),
    )
}

pub fn run_edit(ctx: &mut Context, id: &str, index: usize, markdown: String) -> Result<()> {
    let resolved = select_for_edit(ctx, id)?;

    let clock = ctx.clock.as_ref();
    let draft = ctx.session.selected_task_mut();
    update_task_note(draft, index, markdown, clock)?;
    let notes = draft.notes.len();
    ctx.store.update(ctx.session.take_selected_task())?;

    let mut human = HumanOutput::new("Note updated");
    human.push_summary("Task", resolved.clone());
    human.push_summary("Index", index.to_string());
    emit_success(
        ctx.output,
        "note edit",
        &NoteOutput {
            id: resolved,
            index,
            notes,
        },
        Some(&human),
    )
}

fn select_for_edit(ctx: &mut Context, id: &str) -> Result<String> {
    let resolved = resolve_id(ctx.store.tasks(), id)?;
    let record = ctx
        .store
        .get(&resolved)
        .cloned()
        .ok_or_else(|| Error::TaskNotFound(resolved.clone()))?;
    ctx.session.edit(record);
    Ok(resolved)
}
