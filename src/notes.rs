//! Note editing on the selected-task working copy.
//!
//! These functions never touch the store. Callers push the edited record
//! back with [`crate::store::TaskStore::update`].

use tracing::{debug, error};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::task::{create_task_note, TaskRecord};

/// Append a fresh, empty note and return its index.
pub fn add_task_note(task: &mut TaskRecord, clock: &dyn Clock) -> usize {
    task.notes.push(create_task_note(clock));
    task.notes.len() - 1
}

/// Replace the markdown of note `note_index`.
///
/// `updatedAt` is stamped when the note had never been stamped, or when its
/// previous markdown was non-empty. A note that was stamped and then emptied
/// does not get a new stamp on its next edit.
pub fn update_task_note(
    task: &mut TaskRecord,
    note_index: usize,
    markdown: impl Into<String>,
    clock: &dyn Clock,
) -> Result<()> {
    let len = task.notes.len();
    let Some(note) = task.notes.get_mut(note_index) else {
        error!(index = note_index, len, "selected task does not possess a note at this offset");
        return Err(Error::NoteNotFound {
            index: note_index,
            len,
        });
    };

    if note.updated_at.is_none() || !note.markdown.is_empty() {
        note.updated_at = Some(clock.timestamp());
    }
    note.markdown = markdown.into();
    debug!(index = note_index, "updated note on selected task");
    Ok(())
}
