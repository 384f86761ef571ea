//! The undo command.
//!
//! Reverts the most recent checkpoint: creations are removed, every
//! other mutation is restored to its pre-image.

use tsk_core::Task;
use tsk_util::Result;

use crate::engine::Engine;

pub fn run(engine: &mut Engine) -> Result<String> {
    let entries = match engine.store.pop_undo()? {
        Some(entries) => entries,
        None => return Ok("No changes to undo.".to_string()),
    };

    engine.store.load_pending()?;
    engine.store.load_completed()?;

    let mut reverted = 0usize;
    for entry in entries.iter().rev() {
        let new_task = Task::parse_line(&entry.new)?;
        let uuid = new_task.uuid_str().to_string();

        match &entry.old {
            None => {
                // A creation: the task disappears again.
                engine.store.remove(&uuid);
            }
            Some(old) => {
                let old_task = Task::parse_line(old)?;
                engine.store.remove(&uuid);
                engine.store.insert(old_task);
            }
        }
        reverted += 1;
    }

    engine.store.gc()?;
    engine.store.commit()?;

    Ok(format!(
        "Undo complete: {} task{} reverted.",
        reverted,
        if reverted == 1 { "" } else { "s" }
    ))
}
