//! The add command.

use tsk_core::hooks::HookEvent;
use tsk_core::store::UndoEntry;
use tsk_core::Task;
use tsk_util::{Error, Result};

use crate::engine::Engine;
use crate::modify::{apply_modifications, DescriptionMode};

/// Create one task from the modification set.
pub fn run(engine: &mut Engine) -> Result<String> {
    let mods = engine.modifications();
    engine.store.load_pending()?;
    // Dependency edits may name completed tasks; make the whole
    // universe visible before references resolve.
    if crate::modify::edits_depends(&mods) {
        engine.store.load_completed()?;
    }

    let mut task = Task::new("");
    apply_modifications(
        &mut task,
        &mods,
        DescriptionMode::Replace,
        &engine.eval,
        &engine.config,
        &engine.store,
    )?;

    if task.description().trim().is_empty() {
        return Err(Error::Validation(
            "a task requires a description".to_string(),
        ));
    }
    task.validate()?;

    if let Some(hooked) = engine.hooks.run(HookEvent::PreAdd, Some(&task))? {
        task = hooked;
        task.validate()?;
    }

    let id = engine.store.append(task.clone())?;

    if let Some(hooked) = engine.hooks.run(HookEvent::PostAdd, Some(&task))? {
        task = hooked;
        task.validate()?;
        engine.store.update(&task)?;
    }

    engine.store.snapshot_undo(&[UndoEntry {
        old: None,
        new: task.compose(),
    }])?;
    engine.store.commit()?;

    Ok(format!("Created task {}.", id))
}
