//! The shared write pass.
//!
//! Every task-mutating command follows the same shape: enforce the
//! safety gate, select tasks through the filter, confirm, apply the
//! modification set plus a command-specific action, record an undo
//! checkpoint, gc and commit.

use tracing::debug;

use tsk_core::hooks::HookEvent;
use tsk_core::store::UndoEntry;
use tsk_core::{now_epoch, Status, Task};
use tsk_util::{Error, Result};

use crate::confirm::{self, Answer};
use crate::dispatcher::CommandDef;
use crate::engine::Engine;
use crate::modify::{apply_modifications, DescriptionMode};

/// Command-specific mutation applied after the modification set.
pub type Action = dyn Fn(&mut Task) -> Result<()>;

/// No extra mutation (annotate, append, prepend, modify).
pub fn no_action(_task: &mut Task) -> Result<()> {
    Ok(())
}

/// Mark completed, stamping the end time.
pub fn complete(task: &mut Task) -> Result<()> {
    if task.status().is_terminal() {
        return Err(Error::Validation(format!(
            "task {} is already {}",
            task.uuid_str(),
            task.status().as_str()
        )));
    }
    task.set_status(Status::Completed);
    task.set("end", now_epoch().to_string());
    Ok(())
}

/// Mark deleted, stamping the end time. The record is retained.
pub fn delete(task: &mut Task) -> Result<()> {
    if task.status() == Status::Deleted {
        return Err(Error::Validation(format!(
            "task {} is already deleted",
            task.uuid_str()
        )));
    }
    task.set_status(Status::Deleted);
    task.set("end", now_epoch().to_string());
    Ok(())
}

/// Start working: record the start time.
pub fn start(task: &mut Task) -> Result<()> {
    task.set("start", now_epoch().to_string());
    Ok(())
}

/// Stop working: clear the start time.
pub fn stop(task: &mut Task) -> Result<()> {
    task.remove("start");
    Ok(())
}

/// Run one write command over the filtered tasks.
pub fn run(
    engine: &mut Engine,
    def: &CommandDef,
    mode: DescriptionMode,
    action: &Action,
) -> Result<String> {
    let filter = engine.compile_filter()?;

    // Safety gate: a write command with an empty filter touches every
    // task, and proceeds only on explicit confirmation.
    if def.requires_filter && filter.is_empty() {
        let allowed = engine.config.get_bool("confirmation")
            && confirm::confirmed("This command has no filter and affects all tasks. Proceed?");
        if !allowed {
            return Err(Error::Safety(format!(
                "the '{}' command requires a filter",
                def.name
            )));
        }
    }

    let selected = engine.selected_pending(&filter)?;
    if selected.is_empty() {
        return Ok("No matches.".to_string());
    }
    let total = selected.len();

    let mods = engine.modifications();
    // Dependency edits may name completed tasks, both as references
    // and as legs of a cycle; make the whole universe visible.
    if crate::modify::edits_depends(&mods) {
        engine.store.load_completed()?;
    }
    let confirmation = engine.config.get_bool("confirmation");
    let bulk = engine.config.get_int("bulk").unwrap_or(3).max(1) as usize;
    let mut permitted_all = false;
    let mut entries: Vec<UndoEntry> = Vec::new();
    let mut count = 0usize;

    for task in selected {
        if def.needs_confirm && confirmation && !permitted_all {
            let question = format!(
                "{} task {} '{}'?",
                title_case(def.name),
                task.id.unwrap_or(0),
                task.description()
            );
            if total >= bulk {
                match confirm::confirmed4(&question) {
                    Answer::Yes => {}
                    Answer::No => continue,
                    Answer::All => permitted_all = true,
                    Answer::Quit => break,
                }
            } else if !confirm::confirmed(&question) {
                continue;
            }
        }

        let before = task.compose();
        let mut changed = task.clone();

        if let Some(hooked) = engine.hooks.run(HookEvent::PreModify, Some(&changed))? {
            changed = hooked;
        }

        apply_modifications(
            &mut changed,
            &mods,
            mode,
            &engine.eval,
            &engine.config,
            &engine.store,
        )?;
        action(&mut changed)?;
        changed.set("modified", now_epoch().to_string());
        changed.validate()?;

        if let Some(hooked) = engine.hooks.run(HookEvent::PostModify, Some(&changed))? {
            changed = hooked;
        }

        engine.store.update(&changed)?;
        entries.push(UndoEntry {
            old: Some(before),
            new: changed.compose(),
        });
        count += 1;
        debug!(uuid = changed.uuid_str(), command = def.name, "task updated");
    }

    engine.store.snapshot_undo(&entries)?;
    engine.store.gc()?;
    engine.store.commit()?;

    Ok(format!(
        "{} {} task{}.",
        past_tense(def.name),
        count,
        if count == 1 { "" } else { "s" }
    ))
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn past_tense(name: &str) -> &'static str {
    match name {
        "done" => "Completed",
        "delete" => "Deleted",
        "modify" => "Modified",
        "annotate" => "Annotated",
        "append" => "Appended to",
        "prepend" => "Prepended to",
        "start" => "Started",
        "stop" => "Stopped",
        _ => "Changed",
    }
}
