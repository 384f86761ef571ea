//! Command implementations.

pub mod add;
pub mod misc;
pub mod report;
pub mod undo;
pub mod write;

use tsk_util::Result;

use crate::dispatcher::CommandDef;
use crate::engine::Engine;
use crate::modify::DescriptionMode;

/// Dispatch one looked-up command.
pub fn execute(engine: &mut Engine, def: &CommandDef) -> Result<String> {
    match def.name {
        "add" => add::run(engine),
        "annotate" => write::run(engine, def, DescriptionMode::Annotate, &write::no_action),
        "append" => write::run(engine, def, DescriptionMode::Append, &write::no_action),
        "prepend" => write::run(engine, def, DescriptionMode::Prepend, &write::no_action),
        "modify" => write::run(engine, def, DescriptionMode::Replace, &write::no_action),
        "done" => write::run(engine, def, DescriptionMode::Annotate, &write::complete),
        "delete" => write::run(engine, def, DescriptionMode::Annotate, &write::delete),
        "start" => write::run(engine, def, DescriptionMode::Annotate, &write::start),
        "stop" => write::run(engine, def, DescriptionMode::Annotate, &write::stop),
        "list" => report::list(engine),
        "information" => report::information(engine),
        "count" => report::count(engine),
        "export" => report::export(engine),
        "tags" => report::tags(engine),
        "projects" => report::projects(engine),
        "undo" => undo::run(engine),
        "version" => Ok(misc::version()),
        "help" => Ok(misc::usage()),
        "_commands" => Ok(misc::helper_commands()),
        "_tags" => report::helper_tags(engine),
        "_projects" => report::helper_projects(engine),
        other => Err(tsk_util::Error::Unknown(format!(
            "'{}' is not implemented",
            other
        ))),
    }
}
