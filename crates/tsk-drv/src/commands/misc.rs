//! version, help and the command-listing helper.

use crate::dispatcher;

/// The version line.
pub fn version() -> String {
    format!("tsk {}", env!("CARGO_PKG_VERSION"))
}

/// Help-equivalent usage text, also shown for an empty command line.
pub fn usage() -> String {
    let mut out = String::new();
    out.push_str("Usage: tsk [rc:<path>] [rc.<name>=<value>] [<filter>] <command> [<modifications>] [-- <words>]\n\n");
    out.push_str("Commands:\n");
    for def in dispatcher::COMMANDS {
        if def.name.starts_with('_') {
            continue;
        }
        let kind = if def.read_only { "read" } else { "write" };
        out.push_str(&format!("  {:<12} {}\n", def.name, kind));
    }
    out.push_str("\nExamples:\n");
    out.push_str("  tsk add Buy milk +groceries due:tomorrow\n");
    out.push_str("  tsk project:Home list\n");
    out.push_str("  tsk 1,3-5 done\n");
    out.trim_end().to_string()
}

/// `_commands`: one command name per line.
pub fn helper_commands() -> String {
    let mut names = dispatcher::command_names();
    names.sort();
    names.join("\n")
}
