//! The command table.
//!
//! Commands declare whether they read or write, whether they display
//! working-set IDs, whether they confirm before acting, and whether
//! they require a non-empty filter. The safety gate for write commands
//! lives with the table.

/// One command's declared properties.
#[derive(Debug, Clone, Copy)]
pub struct CommandDef {
    pub name: &'static str,
    pub read_only: bool,
    pub displays_id: bool,
    pub needs_confirm: bool,
    /// Write commands that act on existing tasks refuse an empty
    /// filter without explicit confirmation.
    pub requires_filter: bool,
}

const fn cmd(
    name: &'static str,
    read_only: bool,
    displays_id: bool,
    needs_confirm: bool,
    requires_filter: bool,
) -> CommandDef {
    CommandDef {
        name,
        read_only,
        displays_id,
        needs_confirm,
        requires_filter,
    }
}

/// The built-in command table.
pub const COMMANDS: &[CommandDef] = &[
    cmd("add", false, false, false, false),
    cmd("annotate", false, false, false, true),
    cmd("append", false, false, false, true),
    cmd("count", true, false, false, false),
    cmd("delete", false, false, true, true),
    cmd("done", false, false, true, true),
    cmd("export", true, false, false, false),
    cmd("help", true, false, false, false),
    cmd("information", true, true, false, false),
    cmd("list", true, true, false, false),
    cmd("modify", false, false, true, true),
    cmd("prepend", false, false, false, true),
    cmd("projects", true, false, false, false),
    cmd("start", false, false, false, true),
    cmd("stop", false, false, false, true),
    cmd("tags", true, false, false, false),
    cmd("undo", false, false, false, false),
    cmd("version", true, false, false, false),
    cmd("_commands", true, false, false, false),
    cmd("_projects", true, false, false, false),
    cmd("_tags", true, false, false, false),
];

/// Look up a command by canonical name.
pub fn lookup(name: &str) -> Option<&'static CommandDef> {
    COMMANDS.iter().find(|c| c.name == name)
}

/// Canonical command names for entity seeding.
pub fn command_names() -> Vec<&'static str> {
    COMMANDS.iter().map(|c| c.name).collect()
}

/// Names of the write commands.
pub fn write_command_names() -> Vec<&'static str> {
    COMMANDS
        .iter()
        .filter(|c| !c.read_only)
        .map(|c| c.name)
        .collect()
}

/// Names of the helper commands.
pub fn helper_names() -> Vec<&'static str> {
    COMMANDS
        .iter()
        .filter(|c| c.name.starts_with('_'))
        .map(|c| c.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let list = lookup("list").unwrap();
        assert!(list.read_only);
        assert!(list.displays_id);

        let done = lookup("done").unwrap();
        assert!(!done.read_only);
        assert!(done.needs_confirm);
        assert!(done.requires_filter);

        assert!(lookup("bogus").is_none());
    }

    #[test]
    fn test_add_takes_no_filter() {
        let add = lookup("add").unwrap();
        assert!(!add.read_only);
        assert!(!add.requires_filter);
    }

    #[test]
    fn test_helpers_are_read_only() {
        for name in helper_names() {
            assert!(lookup(name).unwrap().read_only);
        }
    }
}
