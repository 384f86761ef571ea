//! Hook scripts.
//!
//! Named events spawn executables found in `<data>/hooks/` whose file
//! names start with the event name. Task-carrying events write the task
//! as JSON on the hook's stdin and read a (possibly modified) task back
//! from its stdout; a nonzero exit or malformed output fails the
//! command.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use tsk_util::{Error, Result};

use crate::task::Task;

/// Hook events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    OnLaunch,
    OnExit,
    PreAdd,
    PostAdd,
    PreModify,
    PostModify,
}

impl HookEvent {
    /// The filename prefix that selects scripts for this event.
    pub fn prefix(&self) -> &'static str {
        match self {
            HookEvent::OnLaunch => "on-launch",
            HookEvent::OnExit => "on-exit",
            HookEvent::PreAdd => "pre-add",
            HookEvent::PostAdd => "post-add",
            HookEvent::PreModify => "pre-modify",
            HookEvent::PostModify => "post-modify",
        }
    }

    /// Whether scripts for this event receive and return a task.
    pub fn carries_task(&self) -> bool {
        !matches!(self, HookEvent::OnLaunch | HookEvent::OnExit)
    }
}

/// The hook runner.
pub struct Hooks {
    dir: PathBuf,
    enabled: bool,
}

impl Hooks {
    pub fn new(data_dir: &std::path::Path, enabled: bool) -> Self {
        Hooks {
            dir: data_dir.join("hooks"),
            enabled,
        }
    }

    /// The scripts registered for an event, sorted by name.
    fn scripts(&self, event: HookEvent) -> Vec<PathBuf> {
        let mut scripts = Vec::new();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return scripts,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(event.prefix()) {
                continue;
            }
            if is_executable(&path) {
                scripts.push(path);
            }
        }
        scripts.sort();
        scripts
    }

    /// Run the scripts for `event`. For task-carrying events the task
    /// threads through every script in turn and the final form is
    /// returned.
    pub fn run(&self, event: HookEvent, task: Option<&Task>) -> Result<Option<Task>> {
        if !self.enabled {
            return Ok(task.cloned());
        }

        let mut current = task.cloned();

        for script in self.scripts(event) {
            debug!(script = %script.display(), event = event.prefix(), "running hook");

            let mut command = Command::new(&script);
            command.stdout(Stdio::piped()).stderr(Stdio::null());
            if event.carries_task() {
                command.stdin(Stdio::piped());
            } else {
                command.stdin(Stdio::null());
            }

            let mut child = command
                .spawn()
                .map_err(|e| Error::Hook(format!("cannot run '{}': {}", script.display(), e)))?;

            if event.carries_task() {
                if let (Some(stdin), Some(task)) = (child.stdin.as_mut(), current.as_ref()) {
                    stdin
                        .write_all(task.compose().as_bytes())
                        .and_then(|_| stdin.write_all(b"\n"))
                        .map_err(|e| {
                            Error::Hook(format!("cannot feed '{}': {}", script.display(), e))
                        })?;
                }
            }

            let output = child
                .wait_with_output()
                .map_err(|e| Error::Hook(format!("'{}' failed: {}", script.display(), e)))?;

            if !output.status.success() {
                return Err(Error::Hook(format!(
                    "hook '{}' exited with {}",
                    script.display(),
                    output.status.code().unwrap_or(-1)
                )));
            }

            if event.carries_task() && current.is_some() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let line = stdout.lines().find(|l| !l.trim().is_empty()).ok_or_else(|| {
                    Error::Hook(format!(
                        "hook '{}' returned no task",
                        script.display()
                    ))
                })?;
                let task = Task::parse_line(line).map_err(|_| {
                    Error::Hook(format!(
                        "hook '{}' returned a malformed task",
                        script.display()
                    ))
                })?;
                current = Some(task);
            }
        }

        Ok(current)
    }
}

#[cfg(unix)]
fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &std::path::Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn write_script(dir: &std::path::Path, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        let hooks = dir.join("hooks");
        std::fs::create_dir_all(&hooks).unwrap();
        let path = hooks.join(name);
        std::fs::write(&path, body).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }

    #[test]
    fn test_disabled_hooks_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let hooks = Hooks::new(dir.path(), false);
        let task = Task::new("x");
        let out = hooks.run(HookEvent::PreAdd, Some(&task)).unwrap().unwrap();
        assert_eq!(out.description(), "x");
    }

    #[test]
    fn test_no_hooks_directory() {
        let dir = tempfile::tempdir().unwrap();
        let hooks = Hooks::new(dir.path(), true);
        assert!(hooks.run(HookEvent::OnLaunch, None).unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_passthrough_hook() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "pre-add.keep", "#!/bin/sh\ncat\n");
        let hooks = Hooks::new(dir.path(), true);
        let task = Task::new("keep me");
        let out = hooks.run(HookEvent::PreAdd, Some(&task)).unwrap().unwrap();
        assert_eq!(out.description(), "keep me");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_hook_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "pre-add.fail", "#!/bin/sh\ncat > /dev/null\nexit 1\n");
        let hooks = Hooks::new(dir.path(), true);
        let task = Task::new("x");
        let err = hooks.run(HookEvent::PreAdd, Some(&task)).unwrap_err();
        assert!(matches!(err, Error::Hook(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_on_launch_needs_no_task() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "on-launch.ok", "#!/bin/sh\nexit 0\n");
        let hooks = Hooks::new(dir.path(), true);
        assert!(hooks.run(HookEvent::OnLaunch, None).is_ok());
    }
}
