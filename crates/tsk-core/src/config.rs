//! Configuration.
//!
//! A line-oriented `name=value` format with nested `include` files.
//! `TASKRC` overrides the configuration path, `TASKDATA` the data
//! directory, and `rc.<name>=<value>` command-line overrides are
//! applied on top of the file.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::debug;

use tsk_util::{Error, Result};

/// Maximum `include` nesting depth.
const MAX_INCLUDE_DEPTH: usize = 10;

/// The configuration map.
#[derive(Debug, Clone)]
pub struct Config {
    map: IndexMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Config {
            map: IndexMap::new(),
        };
        config.seed_defaults();
        config
    }
}

impl Config {
    /// Built-in defaults, seeded before any file is read.
    fn seed_defaults(&mut self) {
        for (name, value) in [
            ("data.location", "~/.task"),
            ("confirmation", "on"),
            ("bulk", "3"),
            ("search.case.sensitive", "on"),
            ("weekstart", "monday"),
            ("dateformat", "m/d/Y"),
            ("default.command", ""),
            ("hooks", "on"),
            ("undo.style", "side"),
        ] {
            self.map.insert(name.to_string(), value.to_string());
        }
    }

    /// The configuration file path: the command-line `rc:` override,
    /// then `TASKRC`, then `~/.taskrc`.
    pub fn rc_path(cli_override: Option<&str>) -> PathBuf {
        if let Some(path) = cli_override {
            return expand_tilde(path);
        }
        if let Ok(path) = std::env::var("TASKRC") {
            if !path.is_empty() {
                return expand_tilde(&path);
            }
        }
        expand_tilde("~/.taskrc")
    }

    /// Load defaults, then the file at `path` when it exists.
    pub fn load(path: &Path) -> Result<Config> {
        let mut config = Config::default();
        if path.exists() {
            config.load_file(path, 0)?;
        } else {
            debug!(path = %path.display(), "no configuration file; using defaults");
        }
        Ok(config)
    }

    fn load_file(&mut self, path: &Path, depth: usize) -> Result<()> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(Error::Validation(format!(
                "configuration includes nested more than {} deep at '{}'",
                MAX_INCLUDE_DEPTH,
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Validation(format!("cannot read '{}': {}", path.display(), e)))?;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(include) = line.strip_prefix("include ") {
                let include = expand_tilde(include.trim());
                let resolved = if include.is_relative() {
                    path.parent()
                        .map(|p| p.join(&include))
                        .unwrap_or(include)
                } else {
                    include
                };
                self.load_file(&resolved, depth + 1)?;
                continue;
            }

            if let Some(eq) = line.find('=') {
                let name = line[..eq].trim().to_string();
                let value = line[eq + 1..].trim().to_string();
                self.map.insert(name, value);
            }
        }

        Ok(())
    }

    /// Apply one `rc.<name>=<value>` override.
    pub fn set(&mut self, name: &str, value: &str) {
        self.map.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(|s| s.as_str())
    }

    /// Boolean interpretation: on/off, yes/no, true/false, 1/0.
    pub fn get_bool(&self, name: &str) -> bool {
        matches!(
            self.get(name).unwrap_or(""),
            "on" | "yes" | "true" | "1" | "y"
        )
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    /// The data directory: `TASKDATA` overrides `data.location`.
    pub fn data_dir(&self) -> PathBuf {
        if let Ok(dir) = std::env::var("TASKDATA") {
            if !dir.is_empty() {
                return expand_tilde(&dir);
            }
        }
        expand_tilde(self.get("data.location").unwrap_or("~/.task"))
    }

    /// Aliases configured under `alias.<name>=<expansion>`.
    pub fn aliases(&self) -> FxHashMap<String, String> {
        let mut aliases = FxHashMap::default();
        for (name, value) in &self.map {
            if let Some(alias) = name.strip_prefix("alias.") {
                aliases.insert(alias.to_string(), value.clone());
            }
        }
        aliases
    }

    /// UDA names declared under `uda.<name>.type`.
    pub fn uda_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for name in self.map.keys() {
            if let Some(rest) = name.strip_prefix("uda.") {
                if let Some(uda) = rest.strip_suffix(".type") {
                    if !names.iter().any(|n| n == uda) {
                        names.push(uda.to_string());
                    }
                }
            }
        }
        names
    }

    /// Declared type of a UDA: string, numeric, date or duration.
    pub fn uda_type(&self, name: &str) -> String {
        self.get(&format!("uda.{}.type", name))
            .unwrap_or("string")
            .to_string()
    }

    /// The configured first day of the week, 0 = Sunday.
    pub fn weekstart(&self) -> u32 {
        tsk_time::named::day_of_week(self.get("weekstart").unwrap_or("monday")).unwrap_or(1)
    }

    /// The configured default command, if any.
    pub fn default_command(&self) -> Option<String> {
        match self.get("default.command") {
            Some("") | None => None,
            Some(command) => Some(command.to_string()),
        }
    }
}

/// Expand a leading `~` using `HOME`.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    } else if path == "~" {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home);
        }
    }
    PathBuf::from(path)
}
