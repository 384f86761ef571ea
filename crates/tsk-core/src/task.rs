//! The in-memory task record.
//!
//! A task is a map from attribute name to string value plus three
//! derived collections: tags, annotations and dependencies. Date-typed
//! attributes store epoch seconds as decimal strings; `recur` stores
//! the raw duration text for recurrence.

use std::collections::HashSet;

use rustc_hash::FxHashMap;
use serde_json::{json, Value as Json};
use uuid::Uuid;

use tsk_util::{Error, Result};

use crate::columns::{self, ColumnType};
use crate::now_epoch;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Completed,
    Deleted,
    Waiting,
    Recurring,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
            Status::Deleted => "deleted",
            Status::Waiting => "waiting",
            Status::Recurring => "recurring",
        }
    }

    pub fn parse(s: &str) -> Result<Status> {
        match s {
            "pending" => Ok(Status::Pending),
            "completed" => Ok(Status::Completed),
            "deleted" => Ok(Status::Deleted),
            "waiting" => Ok(Status::Waiting),
            "recurring" => Ok(Status::Recurring),
            other => Err(Error::Validation(format!("'{}' is not a status", other))),
        }
    }

    /// Completed and deleted tasks leave the pending store on gc.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Deleted)
    }
}

/// A timestamped note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub entry: i64,
    pub description: String,
}

/// One task record.
#[derive(Debug, Clone)]
pub struct Task {
    /// Transient working-set ID, assigned at load, never stored.
    pub id: Option<usize>,
    attrs: FxHashMap<String, String>,
    tags: Vec<String>,
    annotations: Vec<Annotation>,
    depends: HashSet<Uuid>,
}

impl Task {
    /// A fresh pending task with a new UUID and the current entry
    /// timestamp.
    pub fn new(description: impl Into<String>) -> Self {
        let mut attrs = FxHashMap::default();
        attrs.insert("uuid".to_string(), Uuid::new_v4().to_string());
        attrs.insert("entry".to_string(), now_epoch().to_string());
        attrs.insert("status".to_string(), "pending".to_string());
        attrs.insert("description".to_string(), description.into());
        Task {
            id: None,
            attrs,
            tags: Vec::new(),
            annotations: Vec::new(),
            depends: HashSet::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.attrs.insert(name.to_string(), value.into());
    }

    pub fn remove(&mut self, name: &str) {
        self.attrs.remove(name);
    }

    /// A date attribute as epoch seconds.
    pub fn get_date(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    pub fn uuid_str(&self) -> &str {
        self.get("uuid").unwrap_or("")
    }

    pub fn uuid(&self) -> Result<Uuid> {
        Uuid::parse_str(self.uuid_str())
            .map_err(|_| Error::Validation(format!("task has no valid uuid: '{}'", self.uuid_str())))
    }

    pub fn status(&self) -> Status {
        self.get("status")
            .and_then(|s| Status::parse(s).ok())
            .unwrap_or(Status::Pending)
    }

    pub fn set_status(&mut self, status: Status) {
        self.set("status", status.as_str());
    }

    pub fn description(&self) -> &str {
        self.get("description").unwrap_or("")
    }

    // ------------------------------------------------------------------
    // Tags.

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn add_tag(&mut self, tag: &str) {
        if !self.has_tag(tag) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    // ------------------------------------------------------------------
    // Annotations.

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotate(&mut self, description: impl Into<String>) {
        let mut entry = now_epoch();
        // Keep entries strictly increasing so ordering is stable.
        if let Some(last) = self.annotations.last() {
            if entry <= last.entry {
                entry = last.entry + 1;
            }
        }
        self.annotations.push(Annotation {
            entry,
            description: description.into(),
        });
    }

    // ------------------------------------------------------------------
    // Dependencies.

    pub fn depends(&self) -> &HashSet<Uuid> {
        &self.depends
    }

    /// Add a dependency. A task can never depend on itself; cycle
    /// detection over the store happens in the modifier.
    pub fn add_depend(&mut self, dep: Uuid) -> Result<()> {
        if self.uuid().map(|u| u == dep).unwrap_or(false) {
            return Err(Error::Validation(
                "a task cannot depend on itself".to_string(),
            ));
        }
        self.depends.insert(dep);
        Ok(())
    }

    pub fn remove_depend(&mut self, dep: &Uuid) {
        self.depends.remove(dep);
    }

    // ------------------------------------------------------------------
    // DOM.

    /// Resolve a dotted attribute name to its string value.
    ///
    /// Supports the direct attributes, `tags`, `tags.<name>`,
    /// `annotations.count`, `depends` and any stored UDA. Unknown
    /// names resolve to `None`.
    pub fn dom(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.map(|i| i.to_string()).unwrap_or_default()),
            "tags" => Some(self.tags.join(",")),
            "depends" => Some(
                self.depends
                    .iter()
                    .map(|u| u.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            "annotations.count" => Some(self.annotations.len().to_string()),
            _ => {
                if let Some(tag) = name.strip_prefix("tags.") {
                    return Some(if self.has_tag(tag) {
                        tag.to_string()
                    } else {
                        String::new()
                    });
                }
                if let Some(value) = self.attrs.get(name) {
                    return Some(value.clone());
                }
                // Known columns resolve to empty when unset; unknown
                // names do not resolve at all.
                if columns::column(name).is_some() {
                    return Some(String::new());
                }
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Validation.

    /// Check the record invariants.
    pub fn validate(&self) -> Result<()> {
        self.uuid()?;

        if self.get("entry").is_none() {
            return Err(Error::Validation("task has no entry time".to_string()));
        }

        let description = self.description();
        if description.trim().is_empty() {
            return Err(Error::Validation(
                "description cannot be blank".to_string(),
            ));
        }
        if description
            .chars()
            .any(|c| c == '\n' || c == '\r' || c == '\u{000B}' || c == '\u{000C}')
        {
            return Err(Error::Validation(
                "description cannot contain vertical whitespace".to_string(),
            ));
        }

        if let Some(status) = self.get("status") {
            Status::parse(status)?;
        }

        // Date attributes must be numeric epochs and respect ordering.
        for column in columns::COLUMNS {
            if column.col_type == ColumnType::DateTime {
                if let Some(value) = self.get(column.name) {
                    value.parse::<i64>().map_err(|_| {
                        Error::Validation(format!(
                            "'{}' is not a stored date in '{}'",
                            value, column.name
                        ))
                    })?;
                }
            }
        }

        let entry = self.get_date("entry").unwrap_or(0);
        if let Some(start) = self.get_date("start") {
            if start < entry {
                return Err(Error::Validation(
                    "start must not precede entry".to_string(),
                ));
            }
        }
        if let Some(end) = self.get_date("end") {
            if end < entry {
                return Err(Error::Validation("end must not precede entry".to_string()));
            }
        }
        if let (Some(wait), Some(due)) = (self.get_date("wait"), self.get_date("due")) {
            if wait >= due {
                return Err(Error::Validation("wait must precede due".to_string()));
            }
        }

        let recurring = self.status() == Status::Recurring;
        if recurring && (self.get("due").is_none() || self.get("recur").is_none()) {
            return Err(Error::Validation(
                "a recurring task must have both due and recur".to_string(),
            ));
        }
        if self.get("until").is_some() && self.get("recur").is_none() {
            return Err(Error::Validation(
                "only recurring tasks may have an until date".to_string(),
            ));
        }

        if let Ok(uuid) = self.uuid() {
            if self.depends.contains(&uuid) {
                return Err(Error::Validation(
                    "a task cannot depend on itself".to_string(),
                ));
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // JSON.

    /// The JSON object form used by the store and the hook contract.
    pub fn to_json(&self) -> Json {
        let mut object = serde_json::Map::new();
        let mut keys: Vec<&String> = self.attrs.keys().collect();
        keys.sort();
        for key in keys {
            object.insert(key.clone(), json!(self.attrs[key]));
        }
        if !self.tags.is_empty() {
            object.insert("tags".to_string(), json!(self.tags));
        }
        if !self.annotations.is_empty() {
            let annotations: Vec<Json> = self
                .annotations
                .iter()
                .map(|a| json!({"entry": a.entry.to_string(), "description": a.description}))
                .collect();
            object.insert("annotations".to_string(), json!(annotations));
        }
        if !self.depends.is_empty() {
            let mut depends: Vec<String> = self.depends.iter().map(|u| u.to_string()).collect();
            depends.sort();
            object.insert("depends".to_string(), json!(depends));
        }
        Json::Object(object)
    }

    /// Serialized single-line form.
    pub fn compose(&self) -> String {
        self.to_json().to_string()
    }

    /// Parse the JSON object form.
    pub fn from_json(value: &Json) -> Result<Task> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::Parse("a task record must be a JSON object".to_string()))?;

        let mut task = Task {
            id: None,
            attrs: FxHashMap::default(),
            tags: Vec::new(),
            annotations: Vec::new(),
            depends: HashSet::new(),
        };

        for (key, val) in object {
            match key.as_str() {
                "tags" => {
                    let tags = val
                        .as_array()
                        .ok_or_else(|| Error::Parse("tags must be an array".to_string()))?;
                    for tag in tags {
                        if let Some(tag) = tag.as_str() {
                            task.add_tag(tag);
                        }
                    }
                }
                "annotations" => {
                    let notes = val
                        .as_array()
                        .ok_or_else(|| Error::Parse("annotations must be an array".to_string()))?;
                    for note in notes {
                        let entry = note
                            .get("entry")
                            .and_then(|e| e.as_str())
                            .and_then(|e| e.parse().ok())
                            .unwrap_or(0);
                        let description = note
                            .get("description")
                            .and_then(|d| d.as_str())
                            .unwrap_or("")
                            .to_string();
                        task.annotations.push(Annotation { entry, description });
                    }
                }
                "depends" => {
                    let deps = val
                        .as_array()
                        .ok_or_else(|| Error::Parse("depends must be an array".to_string()))?;
                    for dep in deps {
                        if let Some(dep) = dep.as_str() {
                            let dep = Uuid::parse_str(dep).map_err(|_| {
                                Error::Parse(format!("'{}' is not a dependency uuid", dep))
                            })?;
                            task.depends.insert(dep);
                        }
                    }
                }
                _ => {
                    let text = match val {
                        Json::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    task.attrs.insert(key.clone(), text);
                }
            }
        }

        Ok(task)
    }

    /// Parse one stored line.
    pub fn parse_line(line: &str) -> Result<Task> {
        let value: Json = serde_json::from_str(line)
            .map_err(|e| Error::Store(format!("unreadable task record: {}", e)))?;
        Task::from_json(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task() {
        let task = Task::new("Buy milk");
        assert_eq!(task.description(), "Buy milk");
        assert_eq!(task.status(), Status::Pending);
        assert!(task.uuid().is_ok());
        assert!(task.get("entry").is_some());
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_tags_idempotent() {
        let mut task = Task::new("x");
        task.add_tag("home");
        task.add_tag("home");
        assert_eq!(task.tags().len(), 1);
        task.remove_tag("home");
        assert!(task.tags().is_empty());
        task.remove_tag("home");
        assert!(task.tags().is_empty());
    }

    #[test]
    fn test_annotations_strictly_increasing() {
        let mut task = Task::new("x");
        task.annotate("first");
        task.annotate("second");
        let notes = task.annotations();
        assert_eq!(notes.len(), 2);
        assert!(notes[0].entry < notes[1].entry);
    }

    #[test]
    fn test_self_dependency_rejected() {
        let mut task = Task::new("x");
        let own = task.uuid().unwrap();
        assert!(task.add_depend(own).is_err());
        assert!(task.depends().is_empty());
    }

    #[test]
    fn test_validate_blank_description() {
        let mut task = Task::new("x");
        task.set("description", "  ");
        assert!(task.validate().is_err());
        task.set("description", "a\nb");
        assert!(task.validate().is_err());
    }

    #[test]
    fn test_validate_date_ordering() {
        let mut task = Task::new("x");
        let entry: i64 = task.get("entry").unwrap().parse().unwrap();
        task.set("start", (entry - 10).to_string());
        assert!(task.validate().is_err());
        task.set("start", (entry + 10).to_string());
        assert!(task.validate().is_ok());

        task.set("wait", "2000");
        task.set("due", "1000");
        assert!(task.validate().is_err());
        task.set("due", "3000");
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_validate_recurrence() {
        let mut task = Task::new("x");
        task.set_status(Status::Recurring);
        assert!(task.validate().is_err());
        task.set("due", "1000");
        task.set("recur", "weekly");
        assert!(task.validate().is_ok());

        let mut plain = Task::new("y");
        plain.set("until", "2000");
        assert!(plain.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut task = Task::new("Pay bill");
        task.set("project", "Home");
        task.set("due", "1450000000");
        task.add_tag("money");
        task.annotate("remember the stamps");
        let dep = Uuid::new_v4();
        task.add_depend(dep).unwrap();

        let line = task.compose();
        let back = Task::parse_line(&line).unwrap();
        assert_eq!(back.description(), "Pay bill");
        assert_eq!(back.get("project"), Some("Home"));
        assert_eq!(back.get_date("due"), Some(1_450_000_000));
        assert!(back.has_tag("money"));
        assert_eq!(back.annotations().len(), 1);
        assert!(back.depends().contains(&dep));
        assert_eq!(back.uuid_str(), task.uuid_str());
    }

    #[test]
    fn test_dom() {
        let mut task = Task::new("desc");
        task.id = Some(7);
        task.add_tag("home");
        task.set("project", "Home.Garden");
        assert_eq!(task.dom("id").as_deref(), Some("7"));
        assert_eq!(task.dom("project").as_deref(), Some("Home.Garden"));
        assert_eq!(task.dom("tags").as_deref(), Some("home"));
        assert_eq!(task.dom("tags.home").as_deref(), Some("home"));
        assert_eq!(task.dom("tags.work").as_deref(), Some(""));
        assert_eq!(task.dom("annotations.count").as_deref(), Some("0"));
        assert_eq!(task.dom("due").as_deref(), Some(""));
        assert_eq!(task.dom("bogus"), None);
    }
}
