//! Modification application.
//!
//! Walks the decomposed MODIFICATION nodes in order and applies each to
//! a task: attribute sets and clears, attribute-modifier writes, tag
//! edits, description substitutions, and the pending description
//! buffer whose disposition depends on the running command.

use tsk_cli::arg::{Arg, ArgTag};
use tsk_core::columns::{self, ColumnType};
use tsk_core::{now_epoch, Config, Status, Store, Task};
use tsk_expr::value::Data;
use tsk_expr::Eval;
use tsk_time::{CalDate, Span};
use tsk_util::{Error, Result};
use uuid::Uuid;

/// Values whose magnitude is under this many seconds are relative
/// durations, not epochs. Five years.
const EPOCH_CUTOVER: i64 = 157_680_000;

/// What happens to accumulated bare words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionMode {
    /// Replace the description (add, modify).
    Replace,
    /// Append with a separating space.
    Append,
    /// Prepend with a separating space.
    Prepend,
    /// Record an annotation.
    Annotate,
}

/// True when the modification set edits the dependency set.
///
/// Dependency references resolve against the full task universe, so
/// callers must load the completed store before applying such a set.
pub fn edits_depends(mods: &[Arg]) -> bool {
    mods.iter().any(|m| m.attrs.name.as_deref() == Some("depends"))
}

/// Apply the modification set to one task.
pub fn apply_modifications(
    task: &mut Task,
    mods: &[Arg],
    mode: DescriptionMode,
    eval: &Eval,
    config: &Config,
    store: &Store,
) -> Result<()> {
    let mut words: Vec<String> = Vec::new();

    for arg in mods {
        if arg.has_tag(ArgTag::Substitution) {
            let from = arg.attrs.from.as_deref().unwrap_or("");
            let to = arg.attrs.to.as_deref().unwrap_or("");
            let global = arg.attrs.global.unwrap_or(false);
            apply_substitution(task, from, to, global);
        } else if arg.has_tag(ArgTag::Tag) {
            let name = arg.attrs.name.as_deref().unwrap_or("");
            match arg.attrs.sign.as_deref() {
                Some("+") => task.add_tag(name),
                _ => task.remove_tag(name),
            }
        } else if let (true, Some(name)) = (
            arg.has_tag(ArgTag::Attribute)
                || arg.has_tag(ArgTag::Uda)
                || arg.has_tag(ArgTag::AttMod),
            arg.attrs.name.as_deref(),
        ) {
            let value = arg.attrs.value.as_deref().unwrap_or("");
            if !arg.has_tag(ArgTag::Modifiable) {
                return Err(Error::Validation(format!(
                    "'{}' is not a modifiable attribute",
                    name
                )));
            }
            apply_attribute(task, name, value, eval, config, store)?;
        } else {
            words.push(arg.raw.clone());
        }
    }

    if !words.is_empty() {
        let text = words.join(" ");
        match mode {
            DescriptionMode::Replace => task.set("description", text),
            DescriptionMode::Append => {
                let combined = format!("{} {}", task.description(), text);
                task.set("description", combined.trim().to_string());
            }
            DescriptionMode::Prepend => {
                let combined = format!("{} {}", text, task.description());
                task.set("description", combined.trim().to_string());
            }
            DescriptionMode::Annotate => task.annotate(text),
        }
    }

    // Recurrence needs an anchor.
    if task.get("recur").is_some() && task.get("due").is_none() {
        return Err(Error::Validation(
            "a recurring task must also have a due date".to_string(),
        ));
    }

    Ok(())
}

/// Replace `from` with `to` in the description, once or globally.
fn apply_substitution(task: &mut Task, from: &str, to: &str, global: bool) {
    let description = task.description().to_string();
    let replaced = if global {
        description.replace(from, to)
    } else {
        description.replacen(from, to, 1)
    };
    task.set("description", replaced);
}

/// Set or clear one named attribute, honoring its column type.
fn apply_attribute(
    task: &mut Task,
    name: &str,
    value: &str,
    eval: &Eval,
    config: &Config,
    store: &Store,
) -> Result<()> {
    // Clearing.
    if value.is_empty() {
        match name {
            "tags" => {
                for tag in task.tags().to_vec() {
                    task.remove_tag(&tag);
                }
            }
            "depends" => {
                for dep in task.depends().clone() {
                    task.remove_depend(&dep);
                }
            }
            _ => task.remove(name),
        }
        return Ok(());
    }

    let col_type = columns::column(name)
        .map(|c| c.col_type)
        .unwrap_or_else(|| uda_column_type(config, name));

    match name {
        "priority" => {
            let upper = value.to_uppercase();
            if !matches!(upper.as_str(), "H" | "M" | "L") {
                return Err(Error::Validation(format!(
                    "priority must be H, M or L, not '{}'",
                    value
                )));
            }
            task.set("priority", upper);
        }
        "description" => {
            task.set("description", value);
        }
        "status" => {
            let status = Status::parse(value)?;
            task.set_status(status);
        }
        "tags" => {
            for tag in task.tags().to_vec() {
                task.remove_tag(&tag);
            }
            for tag in value.split(',').filter(|t| !t.is_empty()) {
                task.add_tag(tag);
            }
        }
        "depends" => edit_depends(task, value, store)?,
        _ => match col_type {
            ColumnType::DateTime => {
                let epoch = eval_date_value(value, eval, config)?;
                task.set(name, epoch.to_string());
            }
            ColumnType::Duration => {
                if Span::parse_str(value).is_none() {
                    return Err(Error::Validation(format!(
                        "'{}' is not a duration",
                        value
                    )));
                }
                // Recurrence keeps the raw text.
                task.set(name, value);
            }
            ColumnType::Numeric => {
                value.parse::<f64>().map_err(|_| {
                    Error::Validation(format!("'{}' is not a number", value))
                })?;
                task.set(name, value);
            }
            ColumnType::Text => {
                task.set(name, value);
            }
        },
    }

    Ok(())
}

/// Evaluate a date-typed modification value.
///
/// Direct date forms (named, formatted, ISO, epoch) win; anything else
/// runs through the expression engine so `due:eom+2d` works. An
/// evaluated magnitude under five years is a relative duration added
/// to now; larger values are epochs.
fn eval_date_value(value: &str, eval: &Eval, config: &Config) -> Result<i64> {
    let dateformat = config.get("dateformat").unwrap_or("m/d/Y");
    let weekstart = config.weekstart();

    if let Ok(date) = CalDate::parse(value, dateformat, weekstart) {
        return Ok(date.epoch());
    }

    let result = eval.evaluate_infix(value, None)?;
    let seconds = match result.data() {
        Data::Date(epoch) => *epoch,
        Data::Duration(seconds) => *seconds,
        Data::Int(n) => *n,
        Data::Real(r) => r.trunc() as i64,
        Data::Str(s) => {
            return CalDate::parse(s, dateformat, weekstart).map(|d| d.epoch());
        }
        Data::Bool(_) => {
            return Err(Error::Validation(format!("'{}' is not a date", value)));
        }
    };

    if seconds.abs() < EPOCH_CUTOVER {
        Ok(now_epoch() + seconds)
    } else {
        Ok(seconds)
    }
}

/// Edit the dependency set: a comma list of IDs/UUIDs, each optionally
/// `-` prefixed for removal. All references validate before anything
/// applies, so a rejected edit leaves no partial state.
fn edit_depends(task: &mut Task, value: &str, store: &Store) -> Result<()> {
    let own = task.uuid()?;
    let mut additions: Vec<Uuid> = Vec::new();
    let mut removals: Vec<Uuid> = Vec::new();

    for part in value.split(',').filter(|p| !p.is_empty()) {
        let (removing, reference) = match part.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, part),
        };
        let dep = resolve_task_reference(reference, store)?;
        if removing {
            removals.push(dep);
        } else {
            additions.push(dep);
        }
    }

    for dep in &additions {
        if *dep == own {
            return Err(Error::Validation(
                "a task cannot depend on itself".to_string(),
            ));
        }
        if store.creates_cycle(own, *dep) {
            return Err(Error::Validation(format!(
                "dependency on {} would create a cycle",
                dep
            )));
        }
    }

    for dep in removals {
        task.remove_depend(&dep);
    }
    for dep in additions {
        task.add_depend(dep)?;
    }
    Ok(())
}

/// Resolve a task reference (working-set ID, full UUID, or unique
/// partial UUID) to the UUID of an existing task.
fn resolve_task_reference(reference: &str, store: &Store) -> Result<Uuid> {
    if reference.bytes().all(|b| b.is_ascii_digit()) {
        let id: usize = reference
            .parse()
            .map_err(|_| Error::Validation(format!("'{}' is not a task ID", reference)))?;
        return store
            .find_by_id(id)
            .ok_or_else(|| Error::Validation(format!("no task with ID {}", id)))
            .and_then(|t| t.uuid());
    }

    if let Ok(uuid) = Uuid::parse_str(reference) {
        return match store.find_by_uuid(&uuid.to_string()) {
            Some(_) => Ok(uuid),
            None => Err(Error::Validation(format!("no task with uuid {}", uuid))),
        };
    }

    // Partial UUID: a unique prefix of a stored task.
    let matches: Vec<Uuid> = store
        .pending()
        .iter()
        .chain(store.completed().iter())
        .filter(|t| t.uuid_str().starts_with(reference))
        .filter_map(|t| t.uuid().ok())
        .collect();
    match matches.as_slice() {
        [] => Err(Error::Validation(format!(
            "'{}' does not name a task",
            reference
        ))),
        [unique] => Ok(*unique),
        _ => Err(Error::ambiguity(
            "uuid",
            reference,
            matches.iter().map(|u| u.to_string()).collect(),
        )),
    }
}

/// Column type of a configured UDA, defaulting to text.
fn uda_column_type(config: &Config, name: &str) -> ColumnType {
    match config.uda_type(name).as_str() {
        "date" => ColumnType::DateTime,
        "numeric" => ColumnType::Numeric,
        "duration" => ColumnType::Duration,
        _ => ColumnType::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsk_expr::ValueContext;

    fn fixtures() -> (Eval, Config, Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().to_path_buf()).unwrap();
        (
            Eval::new(ValueContext::default()),
            Config::default(),
            store,
            dir,
        )
    }

    fn attribute_mod(name: &str, value: &str) -> Arg {
        let mut arg = Arg::tagged(format!("{}:{}", name, value), ArgTag::Modification);
        arg.tag(ArgTag::Attribute);
        arg.tag(ArgTag::Modifiable);
        arg.attrs.name = Some(name.to_string());
        arg.attrs.value = Some(value.to_string());
        arg
    }

    fn tag_mod(sign: &str, name: &str) -> Arg {
        let mut arg = Arg::tagged(format!("{}{}", sign, name), ArgTag::Modification);
        arg.tag(ArgTag::Tag);
        arg.attrs.sign = Some(sign.to_string());
        arg.attrs.name = Some(name.to_string());
        arg
    }

    fn word_mod(word: &str) -> Arg {
        Arg::tagged(word, ArgTag::Modification)
    }

    #[test]
    fn test_description_replace() {
        let (eval, config, store, _dir) = fixtures();
        let mut task = Task::new("old");
        apply_modifications(
            &mut task,
            &[word_mod("Buy"), word_mod("milk")],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        assert_eq!(task.description(), "Buy milk");
    }

    #[test]
    fn test_description_append_prepend() {
        let (eval, config, store, _dir) = fixtures();
        let mut task = Task::new("middle");
        apply_modifications(
            &mut task,
            &[word_mod("end")],
            DescriptionMode::Append,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        assert_eq!(task.description(), "middle end");
        apply_modifications(
            &mut task,
            &[word_mod("start")],
            DescriptionMode::Prepend,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        assert_eq!(task.description(), "start middle end");
    }

    #[test]
    fn test_annotate_mode() {
        let (eval, config, store, _dir) = fixtures();
        let mut task = Task::new("x");
        apply_modifications(
            &mut task,
            &[word_mod("a"), word_mod("note")],
            DescriptionMode::Annotate,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        assert_eq!(task.annotations().len(), 1);
        assert_eq!(task.annotations()[0].description, "a note");
    }

    #[test]
    fn test_tag_add_remove_roundtrip() {
        let (eval, config, store, _dir) = fixtures();
        let mut task = Task::new("x");
        apply_modifications(
            &mut task,
            &[tag_mod("+", "home")],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        assert!(task.has_tag("home"));
        apply_modifications(
            &mut task,
            &[tag_mod("+", "home"), tag_mod("-", "home")],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        assert!(!task.has_tag("home"));
    }

    #[test]
    fn test_priority_uppercase_and_validation() {
        let (eval, config, store, _dir) = fixtures();
        let mut task = Task::new("x");
        apply_modifications(
            &mut task,
            &[attribute_mod("priority", "h")],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        assert_eq!(task.get("priority"), Some("H"));

        let err = apply_modifications(
            &mut task,
            &[attribute_mod("priority", "X")],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_date_value_relative() {
        let (eval, config, store, _dir) = fixtures();
        let mut task = Task::new("x");
        apply_modifications(
            &mut task,
            &[attribute_mod("due", "tomorrow")],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        let due = task.get_date("due").unwrap();
        let tomorrow = tsk_time::named::parse_named("tomorrow", 1).unwrap();
        assert_eq!(due, tomorrow.epoch());
    }

    #[test]
    fn test_date_value_expression() {
        let (eval, config, store, _dir) = fixtures();
        let mut task = Task::new("x");
        apply_modifications(
            &mut task,
            &[attribute_mod("due", "eom+2d")],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        let eom = tsk_time::named::parse_named("eom", 1).unwrap();
        assert_eq!(task.get_date("due").unwrap(), eom.epoch() + 2 * 86_400);
    }

    #[test]
    fn test_date_value_duration_offset() {
        let (eval, config, store, _dir) = fixtures();
        let mut task = Task::new("x");
        let before = now_epoch();
        apply_modifications(
            &mut task,
            &[attribute_mod("due", "2d")],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        let due = task.get_date("due").unwrap();
        assert!(due >= before + 2 * 86_400 && due <= before + 2 * 86_400 + 5);
    }

    #[test]
    fn test_clear_attribute() {
        let (eval, config, store, _dir) = fixtures();
        let mut task = Task::new("x");
        task.set("due", "1450000000");
        apply_modifications(
            &mut task,
            &[attribute_mod("due", "")],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        assert!(task.get("due").is_none());
    }

    #[test]
    fn test_recur_requires_due() {
        let (eval, config, store, _dir) = fixtures();
        let mut task = Task::new("x");
        let err = apply_modifications(
            &mut task,
            &[attribute_mod("recur", "weekly")],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        );
        assert!(err.is_err());

        let mut task = Task::new("y");
        apply_modifications(
            &mut task,
            &[attribute_mod("due", "tomorrow"), attribute_mod("recur", "weekly")],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        assert_eq!(task.get("recur"), Some("weekly"));
    }

    #[test]
    fn test_substitution() {
        let (eval, config, store, _dir) = fixtures();
        let mut task = Task::new("foo and foo again");
        let mut sub = Arg::tagged("/foo/bar/", ArgTag::Modification);
        sub.tag(ArgTag::Substitution);
        sub.attrs.from = Some("foo".to_string());
        sub.attrs.to = Some("bar".to_string());
        sub.attrs.global = Some(false);
        apply_modifications(
            &mut task,
            &[sub.clone()],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        assert_eq!(task.description(), "bar and foo again");

        sub.attrs.global = Some(true);
        let mut task = Task::new("foo and foo again");
        apply_modifications(
            &mut task,
            &[sub],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        assert_eq!(task.description(), "bar and bar again");
    }

    #[test]
    fn test_depends_cycle_rejected_without_partial_state() {
        let (eval, config, mut store, _dir) = fixtures();
        let a = Task::new("a");
        let mut b = Task::new("b");
        let a_uuid = a.uuid().unwrap();
        b.add_depend(a_uuid).unwrap();
        let b_id;
        store.append(a.clone()).unwrap();
        b_id = store.append(b.clone()).unwrap();

        // a depending on b would close the loop; the edit also names a
        // valid removal which must not be applied.
        let mut editing = store.find_by_uuid(&a_uuid.to_string()).unwrap().clone();
        let value = format!("{}", b_id);
        let result = apply_modifications(
            &mut editing,
            &[attribute_mod("depends", &value)],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        );
        assert!(result.is_err());
        assert!(editing.depends().is_empty());
    }

    #[test]
    fn test_edits_depends() {
        assert!(edits_depends(&[attribute_mod("depends", "1")]));
        assert!(!edits_depends(&[attribute_mod("due", "tomorrow")]));
        assert!(!edits_depends(&[word_mod("plain")]));
    }

    #[test]
    fn test_depends_on_completed_task() {
        let (eval, config, mut store, _dir) = fixtures();
        let mut finished = Task::new("finished");
        finished.set_status(Status::Completed);
        finished.set("end", now_epoch().to_string());
        let finished_uuid = finished.uuid().unwrap();
        store.append(finished).unwrap();
        store.append(Task::new("open")).unwrap();
        store.gc().unwrap();

        // A completed task is a valid dependency target, by full UUID.
        let mut editing = store.pending()[0].clone();
        apply_modifications(
            &mut editing,
            &[attribute_mod("depends", &finished_uuid.to_string())],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        assert!(editing.depends().contains(&finished_uuid));

        // And by partial UUID. Nine characters keeps the dash, so the
        // reference can never read as a working-set ID.
        let mut editing = store.pending()[0].clone();
        let prefix = finished_uuid.to_string()[..9].to_string();
        apply_modifications(
            &mut editing,
            &[attribute_mod("depends", &prefix)],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        assert!(editing.depends().contains(&finished_uuid));
    }

    #[test]
    fn test_cycle_through_completed_task() {
        let (eval, config, mut store, _dir) = fixtures();
        let open = Task::new("open");
        let open_uuid = open.uuid().unwrap();
        let mut finished = Task::new("finished");
        finished.add_depend(open_uuid).unwrap();
        finished.set_status(Status::Completed);
        finished.set("end", now_epoch().to_string());
        let finished_uuid = finished.uuid().unwrap();
        store.append(open).unwrap();
        store.append(finished).unwrap();
        store.gc().unwrap();

        // finished → open already exists in the completed log, so
        // open → finished closes a loop through a completed task.
        let mut editing = store
            .find_by_uuid(&open_uuid.to_string())
            .unwrap()
            .clone();
        let result = apply_modifications(
            &mut editing,
            &[attribute_mod("depends", &finished_uuid.to_string())],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        );
        assert!(result.is_err());
        assert!(editing.depends().is_empty());
    }

    #[test]
    fn test_depends_by_id() {
        let (eval, config, mut store, _dir) = fixtures();
        let a = Task::new("a");
        let a_uuid = a.uuid().unwrap();
        store.append(a).unwrap();
        let b = Task::new("b");
        store.append(b.clone()).unwrap();

        let mut editing = store.find_by_uuid(b.uuid_str()).unwrap().clone();
        apply_modifications(
            &mut editing,
            &[attribute_mod("depends", "1")],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        )
        .unwrap();
        assert!(editing.depends().contains(&a_uuid));
    }

    #[test]
    fn test_read_only_attribute_rejected() {
        let (eval, config, store, _dir) = fixtures();
        let mut task = Task::new("x");
        let mut arg = Arg::tagged("uuid:nope", ArgTag::Modification);
        arg.tag(ArgTag::Attribute);
        arg.attrs.name = Some("uuid".to_string());
        arg.attrs.value = Some("nope".to_string());
        let err = apply_modifications(
            &mut task,
            &[arg],
            DescriptionMode::Replace,
            &eval,
            &config,
            &store,
        );
        assert!(err.is_err());
    }
}
