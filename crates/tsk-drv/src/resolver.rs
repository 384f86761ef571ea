//! The task DOM resolver.
//!
//! Exposes task attributes by dotted name to the expression engine.
//! Column typing drives the value kind: date columns yield date
//! values, numeric columns integers, everything else strings. The
//! source attribute name travels with the value so attribute-
//! conditioned comparison rules (priority ordering, project prefix
//! match) can apply.

use tsk_core::columns::{self, ColumnType};
use tsk_core::{Config, Task};
use tsk_expr::{Resolver, Value};

/// Per-task variable source.
pub struct TaskResolver<'a> {
    pub task: &'a Task,
    pub config: &'a Config,
}

impl<'a> TaskResolver<'a> {
    pub fn new(task: &'a Task, config: &'a Config) -> Self {
        TaskResolver { task, config }
    }
}

impl<'a> Resolver for TaskResolver<'a> {
    fn resolve(&self, name: &str) -> Option<Value> {
        let raw = self.task.dom(name)?;

        let col_type = columns::column(name)
            .map(|c| c.col_type)
            .or_else(|| uda_type(self.config, name));

        let value = match col_type {
            Some(ColumnType::DateTime) => {
                if raw.is_empty() {
                    Value::string("")
                } else {
                    match raw.parse::<i64>() {
                        Ok(epoch) => Value::date(epoch),
                        Err(_) => Value::string(raw.clone()),
                    }
                }
            }
            Some(ColumnType::Numeric) => {
                if let Ok(int) = raw.parse::<i64>() {
                    Value::int(int)
                } else if let Ok(real) = raw.parse::<f64>() {
                    Value::real(real)
                } else {
                    Value::string(raw.clone())
                }
            }
            // Durations keep their raw text; comparisons promote.
            _ => Value::string(raw.clone()),
        };

        Some(value.with_source(name))
    }

    fn has_tag(&self, tag: &str) -> bool {
        self.task.has_tag(tag)
    }
}

/// Column type of a configured UDA.
fn uda_type(config: &Config, name: &str) -> Option<ColumnType> {
    if !config.uda_names().iter().any(|u| u == name) {
        return None;
    }
    Some(match config.uda_type(name).as_str() {
        "date" => ColumnType::DateTime,
        "numeric" => ColumnType::Numeric,
        "duration" => ColumnType::Duration,
        _ => ColumnType::Text,
    })
}
