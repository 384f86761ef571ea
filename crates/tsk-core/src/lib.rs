//! tsk-core - Task model, configuration, store and hooks.
//!
//! The in-memory task record with its typed attributes, tags,
//! annotations and dependencies; the line-oriented configuration
//! loader; the JSON-lines pending/completed store with its undo log and
//! file lock; and the hook runner.

pub mod columns;
pub mod config;
pub mod hooks;
pub mod store;
pub mod task;

pub use columns::{Column, ColumnType};
pub use config::Config;
pub use hooks::{HookEvent, Hooks};
pub use store::Store;
pub use task::{Annotation, Status, Task};

/// Current time as epoch seconds.
pub fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}
