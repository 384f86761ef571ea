//! The task store.
//!
//! Two JSON-lines logs, `pending.data` and `completed.data`, plus
//! `undo.data`. The completed log loads on demand so shortcut-eligible
//! filters never touch it. An advisory file lock covers the whole
//! store: exclusive for write commands, shared for read-only commands,
//! held for the full command duration.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

use fs2::FileExt;
use tracing::debug;
use uuid::Uuid;

use tsk_util::{Error, Result};

use crate::now_epoch;
use crate::task::Task;

/// One undo checkpoint entry: the pre-image (absent for creations) and
/// the post-image of a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    pub old: Option<String>,
    pub new: String,
}

/// The on-disk store.
pub struct Store {
    data_dir: PathBuf,
    lock_file: Option<File>,
    pending: Vec<Task>,
    completed: Option<Vec<Task>>,
    pending_loaded: bool,
    dirty: bool,
}

impl Store {
    /// Open a store rooted at `data_dir`, creating the directory when
    /// missing.
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .map_err(|e| Error::Store(format!("cannot create '{}': {}", data_dir.display(), e)))?;
        Ok(Store {
            data_dir,
            lock_file: None,
            pending: Vec::new(),
            completed: None,
            pending_loaded: false,
            dirty: false,
        })
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    // ------------------------------------------------------------------
    // Locking.

    fn lock_handle(&mut self) -> Result<&File> {
        if self.lock_file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .open(self.path("lock"))
                .map_err(|e| Error::Store(format!("cannot open lock file: {}", e)))?;
            self.lock_file = Some(file);
        }
        Ok(self.lock_file.as_ref().expect("lock file just opened"))
    }

    /// Shared lock for read-only commands.
    pub fn lock_shared(&mut self) -> Result<()> {
        self.lock_handle()?
            .lock_shared()
            .map_err(|e| Error::Store(format!("the store is locked: {}", e)))
    }

    /// Exclusive lock for write commands.
    pub fn lock_exclusive(&mut self) -> Result<()> {
        self.lock_handle()?
            .lock_exclusive()
            .map_err(|e| Error::Store(format!("the store is locked: {}", e)))
    }

    /// Release the lock, if held.
    pub fn unlock(&mut self) {
        if let Some(file) = self.lock_file.take() {
            let _ = file.unlock();
        }
    }

    // ------------------------------------------------------------------
    // Loading.

    fn read_log(&self, name: &str) -> Result<Vec<Task>> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Store(format!("cannot read '{}': {}", path.display(), e)))?;
        let mut tasks = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            tasks.push(Task::parse_line(line)?);
        }
        Ok(tasks)
    }

    /// Load the pending log and assign working-set IDs.
    pub fn load_pending(&mut self) -> Result<&[Task]> {
        if !self.pending_loaded {
            self.pending = self.read_log("pending.data")?;
            for (i, task) in self.pending.iter_mut().enumerate() {
                task.id = Some(i + 1);
            }
            self.pending_loaded = true;
            debug!(count = self.pending.len(), "loaded pending store");
        }
        Ok(&self.pending)
    }

    /// Load the completed log on demand.
    pub fn load_completed(&mut self) -> Result<&[Task]> {
        if self.completed.is_none() {
            let tasks = self.read_log("completed.data")?;
            debug!(count = tasks.len(), "loaded completed store");
            self.completed = Some(tasks);
        }
        Ok(self.completed.as_deref().expect("completed just loaded"))
    }

    /// True when the completed log has been loaded.
    pub fn completed_loaded(&self) -> bool {
        self.completed.is_some()
    }

    pub fn pending(&self) -> &[Task] {
        &self.pending
    }

    pub fn completed(&self) -> &[Task] {
        self.completed.as_deref().unwrap_or(&[])
    }

    // ------------------------------------------------------------------
    // Mutation.

    /// Append a new task to the pending log.
    pub fn append(&mut self, mut task: Task) -> Result<usize> {
        self.load_pending()?;
        let id = self.pending.len() + 1;
        task.id = Some(id);
        self.pending.push(task);
        self.dirty = true;
        Ok(id)
    }

    /// Replace the stored task with the same UUID.
    pub fn update(&mut self, task: &Task) -> Result<()> {
        let uuid = task.uuid_str().to_string();
        if let Some(slot) = self.pending.iter_mut().find(|t| t.uuid_str() == uuid) {
            *slot = task.clone();
            self.dirty = true;
            return Ok(());
        }
        if let Some(completed) = &mut self.completed {
            if let Some(slot) = completed.iter_mut().find(|t| t.uuid_str() == uuid) {
                *slot = task.clone();
                self.dirty = true;
                return Ok(());
            }
        }
        Err(Error::Store(format!("no stored task with uuid {}", uuid)))
    }

    /// Remove a task outright (undo of a creation).
    pub fn remove(&mut self, uuid: &str) {
        self.pending.retain(|t| t.uuid_str() != uuid);
        if let Some(completed) = &mut self.completed {
            completed.retain(|t| t.uuid_str() != uuid);
        }
        self.dirty = true;
    }

    /// Insert a task record, routing by status: terminal tasks go to
    /// the completed log when it is loaded, everything else to
    /// pending.
    pub fn insert(&mut self, task: Task) {
        if task.status().is_terminal() {
            if let Some(completed) = &mut self.completed {
                completed.push(task);
                self.dirty = true;
                return;
            }
        }
        self.pending.push(task);
        self.dirty = true;
    }

    pub fn find_by_uuid(&self, uuid: &str) -> Option<&Task> {
        self.pending
            .iter()
            .find(|t| t.uuid_str() == uuid)
            .or_else(|| self.completed().iter().find(|t| t.uuid_str() == uuid))
    }

    pub fn find_by_id(&self, id: usize) -> Option<&Task> {
        self.pending.iter().find(|t| t.id == Some(id))
    }

    /// True when adding `to` as a dependency of `from` would close a
    /// cycle. Depth-first walk from `to` along stored dependencies.
    pub fn creates_cycle(&self, from: Uuid, to: Uuid) -> bool {
        let mut stack = vec![to];
        let mut seen = std::collections::HashSet::new();
        while let Some(current) = stack.pop() {
            if current == from {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(task) = self.find_by_uuid(&current.to_string()) {
                stack.extend(task.depends().iter().copied());
            }
        }
        false
    }

    /// Write both logs back to disk.
    pub fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.write_log("pending.data", &self.pending)?;
        if let Some(completed) = &self.completed {
            self.write_log("completed.data", completed)?;
        }
        self.dirty = false;
        Ok(())
    }

    fn write_log(&self, name: &str, tasks: &[Task]) -> Result<()> {
        let path = self.path(name);
        let tmp = self.path(&format!("{}.tmp", name));
        let mut out = String::new();
        for task in tasks {
            out.push_str(&task.compose());
            out.push('\n');
        }
        std::fs::write(&tmp, out)
            .map_err(|e| Error::Store(format!("cannot write '{}': {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| Error::Store(format!("cannot replace '{}': {}", path.display(), e)))?;
        Ok(())
    }

    /// Move terminal tasks from pending to completed and renumber the
    /// working set.
    pub fn gc(&mut self) -> Result<()> {
        self.load_pending()?;
        if self
            .pending
            .iter()
            .any(|t| t.status().is_terminal())
        {
            self.load_completed()?;
            let completed = self.completed.as_mut().expect("completed just loaded");
            let mut kept = Vec::with_capacity(self.pending.len());
            for mut task in self.pending.drain(..) {
                if task.status().is_terminal() {
                    task.id = None;
                    completed.push(task);
                } else {
                    kept.push(task);
                }
            }
            self.pending = kept;
            self.dirty = true;
        }

        for (i, task) in self.pending.iter_mut().enumerate() {
            task.id = Some(i + 1);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Undo.

    /// Record one checkpoint holding the pre- and post-images of every
    /// task a mutation pass touched.
    pub fn snapshot_undo(&self, entries: &[UndoEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut block = format!("time {}\n", now_epoch());
        for entry in entries {
            if let Some(old) = &entry.old {
                block.push_str("old ");
                block.push_str(old);
                block.push('\n');
            }
            block.push_str("new ");
            block.push_str(&entry.new);
            block.push('\n');
        }
        block.push_str("---\n");

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path("undo.data"))
            .map_err(|e| Error::Store(format!("cannot open undo log: {}", e)))?;
        file.write_all(block.as_bytes())
            .map_err(|e| Error::Store(format!("cannot append undo log: {}", e)))?;
        Ok(())
    }

    /// Pop the most recent checkpoint, removing it from the log.
    pub fn pop_undo(&self) -> Result<Option<Vec<UndoEntry>>> {
        let path = self.path("undo.data");
        if !path.exists() {
            return Ok(None);
        }
        let mut content = String::new();
        File::open(&path)
            .and_then(|mut f| f.read_to_string(&mut content))
            .map_err(|e| Error::Store(format!("cannot read undo log: {}", e)))?;

        let mut blocks: Vec<&str> = content
            .split("---\n")
            .filter(|b| !b.trim().is_empty())
            .collect();
        let last = match blocks.pop() {
            Some(last) => last,
            None => return Ok(None),
        };

        let mut entries = Vec::new();
        let mut pending_old: Option<String> = None;
        for line in last.lines() {
            if let Some(old) = line.strip_prefix("old ") {
                pending_old = Some(old.to_string());
            } else if let Some(new) = line.strip_prefix("new ") {
                entries.push(UndoEntry {
                    old: pending_old.take(),
                    new: new.to_string(),
                });
            }
        }

        // Rewrite the log without the popped block.
        let mut remaining = String::new();
        for block in blocks {
            remaining.push_str(block);
            remaining.push_str("---\n");
        }
        std::fs::write(&path, remaining)
            .map_err(|e| Error::Store(format!("cannot rewrite undo log: {}", e)))?;

        Ok(Some(entries))
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.unlock();
    }
}
