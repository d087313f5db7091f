//! In-memory scan task registry.
//!
//! The registry owns every task for the lifetime of the process; completed
//! tasks are never evicted, so a client can keep polling a finished scan.
//! One `RwLock` guards the whole table: every mutation is an O(1) field
//! write or log append under the write guard, and readers take the read
//! guard to clone a consistent snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("scan task {0} not found")]
    TaskNotFound(Uuid),

    #[error("target index {index} out of range for task {task}")]
    TargetOutOfRange { task: Uuid, index: usize },
}

/// Lifecycle of a single target within a task.
///
/// Transitions are strictly forward: `pending` to `scanning` to `done`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    /// Waiting for a worker slot
    Pending,
    /// A worker is probing this target
    Scanning,
    /// All dictionary entries have been tried
    Done,
}

impl std::fmt::Display for TargetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetState::Pending => write!(f, "pending"),
            TargetState::Scanning => write!(f, "scanning"),
            TargetState::Done => write!(f, "done"),
        }
    }
}

/// Progress record for one target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetStatus {
    /// The target exactly as submitted
    pub name: String,

    /// Current lifecycle state
    pub status: TargetState,

    /// Number of backup files persisted for this target so far
    pub found: u64,
}

/// One scan run covering a set of targets with a shared dictionary.
#[derive(Debug, Clone, Serialize)]
pub struct ScanTask {
    /// Unique task identifier
    pub id: Uuid,

    /// Append-only human-readable scan log
    pub logs: Vec<String>,

    /// Per-target progress, index-stable for the task's lifetime
    pub targets: Vec<TargetStatus>,

    /// Total number of targets
    pub total_targets: usize,

    /// Number of targets that finished probing (monotonic, bounded by total)
    pub finished_targets: usize,

    /// Resolved candidate-path dictionary
    pub paths: Vec<String>,

    /// Requested worker-pool size after clamping
    pub max_workers: usize,

    /// Set once the worker pool has drained; never unset
    pub done: bool,

    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

/// Shared handle to the process-wide task table.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<Uuid, ScanTask>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a task and return a snapshot of it.
    ///
    /// The target sequence is fixed here and never resized afterwards;
    /// workers address their target by index.
    pub async fn create(
        &self,
        targets: &[String],
        paths: Vec<String>,
        max_workers: usize,
    ) -> ScanTask {
        let task = ScanTask {
            id: Uuid::new_v4(),
            logs: Vec::new(),
            targets: targets
                .iter()
                .map(|name| TargetStatus {
                    name: name.clone(),
                    status: TargetState::Pending,
                    found: 0,
                })
                .collect(),
            total_targets: targets.len(),
            finished_targets: 0,
            paths,
            max_workers,
            done: false,
            created_at: Utc::now().to_rfc3339(),
        };
        self.tasks.write().await.insert(task.id, task.clone());
        task
    }

    /// Snapshot a task by id.
    pub async fn get(&self, id: Uuid) -> Option<ScanTask> {
        self.tasks.read().await.get(&id).cloned()
    }

    /// Append one line to a task's log.
    pub async fn append_log(
        &self,
        id: Uuid,
        line: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(RegistryError::TaskNotFound(id))?;
        task.logs.push(line.into());
        Ok(())
    }

    /// Update the lifecycle state of one target.
    pub async fn set_target_state(
        &self,
        id: Uuid,
        index: usize,
        status: TargetState,
    ) -> Result<(), RegistryError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(RegistryError::TaskNotFound(id))?;
        let target = task
            .targets
            .get_mut(index)
            .ok_or(RegistryError::TargetOutOfRange { task: id, index })?;
        target.status = status;
        Ok(())
    }

    /// Publish a new found-count for one target.
    pub async fn set_target_found(
        &self,
        id: Uuid,
        index: usize,
        found: u64,
    ) -> Result<(), RegistryError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(RegistryError::TaskNotFound(id))?;
        let target = task
            .targets
            .get_mut(index)
            .ok_or(RegistryError::TargetOutOfRange { task: id, index })?;
        target.found = found;
        Ok(())
    }

    /// Count one target as finished and return `(finished, total)` as of this
    /// increment, for the milestone log line.
    pub async fn finish_target(&self, id: Uuid) -> Result<(usize, usize), RegistryError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(RegistryError::TaskNotFound(id))?;
        task.finished_targets += 1;
        Ok((task.finished_targets, task.total_targets))
    }

    /// Mark a task done. One-way; callers rely on this always succeeding for
    /// a live task so a polling client never sees a stuck scan.
    pub async fn mark_done(&self, id: Uuid) -> Result<(), RegistryError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(RegistryError::TaskNotFound(id))?;
        task.done = true;
        Ok(())
    }
}
