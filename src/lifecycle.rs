//! Task lifecycle state machine
//!
//! Owns the current task's state and applies transition rules from poll
//! snapshots:
//!
//! ```text
//! Idle --submit ok--> Submitting --task id received--> Polling
//! Polling --snapshot(starting|downloading)--> Polling
//! Polling --snapshot(finished)--> AwaitingGate
//! Polling --snapshot(error)--> Failed
//! AwaitingGate --gate dismissed--> Completed
//! Submitting --submit error--> Idle
//! ```
//!
//! The machine is pure and synchronous; it is consumed only by the
//! orchestrator, which checks the active task id before applying any effect.
//! Snapshots for a stale task id, or arriving after a terminal state, change
//! nothing.

use crate::error::{Error, Result};
use crate::types::{ProgressSnapshot, ProgressStatus, Task, TaskId, TaskState};

/// Effect of applying a poll snapshot to the active task
#[derive(Clone, Debug, PartialEq)]
pub enum SnapshotOutcome {
    /// Non-terminal progress; polling continues
    Progressed,
    /// Conversion finished; the gate should be presented before delivery
    Finished {
        /// Artifact filename reported by the service
        filename: String,
    },
    /// Conversion failed with the server-provided message
    Failed {
        /// Error message to surface to the user
        message: String,
    },
    /// Snapshot was for an inactive task or arrived after a terminal state
    Stale,
}

/// Current-task state, owned exclusively by the orchestrator
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: TaskState,
    task: Option<Task>,
    latest: Option<ProgressSnapshot>,
}

impl Lifecycle {
    /// Create a lifecycle in `Idle` with no task
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// The active task, if any
    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    /// The most recently applied snapshot, if any
    pub fn latest_snapshot(&self) -> Option<&ProgressSnapshot> {
        self.latest.as_ref()
    }

    /// Whether `id` is the active task
    pub fn is_active(&self, id: &TaskId) -> bool {
        self.task.as_ref().is_some_and(|task| &task.id == id)
    }

    /// `Idle -> Submitting`. Rejected while any task is in flight, so a
    /// second submission never reaches the service.
    pub fn begin_submission(&mut self) -> Result<()> {
        if self.state != TaskState::Idle {
            return Err(Error::TaskInProgress);
        }
        self.state = TaskState::Submitting;
        Ok(())
    }

    /// `Submitting -> Polling` with the accepted task
    pub fn submission_accepted(&mut self, task: Task) {
        self.task = Some(task);
        self.latest = None;
        self.state = TaskState::Polling;
    }

    /// `Submitting -> Idle` after a rejected or failed submission
    pub fn submission_failed(&mut self) {
        self.task = None;
        self.latest = None;
        self.state = TaskState::Idle;
    }

    /// Apply a poll snapshot based on its content, independent of arrival
    /// order. Stale snapshots (wrong task id, or any snapshot once the task
    /// left `Polling`) are ignored.
    pub fn apply_snapshot(&mut self, snapshot: ProgressSnapshot) -> SnapshotOutcome {
        if self.state != TaskState::Polling || !self.is_active(&snapshot.task_id) {
            return SnapshotOutcome::Stale;
        }

        let outcome = match snapshot.status {
            ProgressStatus::Finished => match snapshot.filename.clone() {
                Some(filename) => {
                    self.state = TaskState::AwaitingGate;
                    SnapshotOutcome::Finished { filename }
                }
                // The artifact reference is the deliverable; finishing
                // without one is a failure, not something to gate.
                None => {
                    self.state = TaskState::Failed;
                    SnapshotOutcome::Failed {
                        message: "conversion finished without an artifact".to_string(),
                    }
                }
            },
            ProgressStatus::Error => {
                self.state = TaskState::Failed;
                SnapshotOutcome::Failed {
                    message: snapshot
                        .error
                        .clone()
                        .unwrap_or_else(|| "conversion failed".to_string()),
                }
            }
            _ => SnapshotOutcome::Progressed,
        };

        self.latest = Some(snapshot);
        outcome
    }

    /// `AwaitingGate -> Completed`; yields the artifact filename exactly
    /// once. Returns `None` when the gate result is stale (task changed or
    /// dismissal already honored).
    pub fn gate_dismissed(&mut self, id: &TaskId) -> Option<String> {
        if self.state != TaskState::AwaitingGate || !self.is_active(id) {
            return None;
        }
        let filename = self
            .latest
            .as_ref()
            .and_then(|snapshot| snapshot.filename.clone())?;
        self.state = TaskState::Completed;
        Some(filename)
    }

    /// Discard the active task and return to `Idle`
    pub fn reset(&mut self) {
        self.task = None;
        self.latest = None;
        self.state = TaskState::Idle;
    }
}
