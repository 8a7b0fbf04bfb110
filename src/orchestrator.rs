//! Root orchestrator wiring submitter, poller, state machine and gate
//!
//! One user-initiated download request flows through:
//! submit -> task id -> progress polling -> terminal snapshot -> on success
//! the completion gate -> on dismissal the delivery hook. Exactly one task is
//! active at a time; a second request while any task is in flight is rejected
//! without contacting the service.
//!
//! The lifecycle is the only shared mutable resource. It sits behind a mutex
//! that is never held across an await, and every effect arriving from the
//! poller or the gate re-checks the active task id before being applied, so
//! late results from a cancelled or superseded task are discarded.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, watch};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::gate::CompletionGate;
use crate::lifecycle::{Lifecycle, SnapshotOutcome};
use crate::poller::{ProgressPoller, SnapshotHandler, TerminalHandler};
use crate::service::TaskService;
use crate::types::{Event, Format, ProgressSnapshot, Task, TaskId, TaskState, VideoInfo};

/// Hook invoked exactly once per completed task with the artifact filename
pub type DeliveryHook = Arc<dyn Fn(TaskId, String) + Send + Sync>;

/// Orchestrator root (cloneable - clones share the same task slot)
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    service: Arc<dyn TaskService>,
    gate: Arc<dyn CompletionGate>,
    delivery: DeliveryHook,
    lifecycle: Mutex<Lifecycle>,
    poller: Mutex<Option<ProgressPoller>>,
    events: broadcast::Sender<Event>,
    state_tx: watch::Sender<TaskState>,
    snapshot_tx: watch::Sender<Option<ProgressSnapshot>>,
}

impl Orchestrator {
    /// Create an orchestrator with injected collaborators
    ///
    /// `delivery` fires exactly once per completed task, after the gate for
    /// that task has been dismissed (or its fallback elapsed).
    pub fn new(
        config: Config,
        service: Arc<dyn TaskService>,
        gate: Arc<dyn CompletionGate>,
        delivery: DeliveryHook,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        let (state_tx, _) = watch::channel(TaskState::Idle);
        let (snapshot_tx, _) = watch::channel(None);

        Self {
            inner: Arc::new(Inner {
                config,
                service,
                gate,
                delivery,
                lifecycle: Mutex::new(Lifecycle::new()),
                poller: Mutex::new(None),
                events,
                state_tx,
                snapshot_tx,
            }),
        }
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.events.subscribe()
    }

    /// Watch the current task state
    pub fn watch_state(&self) -> watch::Receiver<TaskState> {
        self.inner.state_tx.subscribe()
    }

    /// Watch the latest progress snapshot
    pub fn watch_snapshot(&self) -> watch::Receiver<Option<ProgressSnapshot>> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Current task state
    pub fn state(&self) -> TaskState {
        *self.inner.state_tx.borrow()
    }

    /// Latest snapshot for the active task, if any
    pub fn latest_snapshot(&self) -> Option<ProgressSnapshot> {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Fetch source metadata without starting a conversion
    pub async fn video_info(&self, url: &str) -> Result<VideoInfo> {
        self.inner.service.video_info(url).await
    }

    /// Absolute URL for retrieving a finished artifact
    pub fn artifact_url(&self, filename: &str) -> Result<String> {
        self.inner.service.artifact_url(filename)
    }

    /// Submit a conversion job and start tracking it
    ///
    /// The source URL is expected to have passed any collaborator-side
    /// validation already; it is not re-validated here. Rejects with
    /// [`Error::UnsupportedFormat`] or [`Error::TaskInProgress`] before any
    /// network traffic. On submission failure the orchestrator is back in
    /// `Idle` and the error carries the service's message when one was
    /// provided.
    pub async fn request_download(&self, url: &str, format: Format) -> Result<TaskId> {
        if !self.inner.config.formats.contains(&format) {
            return Err(Error::UnsupportedFormat(format.to_string()));
        }

        self.lifecycle().begin_submission()?;
        self.set_state(TaskState::Submitting);

        match self.inner.service.submit(url, format).await {
            Ok(task_id) => {
                let task = Task::new(task_id.clone(), url, format);
                self.lifecycle().submission_accepted(task);
                self.inner.snapshot_tx.send_replace(None);
                self.set_state(TaskState::Polling);
                self.emit(Event::Submitted {
                    id: task_id.clone(),
                });
                tracing::info!(task_id = %task_id, %format, "conversion task submitted");
                self.start_poller(task_id.clone());
                Ok(task_id)
            }
            Err(error) => {
                self.lifecycle().submission_failed();
                self.set_state(TaskState::Idle);
                self.emit(Event::SubmissionFailed {
                    error: error.to_string(),
                });
                tracing::warn!(%error, "submission failed");
                Err(error)
            }
        }
    }

    /// Cancel the active task, if any
    ///
    /// Stops the poller and discards the task; outstanding queries may still
    /// resolve but their results no longer match the active task id and are
    /// ignored. A new submission is accepted immediately afterwards.
    pub fn cancel(&self) {
        let cancelled = {
            let mut lifecycle = self.lifecycle();
            let id = lifecycle.task().map(|task| task.id.clone());
            if id.is_some() {
                lifecycle.reset();
            }
            id
        };

        if let Some(poller) = self.poller_slot().take() {
            poller.stop();
        }

        if let Some(id) = cancelled {
            self.inner.snapshot_tx.send_replace(None);
            self.set_state(TaskState::Idle);
            self.emit(Event::Cancelled { id: id.clone() });
            tracing::info!(task_id = %id, "task cancelled");
        }
    }

    fn start_poller(&self, task_id: TaskId) {
        let on_snapshot: SnapshotHandler = {
            let this = self.clone();
            Arc::new(move |snapshot| this.handle_snapshot(snapshot))
        };
        let on_terminal: TerminalHandler = {
            let this = self.clone();
            Box::new(move |snapshot| {
                tokio::spawn(async move {
                    this.handle_terminal(snapshot).await;
                });
            })
        };

        let poller = ProgressPoller::start(
            self.inner.service.clone(),
            task_id,
            self.inner.config.poll_interval,
            on_snapshot,
            on_terminal,
        );
        if let Some(previous) = self.poller_slot().replace(poller) {
            previous.stop();
        }
    }

    /// Record a non-terminal snapshot for observation. Terminal snapshots
    /// are driven through [`Self::handle_terminal`]; this path cannot halt
    /// or restart polling.
    fn handle_snapshot(&self, snapshot: ProgressSnapshot) {
        if snapshot.is_terminal() {
            return;
        }
        match self.lifecycle().apply_snapshot(snapshot.clone()) {
            SnapshotOutcome::Progressed => {
                self.inner.snapshot_tx.send_replace(Some(snapshot.clone()));
                self.emit(Event::Progress {
                    id: snapshot.task_id,
                    status: snapshot.status,
                    percent: snapshot.percent,
                });
            }
            SnapshotOutcome::Stale => {
                tracing::debug!(task_id = %snapshot.task_id, "ignoring snapshot for inactive task");
            }
            // Non-terminal snapshots cannot produce terminal outcomes.
            SnapshotOutcome::Finished { .. } | SnapshotOutcome::Failed { .. } => {}
        }
    }

    async fn handle_terminal(&self, snapshot: ProgressSnapshot) {
        let task_id = snapshot.task_id.clone();
        let outcome = self.lifecycle().apply_snapshot(snapshot.clone());

        match outcome {
            SnapshotOutcome::Finished { filename } => {
                self.inner.snapshot_tx.send_replace(Some(snapshot));
                self.set_state(TaskState::AwaitingGate);
                self.emit(Event::AwaitingGate {
                    id: task_id.clone(),
                    filename: filename.clone(),
                });
                tracing::info!(task_id = %task_id, %filename, "conversion finished, presenting gate");

                if let Err(error) = self.inner.gate.present(&task_id).await {
                    tracing::warn!(
                        task_id = %task_id,
                        %error,
                        "gate failed to present, delivering after fallback delay"
                    );
                    self.emit(Event::GateFallback {
                        id: task_id.clone(),
                        error: error.to_string(),
                    });
                    tokio::time::sleep(self.inner.config.gate_fallback_delay).await;
                }

                // The task may have been cancelled while the gate was up.
                // Bound to a local so the lifecycle guard is released before
                // finish_task re-locks it below.
                let dismissed = self.lifecycle().gate_dismissed(&task_id);
                if let Some(filename) = dismissed {
                    self.set_state(TaskState::Completed);
                    (self.inner.delivery)(task_id.clone(), filename.clone());
                    self.emit(Event::Delivered {
                        id: task_id.clone(),
                        filename,
                    });
                    tracing::info!(task_id = %task_id, "artifact delivered");
                    self.finish_task();
                }
            }
            SnapshotOutcome::Failed { message } => {
                self.inner.snapshot_tx.send_replace(Some(snapshot));
                self.set_state(TaskState::Failed);
                self.emit(Event::TaskFailed {
                    id: task_id.clone(),
                    error: message.clone(),
                });
                tracing::warn!(task_id = %task_id, error = %message, "conversion failed");
                self.finish_task();
            }
            SnapshotOutcome::Stale => {
                tracing::debug!(task_id = %task_id, "ignoring terminal snapshot for inactive task");
            }
            SnapshotOutcome::Progressed => {}
        }
    }

    /// Discard the finished or failed task and return to `Idle`
    fn finish_task(&self) {
        self.lifecycle().reset();
        if let Some(poller) = self.poller_slot().take() {
            poller.stop();
        }
        self.set_state(TaskState::Idle);
    }

    fn set_state(&self, state: TaskState) {
        self.inner.state_tx.send_replace(state);
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine; events are observation only.
        let _ = self.inner.events.send(event);
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.inner
            .lifecycle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn poller_slot(&self) -> MutexGuard<'_, Option<ProgressPoller>> {
        self.inner
            .poller
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
