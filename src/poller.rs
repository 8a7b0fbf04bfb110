//! Fixed-interval progress polling
//!
//! The poller issues one progress query per interval against the remote task
//! service, starting immediately, until a terminal status arrives or it is
//! stopped. A failed query is a transient miss: the previous snapshot stands
//! and the schedule is unaffected. Stopping is recorded on a cancellation
//! token that is re-checked after every response, so a stop discards the
//! result of any query already in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::service::TaskService;
use crate::types::{ProgressSnapshot, TaskId};

/// Callback invoked with every parsed snapshot, for observation only; it
/// cannot halt or restart polling.
pub type SnapshotHandler = Arc<dyn Fn(ProgressSnapshot) + Send + Sync>;

/// Callback invoked exactly once with the final (terminal) snapshot.
pub type TerminalHandler = Box<dyn FnOnce(ProgressSnapshot) + Send>;

/// Repeating poller for a single task's progress
pub struct ProgressPoller {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ProgressPoller {
    /// Start polling `task_id` on `interval`. The first query is issued
    /// immediately rather than after a full interval.
    pub fn start(
        service: Arc<dyn TaskService>,
        task_id: TaskId,
        interval: Duration,
        on_snapshot: SnapshotHandler,
        on_terminal: TerminalHandler,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut on_terminal = Some(on_terminal);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let result = service.progress(&task_id).await;

                // A stop recorded while the query was in flight discards
                // its result.
                if token.is_cancelled() {
                    break;
                }

                match result {
                    Ok(snapshot) => {
                        let terminal = snapshot.is_terminal();
                        on_snapshot(snapshot.clone());
                        if terminal {
                            token.cancel();
                            if let Some(on_terminal) = on_terminal.take() {
                                on_terminal(snapshot);
                            }
                            break;
                        }
                    }
                    Err(error) => {
                        tracing::debug!(
                            task_id = %task_id,
                            %error,
                            "transient progress query failure, keeping schedule"
                        );
                    }
                }
            }
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Stop polling. Idempotent; once recorded no further queries are
    /// issued and in-flight results are discarded.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether a stop (explicit or terminal self-stop) has been recorded
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the polling task to finish after a stop or terminal status
    pub async fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for ProgressPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
