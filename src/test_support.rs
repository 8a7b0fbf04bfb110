//! Shared test fixtures: controllable gates, a recording delivery hook and
//! wire-body builders.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::error::GateError;
use crate::gate::CompletionGate;
use crate::orchestrator::DeliveryHook;
use crate::types::TaskId;

/// Gate that blocks until the test releases it, recording every presentation
pub(crate) struct ManualGate {
    notify: tokio::sync::Notify,
    presented: Mutex<Vec<TaskId>>,
}

impl ManualGate {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            notify: tokio::sync::Notify::new(),
            presented: Mutex::new(Vec::new()),
        })
    }

    /// Dismiss the currently presented gate
    pub(crate) fn release(&self) {
        self.notify.notify_one();
    }

    /// Task ids the gate has been presented for, in order
    pub(crate) fn presented(&self) -> Vec<TaskId> {
        self.presented
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CompletionGate for ManualGate {
    async fn present(&self, task: &TaskId) -> Result<(), GateError> {
        self.presented
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(task.clone());
        self.notify.notified().await;
        Ok(())
    }
}

/// Gate that always fails to present
pub(crate) struct FailingGate {
    message: String,
}

impl FailingGate {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl CompletionGate for FailingGate {
    async fn present(&self, _task: &TaskId) -> Result<(), GateError> {
        Err(GateError::Unavailable(self.message.clone()))
    }
}

/// Deliveries recorded by [`recording_delivery`]
pub(crate) type Deliveries = Arc<Mutex<Vec<(TaskId, String)>>>;

/// Delivery hook that records every invocation
pub(crate) fn recording_delivery() -> (DeliveryHook, Deliveries) {
    let deliveries: Deliveries = Arc::new(Mutex::new(Vec::new()));
    let recorded = deliveries.clone();
    let hook: DeliveryHook = Arc::new(move |id, filename| {
        recorded
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((id, filename));
    });
    (hook, deliveries)
}

/// Wire body for a successful progress query
pub(crate) fn progress_body(
    status: &str,
    percent: Option<f32>,
    filename: Option<&str>,
    error: Option<&str>,
) -> serde_json::Value {
    let mut progress = serde_json::Map::new();
    progress.insert("status".to_string(), json!(status));
    if let Some(percent) = percent {
        progress.insert("progress".to_string(), json!(percent));
    }
    if let Some(filename) = filename {
        progress.insert("filename".to_string(), json!(filename));
    }
    if let Some(error) = error {
        progress.insert("error".to_string(), json!(error));
    }
    json!({ "success": true, "progress": progress })
}
