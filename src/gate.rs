//! Completion gate collaborator contract
//!
//! A gate is an external step (typically an interstitial) that must be
//! acknowledged by the user before the finished artifact is released. The
//! orchestrator only requires this one capability: present the gate and
//! resolve exactly once when it has been dismissed. How the gate renders is
//! entirely up to the implementation.

use async_trait::async_trait;

use crate::error::GateError;
use crate::types::TaskId;

/// External step acknowledged before artifact delivery
///
/// Injected into the orchestrator so the gate implementation (or its
/// absence) is swappable per target environment.
#[async_trait]
pub trait CompletionGate: Send + Sync {
    /// Present the gate for a task; resolves exactly once when the user has
    /// dismissed it.
    ///
    /// An `Err` means the gate could not be presented at all. The
    /// orchestrator recovers by delivering after the configured fallback
    /// delay; a gate failure never blocks delivery indefinitely.
    async fn present(&self, task: &TaskId) -> Result<(), GateError>;
}

/// Gate that resolves immediately, for hosts with no interstitial step
pub struct NoopGate;

#[async_trait]
impl CompletionGate for NoopGate {
    async fn present(&self, _task: &TaskId) -> Result<(), GateError> {
        Ok(())
    }
}
