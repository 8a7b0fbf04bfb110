//! # clipfetch
//!
//! Client-side orchestrator for asynchronous remote media conversion jobs.
//!
//! clipfetch submits a conversion job to a remote task service, tracks its
//! progress by polling on a fixed interval, and sequences a gated completion
//! step (typically an interstitial the user must dismiss) before releasing
//! the finished artifact reference through a delivery hook.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Injected collaborators** - The task service and the completion gate
//!   are trait objects handed to the orchestrator, swappable per environment
//! - **Event-driven observation** - Consumers subscribe to lifecycle events
//!   and watch channels; observation can never alter the lifecycle
//! - **Single task at a time** - A second request while any task is in
//!   flight is rejected without touching the network
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use clipfetch::{Config, DeliveryHook, Format, HttpTaskService, NoopGate, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         base_url: "https://convert.example.com".to_string(),
//!         ..Default::default()
//!     };
//!
//!     let service = Arc::new(HttpTaskService::new(&config)?);
//!     let delivery: DeliveryHook = Arc::new(|id, filename| {
//!         println!("task {id} produced {filename}");
//!     });
//!     let orchestrator = Orchestrator::new(config, service, Arc::new(NoopGate), delivery);
//!
//!     // Subscribe to events
//!     let mut events = orchestrator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     orchestrator
//!         .request_download("https://www.youtube.com/watch?v=jNQXAC9IVRw", Format::Mp3)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Completion gate collaborator contract
pub mod gate;
/// Task lifecycle state machine
pub mod lifecycle;
/// Root orchestrator wiring
pub mod orchestrator;
/// Fixed-interval progress polling
pub mod poller;
/// Remote task service collaborator
pub mod service;
/// Core types and events
pub mod types;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, GateError, Result};
pub use gate::{CompletionGate, NoopGate};
pub use lifecycle::{Lifecycle, SnapshotOutcome};
pub use orchestrator::{DeliveryHook, Orchestrator};
pub use poller::{ProgressPoller, SnapshotHandler, TerminalHandler};
pub use service::{HttpTaskService, TaskService};
pub use types::{
    Event, Format, ProgressSnapshot, ProgressStatus, Task, TaskId, TaskState, VideoInfo,
};
