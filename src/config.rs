//! Configuration types for clipfetch

use crate::types::Format;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Orchestrator configuration
///
/// Every field has a sensible default; `Config::default()` targets a task
/// service on its default local bind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the remote task service (default: "http://127.0.0.1:5000").
    ///
    /// Endpoint paths (`api/download`, `api/progress/{id}`, `api/file/{name}`)
    /// are joined onto this root.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Interval between progress queries (default: 1s)
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Per-request HTTP timeout (default: 30s)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// How long to wait before delivering when the gate fails to present
    /// (default: 5s).
    ///
    /// Guarantees forward progress: a completed artifact is never
    /// indefinitely blocked by a broken gate.
    #[serde(default = "default_gate_fallback_delay")]
    pub gate_fallback_delay: Duration,

    /// Formats the task service advertises (default: mp3, mp4).
    ///
    /// Submissions for other formats are rejected without contacting the
    /// service.
    #[serde(default = "default_formats")]
    pub formats: Vec<Format>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval: default_poll_interval(),
            request_timeout: default_request_timeout(),
            gate_fallback_delay: default_gate_fallback_delay(),
            formats: default_formats(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_gate_fallback_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_formats() -> Vec<Format> {
    vec![Format::Mp3, Format::Mp4]
}
