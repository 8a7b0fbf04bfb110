//! Core types for clipfetch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier for a conversion task, unique per submission
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Requested output format for a conversion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Audio-only MP3 extraction
    Mp3,
    /// MP4 video
    Mp4,
}

impl Format {
    /// Wire name of the format as the task service expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Mp3 => "mp3",
            Format::Mp4 => "mp4",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Format {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp3" => Ok(Format::Mp3),
            "mp4" => Ok(Format::Mp4),
            other => Err(crate::error::Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Lifecycle state of the active task
///
/// Transitions are monotonic forward; only `Polling` self-loops while
/// non-terminal snapshots arrive. `Completed` and `Failed` are terminal for
/// their task and the orchestrator resets to `Idle` before accepting a new
/// submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// No task active; submissions are accepted
    #[default]
    Idle,
    /// Submission request in flight
    Submitting,
    /// Task accepted; progress is being polled
    Polling,
    /// Conversion finished; gate presented, delivery pending dismissal
    AwaitingGate,
    /// Artifact delivered
    Completed,
    /// Task failed with a server-reported error
    Failed,
}

impl TaskState {
    /// Whether this state is terminal for the active task
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

/// Status tag reported by a progress query
///
/// The service reports `starting`, `downloading`, `finished` or `error`.
/// Intermediate tags it emits while post-processing (`processing`,
/// `completed`) decode to [`ProgressStatus::Other`] and are treated as
/// in-progress; only `finished` and `error` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    /// Conversion is initializing
    Starting,
    /// Conversion is downloading source media
    Downloading,
    /// Conversion finished; an artifact is available
    Finished,
    /// Conversion failed
    Error,
    /// Unrecognized in-progress tag
    #[serde(other)]
    Other,
}

impl ProgressStatus {
    /// Whether this status ends polling
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressStatus::Finished | ProgressStatus::Error)
    }
}

/// The most recently received progress report for a task
///
/// Never persisted; only the latest snapshot is retained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Task this snapshot belongs to
    pub task_id: TaskId,

    /// Reported status tag
    pub status: ProgressStatus,

    /// Progress percentage (0.0 to 100.0); absent on the wire means 0
    pub percent: f32,

    /// Artifact filename, present once the status is `finished`
    pub filename: Option<String>,

    /// Error description, present when the status is `error`
    pub error: Option<String>,
}

impl ProgressSnapshot {
    /// Whether this snapshot ends polling for its task
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One user-initiated conversion job, tracked end-to-end by the orchestrator
///
/// Immutable once created; owned exclusively by the orchestrator for its
/// lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier returned by the task service
    pub id: TaskId,

    /// Source media URL submitted for conversion
    pub source_url: String,

    /// Requested output format
    pub format: Format,

    /// When the task was accepted
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a task record for an accepted submission
    pub fn new(id: TaskId, source_url: impl Into<String>, format: Format) -> Self {
        Self {
            id,
            source_url: source_url.into(),
            format,
            created_at: Utc::now(),
        }
    }
}

/// Source media metadata reported by the task service
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Media title
    #[serde(default)]
    pub title: String,

    /// Duration in seconds
    #[serde(default)]
    pub duration: u64,

    /// Thumbnail image URL
    #[serde(default)]
    pub thumbnail: String,

    /// Uploader or channel name
    #[serde(default)]
    pub uploader: String,

    /// View count
    #[serde(default)]
    pub view_count: u64,
}

/// Event emitted during the task lifecycle
///
/// Consumers subscribe through [`crate::Orchestrator::subscribe`] for
/// observability; events never drive the lifecycle themselves.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Submission accepted; polling started
    Submitted {
        /// Task ID
        id: TaskId,
    },

    /// Non-terminal progress snapshot received
    Progress {
        /// Task ID
        id: TaskId,
        /// Reported status tag
        status: ProgressStatus,
        /// Progress percentage (0.0 to 100.0)
        percent: f32,
    },

    /// Conversion finished; gate presented before delivery
    AwaitingGate {
        /// Task ID
        id: TaskId,
        /// Artifact filename held behind the gate
        filename: String,
    },

    /// Gate failed to present; delivery proceeds after the fallback delay
    GateFallback {
        /// Task ID
        id: TaskId,
        /// Gate error description
        error: String,
    },

    /// Artifact reference released to the delivery hook
    Delivered {
        /// Task ID
        id: TaskId,
        /// Artifact filename
        filename: String,
    },

    /// Task failed with a server-reported error
    TaskFailed {
        /// Task ID
        id: TaskId,
        /// Error message surfaced to the user
        error: String,
    },

    /// Submission was rejected or failed
    SubmissionFailed {
        /// Error message surfaced to the user
        error: String,
    },

    /// Active task cancelled before completion
    Cancelled {
        /// Task ID
        id: TaskId,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // --- ProgressStatus wire decoding ---

    #[test]
    fn progress_status_decodes_known_tags() {
        let cases = [
            ("\"starting\"", ProgressStatus::Starting),
            ("\"downloading\"", ProgressStatus::Downloading),
            ("\"finished\"", ProgressStatus::Finished),
            ("\"error\"", ProgressStatus::Error),
        ];

        for (json, expected) in cases {
            let status: ProgressStatus = serde_json::from_str(json).unwrap();
            assert_eq!(status, expected, "{json} should decode to {expected:?}");
        }
    }

    #[test]
    fn progress_status_decodes_unknown_tags_as_other() {
        // The service transiently reports tags like "processing" while
        // post-processing; they must not end polling.
        for json in ["\"processing\"", "\"completed\"", "\"not_found\""] {
            let status: ProgressStatus = serde_json::from_str(json).unwrap();
            assert_eq!(
                status,
                ProgressStatus::Other,
                "{json} must decode to Other, not fail or map to a terminal tag"
            );
            assert!(
                !status.is_terminal(),
                "unknown tag {json} must be treated as in-progress"
            );
        }
    }

    #[test]
    fn only_finished_and_error_are_terminal() {
        assert!(ProgressStatus::Finished.is_terminal());
        assert!(ProgressStatus::Error.is_terminal());
        assert!(!ProgressStatus::Starting.is_terminal());
        assert!(!ProgressStatus::Downloading.is_terminal());
        assert!(!ProgressStatus::Other.is_terminal());
    }

    // --- TaskState ---

    #[test]
    fn task_state_defaults_to_idle() {
        assert_eq!(TaskState::default(), TaskState::Idle);
    }

    #[test]
    fn task_state_terminal_variants() {
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::Idle.is_terminal());
        assert!(!TaskState::Submitting.is_terminal());
        assert!(!TaskState::Polling.is_terminal());
        assert!(!TaskState::AwaitingGate.is_terminal());
    }

    // --- Format ---

    #[test]
    fn format_round_trips_through_str() {
        assert_eq!(Format::from_str("mp3").unwrap(), Format::Mp3);
        assert_eq!(Format::from_str("MP4").unwrap(), Format::Mp4);
        assert_eq!(Format::Mp3.as_str(), "mp3");
        assert_eq!(Format::Mp4.to_string(), "mp4");
    }

    #[test]
    fn format_rejects_unadvertised_values() {
        let err = Format::from_str("flac").unwrap_err();
        assert!(
            err.to_string().contains("flac"),
            "error should name the rejected format, got: {err}"
        );
    }

    // --- TaskId ---

    #[test]
    fn task_id_display_and_serde_are_transparent() {
        let id = TaskId::new("download_1727000000");
        assert_eq!(id.to_string(), "download_1727000000");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"download_1727000000\"",
            "TaskId must serialize as a bare string"
        );
    }

    // --- Event wire shape ---

    #[test]
    fn event_serializes_with_snake_case_type_tag() {
        let event = Event::Delivered {
            id: TaskId::new("t1"),
            filename: "video.mp4".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "delivered");
        assert_eq!(json["filename"], "video.mp4");
    }
}
