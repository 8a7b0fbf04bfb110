//! Remote task service collaborator
//!
//! The orchestrator consumes the service through the [`TaskService`] trait;
//! [`HttpTaskService`] is the reqwest implementation of the service's HTTP
//! contract:
//!
//! - `POST /api/download` with `{url, format}` starts a conversion and
//!   returns `{success, task_id?, error?}`
//! - `GET /api/progress/{task_id}` returns the latest progress report
//! - `POST /api/info` returns source metadata without starting a conversion
//! - `GET /api/file/{filename}` serves the finished artifact (URL built via
//!   [`HttpTaskService::artifact_url`], fetched by the consumer after gate
//!   dismissal)
//!
//! `success: false` or a non-2xx response is a failure at the corresponding
//! stage, surfacing the body's `error` when present.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{Format, ProgressSnapshot, ProgressStatus, TaskId, VideoInfo};

/// Remote conversion service consumed by the orchestrator
///
/// A trait seam so the service can be swapped per target environment; the
/// orchestrator never assumes a transport.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Submit a conversion job. Issues exactly one outbound request and
    /// yields the accepted task's identifier.
    async fn submit(&self, url: &str, format: Format) -> Result<TaskId>;

    /// Query progress for a task. Any error from a single query is treated
    /// as a transient miss by the poller.
    async fn progress(&self, id: &TaskId) -> Result<ProgressSnapshot>;

    /// Fetch source metadata without starting a conversion
    async fn video_info(&self, url: &str) -> Result<VideoInfo>;

    /// Absolute URL for retrieving a finished artifact
    fn artifact_url(&self, filename: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProgressResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    progress: Option<ProgressPayload>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProgressPayload {
    status: ProgressStatus,
    #[serde(default)]
    progress: Option<f32>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    info: VideoInfo,
}

/// HTTP implementation of [`TaskService`]
pub struct HttpTaskService {
    client: reqwest::Client,
    base: Url,
}

impl HttpTaskService {
    /// Build a service client from the orchestrator config
    pub fn new(config: &Config) -> Result<Self> {
        // Normalize to a trailing slash so Url::join keeps any path prefix.
        let mut base_url = config.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base = Url::parse(&base_url)?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }
}

#[async_trait]
impl TaskService for HttpTaskService {
    async fn submit(&self, url: &str, format: Format) -> Result<TaskId> {
        let endpoint = self.endpoint("api/download")?;
        let response = self
            .client
            .post(endpoint)
            .json(&serde_json::json!({ "url": url, "format": format.as_str() }))
            .send()
            .await?;

        let status = response.status();
        let body: SubmitResponse = match response.json().await {
            Ok(body) => body,
            // Rejections may carry a non-JSON body; fall back to a generic
            // message rather than a parse error.
            Err(_) if !status.is_success() => {
                return Err(Error::Submission {
                    message: format!("task service returned {status}"),
                });
            }
            Err(e) => return Err(Error::Network(e)),
        };

        if status.is_success() && body.success {
            match body.task_id {
                Some(id) => Ok(TaskId::new(id)),
                None => Err(Error::UnexpectedResponse(
                    "submission accepted without a task_id".to_string(),
                )),
            }
        } else {
            Err(Error::Submission {
                message: body
                    .error
                    .unwrap_or_else(|| format!("task service returned {status}")),
            })
        }
    }

    async fn progress(&self, id: &TaskId) -> Result<ProgressSnapshot> {
        let endpoint = self.endpoint(&format!("api/progress/{id}"))?;
        let response = self.client.get(endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UnexpectedResponse(format!(
                "progress query returned {status}"
            )));
        }

        let body: ProgressResponse = response.json().await?;
        if !body.success {
            return Err(Error::UnexpectedResponse(body.error.unwrap_or_else(|| {
                "progress query reported failure".to_string()
            })));
        }
        let payload = body.progress.ok_or_else(|| {
            Error::UnexpectedResponse("progress query succeeded without a payload".to_string())
        })?;

        Ok(ProgressSnapshot {
            task_id: id.clone(),
            status: payload.status,
            percent: payload.progress.unwrap_or(0.0),
            filename: payload.filename,
            error: payload.error,
        })
    }

    async fn video_info(&self, url: &str) -> Result<VideoInfo> {
        let endpoint = self.endpoint("api/info")?;
        let response = self
            .client
            .post(endpoint)
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;

        let status = response.status();
        let body: InfoResponse = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(Error::VideoInfo {
                    message: format!("task service returned {status}"),
                });
            }
            Err(e) => return Err(Error::Network(e)),
        };

        if status.is_success() && body.success {
            Ok(body.info)
        } else {
            Err(Error::VideoInfo {
                message: body
                    .error
                    .unwrap_or_else(|| format!("task service returned {status}")),
            })
        }
    }

    fn artifact_url(&self, filename: &str) -> Result<String> {
        Ok(self.endpoint(&format!("api/file/{filename}"))?.to_string())
    }
}
