//! Asynchronous task monitoring.
//!
//! Long-running operations answer `202 Accepted` with a task id. The
//! monitor polls `tasks/{id}` until the status leaves the transient set
//! {`NOT_STARTED`, `UNKNOWN`, `IN_PROGRESS`} and returns that status
//! verbatim. `SUCCESS` is the only successful terminal state.
//!
//! Polling is bounded by [`PollPolicy`] and can be interrupted through a
//! watch channel. Both also cut short a poll that is still in flight.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::config::PollPolicy;
use crate::error::{ApiError, ApiResult};

const TASKS_PATH: &str = "tasks";

/// Status of an appliance task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    NotStarted,
    Unknown,
    InProgress,
    Success,
    /// Any other value; always terminal and never successful.
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::Unknown => "UNKNOWN",
            Self::InProgress => "IN_PROGRESS",
            Self::Success => "SUCCESS",
            Self::Other(value) => value,
        }
    }

    /// Whether the task may still change state.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotStarted | Self::Unknown | Self::InProgress)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "NOT_STARTED" => Self::NotStarted,
            "UNKNOWN" => Self::Unknown,
            "IN_PROGRESS" => Self::InProgress,
            "SUCCESS" => Self::Success,
            _ => Self::Other(value),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a `202 Accepted` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
struct TaskResource {
    status: TaskStatus,
}

/// Polls one task at a time until it reaches a terminal state.
#[derive(Debug)]
pub struct TaskMonitor<'a> {
    client: &'a ApiClient,
    policy: PollPolicy,
    cancel: Option<watch::Receiver<bool>>,
}

impl<'a> TaskMonitor<'a> {
    pub fn new(client: &'a ApiClient, policy: PollPolicy) -> Self {
        Self {
            client,
            policy,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Poll until the task leaves the transient states and return the
    /// terminal status.
    pub async fn wait(&self, task_id: &str) -> ApiResult<TaskStatus> {
        let deadline = Instant::now() + self.policy.timeout;
        let mut cancel = self.cancel.clone();

        for attempt in 1..=self.policy.max_attempts {
            if is_cancelled(&cancel) {
                return Err(ApiError::Cancelled {
                    task_id: task_id.to_string(),
                });
            }

            let status = tokio::select! {
                polled = tokio::time::timeout_at(deadline, self.poll(task_id)) => match polled {
                    Ok(status) => status?,
                    Err(_) => {
                        warn!(task_id, attempt, "Task poll did not answer before the deadline");
                        return Err(ApiError::PollTimeout {
                            task_id: task_id.to_string(),
                            attempts: attempt,
                        });
                    }
                },
                _ = wait_for_cancel(&mut cancel) => {
                    return Err(ApiError::Cancelled {
                        task_id: task_id.to_string(),
                    });
                }
            };
            info!(task_id, attempt, status = %status, "Task status");

            if !status.is_transient() {
                return Ok(status);
            }

            if attempt == self.policy.max_attempts
                || Instant::now() + self.policy.interval > deadline
            {
                return Err(ApiError::PollTimeout {
                    task_id: task_id.to_string(),
                    attempts: attempt,
                });
            }

            tokio::select! {
                _ = tokio::time::sleep(self.policy.interval) => {}
                _ = wait_for_cancel(&mut cancel) => {
                    return Err(ApiError::Cancelled {
                        task_id: task_id.to_string(),
                    });
                }
            }
        }

        Err(ApiError::PollTimeout {
            task_id: task_id.to_string(),
            attempts: self.policy.max_attempts,
        })
    }

    /// Fetch the current status once.
    pub async fn poll(&self, task_id: &str) -> ApiResult<TaskStatus> {
        let url = self.client.url(&format!("{TASKS_PATH}/{task_id}"))?;
        debug!(task_id, "Polling task");

        let response = self.client.get(url).await?;
        let task: TaskResource =
            response.success_json(&format!("fetch the status of task {task_id}"))?;
        Ok(task.status)
    }
}

pub(crate) fn is_cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
    cancel.as_ref().is_some_and(|rx| *rx.borrow())
}

/// Resolves once cancellation is signalled; pends forever otherwise.
async fn wait_for_cancel(cancel: &mut Option<watch::Receiver<bool>>) {
    if let Some(rx) = cancel {
        if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
            return;
        }
    }
    std::future::pending::<()>().await
}
