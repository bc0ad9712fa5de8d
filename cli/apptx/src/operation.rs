//! Generic mutate-then-monitor orchestration.
//!
//! Every mutating operation has the same tail: send the request, and if the
//! appliance answers `202 Accepted`, follow the returned task to a terminal
//! state. Any other status is final on its own.

use std::fmt;

use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use crate::tasks::TaskEnvelope;

/// Successful result of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    /// The appliance answered synchronously with a success status.
    Completed { status: u16 },

    /// A resource was created and assigned this id.
    Created { id: String },

    /// An asynchronous task finished with `SUCCESS`.
    TaskSucceeded { task_id: String },

    /// Nothing had to change (e.g. the resource already existed).
    Unchanged { reason: String },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { status } => write!(f, "completed with status {status}"),
            Self::Created { id } => write!(f, "created with id {id}"),
            Self::TaskSucceeded { task_id } => write!(f, "task {task_id} finished with SUCCESS"),
            Self::Unchanged { reason } => f.write_str(reason),
        }
    }
}

/// A mutating request and the action it performs, for messages.
pub struct Mutation<'a, B: Serialize + ?Sized = ()> {
    method: Method,
    url: Url,
    body: Option<&'a B>,
    action: String,
}

impl<'a> Mutation<'a, ()> {
    /// A request without a body.
    pub fn new(method: Method, url: Url, action: impl Into<String>) -> Self {
        Self {
            method,
            url,
            body: None,
            action: action.into(),
        }
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(self, body: &'a B) -> Mutation<'a, B> {
        Mutation {
            method: self.method,
            url: self.url,
            body: Some(body),
            action: self.action,
        }
    }
}

/// `200 OK` and `204 No Content`.
fn is_synchronous_success(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::NO_CONTENT
}

/// Send the mutation and, for `202 Accepted`, wait for its task.
///
/// Nothing is sent once the session has been cancelled.
pub async fn run_mutation<B: Serialize + ?Sized>(
    session: &Session,
    mutation: Mutation<'_, B>,
) -> ApiResult<Outcome> {
    let Mutation {
        method,
        url,
        body,
        action,
    } = mutation;

    if session.is_cancelled() {
        warn!(action = %action, "Interrupted; not sending the request");
        return Err(ApiError::Interrupted { action });
    }

    let response = session.client().request(method, url, body).await?;
    let status = response.status;

    if status == StatusCode::ACCEPTED {
        let envelope: TaskEnvelope = response.json(&action)?;
        info!(task_id = %envelope.task_id, action = %action, "Submitted the request");

        let terminal = session.monitor().wait(&envelope.task_id).await?;
        if terminal.is_success() {
            info!(task_id = %envelope.task_id, action = %action, "Task succeeded");
            return Ok(Outcome::TaskSucceeded {
                task_id: envelope.task_id,
            });
        }

        warn!(task_id = %envelope.task_id, status = %terminal, action = %action, "Task failed");
        return Err(ApiError::TaskFailed {
            task_id: envelope.task_id,
            status: terminal,
            action,
        });
    }

    if is_synchronous_success(status) {
        info!(status = status.as_u16(), action = %action, "Request completed");
        return Ok(Outcome::Completed {
            status: status.as_u16(),
        });
    }

    warn!(
        status = status.as_u16(),
        action = %action,
        body = %response.text(),
        "Request rejected"
    );
    Err(ApiError::remote(status.as_u16(), action))
}
