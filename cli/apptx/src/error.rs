//! Error kinds surfaced by the core.

use thiserror::Error;

use crate::models::ResourceKind;
use crate::tasks::TaskStatus;

/// Errors returned by transport, lookup and orchestration code.
///
/// Internal components never terminate the process; the binary maps these
/// to exit codes through [`ApiError::exit_code`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Usage(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to encode the request payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to parse the response body of {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Authentication failed (status {status}): {reason}")]
    Authentication { status: u16, reason: String },

    #[error("Failed to {action}. Response Code: {status}")]
    Remote { status: u16, action: String },

    #[error("Failed to {action}: task {task_id} finished with status {status}")]
    TaskFailed {
        task_id: String,
        status: TaskStatus,
        action: String,
    },

    #[error("Cannot complete the operation as the {kind} does not exist: {ident}")]
    LookupMiss { kind: ResourceKind, ident: String },

    #[error("{kind} '{ident}' is already registered")]
    AlreadyExists { kind: ResourceKind, ident: String },

    #[error("Task {task_id} did not finish after {attempts} polls")]
    PollTimeout { task_id: String, attempts: u32 },

    #[error("Stopped waiting for task {task_id}")]
    Cancelled { task_id: String },

    #[error("Interrupted before the request to {action} was sent")]
    Interrupted { action: String },

    #[error("{failed} of {total} {what} failed")]
    Partial {
        failed: usize,
        total: usize,
        what: String,
    },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            context: context.into(),
            source,
        }
    }

    pub fn remote(status: u16, action: impl Into<String>) -> Self {
        Self::Remote {
            status,
            action: action.into(),
        }
    }

    pub fn lookup_miss(kind: ResourceKind, ident: impl Into<String>) -> Self {
        Self::LookupMiss {
            kind,
            ident: ident.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            _ => 1,
        }
    }

    /// Short hint shown under the error message, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Usage(_) => Some("Run with --help to see the available flags."),
            Self::Authentication { .. } => {
                Some("Check --username/--password (or APPTX_USERNAME/APPTX_PASSWORD).")
            }
            Self::Transport(e) if e.is_connect() || e.is_timeout() => {
                Some("Check that the appliance is reachable at the given --url.")
            }
            Self::LookupMiss {
                kind: ResourceKind::ServiceAccount,
                ..
            } => Some("Register it first with `apptx service-account register`."),
            Self::LookupMiss {
                kind: ResourceKind::VCenter,
                ..
            } => Some("Register it first with `apptx vcenter register`."),
            Self::PollTimeout { .. } | Self::Cancelled { .. } => Some(
                "The task may still be running on the appliance; raise --poll-timeout-secs to wait longer.",
            ),
            Self::Interrupted { .. } => Some("Nothing was changed on the appliance."),
            _ => None,
        }
    }
}
