//! Session establishment.
//!
//! Credentials are exchanged for a bearer token once per invocation. The
//! token is never refreshed or stored.

use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use crate::client::ApiClient;
use crate::config::{Config, Credentials, PollPolicy};
use crate::error::{ApiError, ApiResult};
use crate::tasks::{self, TaskMonitor};

/// Path of the login endpoint.
const SESSION_PATH: &str = "session";

/// Opaque bearer token issued by the appliance.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Login response. The appliance puts the token in a `Set-Cookie` field;
/// some builds emit a plain `token` instead.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "Set-Cookie", default)]
    pub session: Option<String>,

    #[serde(default)]
    pub token: Option<String>,
}

impl AuthResponse {
    /// The first non-empty token field.
    pub fn into_token(self) -> Option<SessionToken> {
        self.session
            .filter(|t| !t.is_empty())
            .or(self.token.filter(|t| !t.is_empty()))
            .map(SessionToken)
    }
}

/// Exchange credentials for a session token.
pub async fn authenticate(client: &ApiClient, credentials: &Credentials) -> ApiResult<SessionToken> {
    let url = client.url(SESSION_PATH)?;
    let request = AuthRequest {
        username: &credentials.username,
        password: credentials.password(),
    };

    let response = client.request(Method::POST, url, Some(&request)).await?;
    if !response.status.is_success() {
        return Err(ApiError::Authentication {
            status: response.status.as_u16(),
            reason: "the appliance rejected the credentials".to_string(),
        });
    }

    let auth: AuthResponse = response.json("the login response")?;
    auth.into_token().ok_or_else(|| ApiError::Authentication {
        status: response.status.as_u16(),
        reason: "the login response carried no token".to_string(),
    })
}

/// An authenticated connection to the appliance plus the polling bounds
/// shared by every operation of this invocation.
#[derive(Debug)]
pub struct Session {
    client: ApiClient,
    poll: PollPolicy,
    cancel: Option<watch::Receiver<bool>>,
}

impl Session {
    /// Log in and return a ready session.
    pub async fn open(config: &Config) -> ApiResult<Self> {
        let client = ApiClient::new(config)?;
        let token = authenticate(&client, &config.credentials).await?;
        info!(
            appliance = %config.endpoint.host(),
            username = %config.credentials.username,
            "Authenticated"
        );

        Ok(Self {
            client: client.with_token(token),
            poll: config.poll,
            cancel: None,
        })
    }

    /// Abort task polling once the channel carries `true`.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        tasks::is_cancelled(&self.cancel)
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// A task monitor bound to this session.
    pub fn monitor(&self) -> TaskMonitor<'_> {
        let monitor = TaskMonitor::new(&self.client, self.poll);
        match &self.cancel {
            Some(cancel) => monitor.with_cancellation(cancel.clone()),
            None => monitor,
        }
    }
}
