//! Invocation configuration.
//!
//! Everything the core needs is assembled once from flags and environment
//! into an immutable [`Config`]. Nothing is read from or written to disk.

use std::fmt;
use std::time::Duration;

use reqwest::Url;

use crate::error::{ApiError, ApiResult};

/// Path prefix of every appliance endpoint.
pub const API_PREFIX: &str = "discovery";

/// URL scheme used to reach the appliance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Scheme {
    #[default]
    Https,
    Http,
}

impl Scheme {
    fn as_str(self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }
}

/// TLS certificate handling.
///
/// Appliances ship with self-signed certificates, so verification is off
/// unless explicitly requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsMode {
    #[default]
    Insecure,
    Verify,
}

/// Base address of the appliance API.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    /// Build an endpoint from a bare host (`appliance.example.com[:port]`).
    pub fn parse(host: &str, scheme: Scheme) -> ApiResult<Self> {
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(ApiError::usage("appliance URL is required (--url)"));
        }
        if host.contains("://") {
            return Err(ApiError::usage(format!(
                "'{host}' must be a bare host such as appliance.example.com, without the scheme"
            )));
        }

        let base = Url::parse(&format!("{}://{}/{}/", scheme.as_str(), host, API_PREFIX))
            .map_err(|e| ApiError::usage(format!("invalid appliance URL '{host}': {e}")))?;

        Ok(Self { base })
    }

    /// Resolve a path (optionally with a query string) below `/discovery/`.
    pub fn url(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::usage(format!("invalid request path '{path}': {e}")))
    }

    /// Host (and port) of the appliance.
    pub fn host(&self) -> &str {
        self.base.host_str().unwrap_or_default()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)
    }
}

/// Operator credentials. Used once to mint a session token.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> ApiResult<Self> {
        let username = username.into();
        let password = password.into();
        if username.is_empty() {
            return Err(ApiError::usage("appliance username is required (--username)"));
        }
        if password.is_empty() {
            return Err(ApiError::usage("appliance password is required (--password)"));
        }
        Ok(Self { username, password })
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bounds for the task polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between two polls of the same task.
    pub interval: Duration,

    /// Maximum number of polls before giving up.
    pub max_attempts: u32,

    /// Overall deadline for one task.
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 900,
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32, timeout: Duration) -> ApiResult<Self> {
        if max_attempts == 0 {
            return Err(ApiError::usage("poll attempts must be at least 1"));
        }
        if timeout.is_zero() {
            return Err(ApiError::usage("poll timeout must be greater than zero"));
        }
        Ok(Self {
            interval,
            max_attempts,
            timeout,
        })
    }
}

/// Immutable configuration for one CLI invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: Endpoint,
    pub credentials: Credentials,
    pub tls: TlsMode,
    pub poll: PollPolicy,
}

impl Config {
    pub fn new(
        endpoint: Endpoint,
        credentials: Credentials,
        tls: TlsMode,
        poll: PollPolicy,
    ) -> Self {
        Self {
            endpoint,
            credentials,
            tls,
            poll,
        }
    }
}
