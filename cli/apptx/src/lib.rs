//! apptx - client library for the application transformer discovery appliance.
//!
//! The appliance exposes a REST API under `https://<host>/discovery/`. This
//! crate wraps it in the pieces the `apptx` binary composes:
//!
//! - **Transport** ([`client`]): authenticated JSON requests, raw status + body
//! - **Session** ([`session`]): credential exchange for a bearer token
//! - **Lookup** ([`lookup`]): alias/name → UUID resolution over list endpoints
//! - **Task monitor** ([`tasks`]): bounded polling of asynchronous tasks
//! - **Operations** ([`operation`], [`services`]): find → mutate → monitor flows

pub mod client;
pub mod config;
pub mod error;
pub mod lookup;
pub mod models;
pub mod operation;
pub mod services;
pub mod session;
pub mod tasks;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use operation::Outcome;
pub use session::Session;
