//! CLI commands.

mod applications;
mod components;
mod global_default;
mod service_account;
mod vcenter;
mod virtual_machines;
mod vrni;

use std::time::Duration;

use anyhow::Result;
use apptx::config::{Credentials, Endpoint, PollPolicy, Scheme, TlsMode};
use apptx::{Config, Session};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tokio::sync::watch;
use tracing::warn;

use crate::output::OutputFormat;

/// apptx - drive VM discovery and application transformation on an
/// appliance.
#[derive(Debug, Parser)]
#[command(name = "apptx")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Appliance host, ex: appliance.example.com (no scheme).
    #[arg(long, global = true, env = "APPTX_URL")]
    url: Option<String>,

    /// Appliance admin username.
    #[arg(long, global = true, env = "APPTX_USERNAME")]
    username: Option<String>,

    /// Appliance admin password.
    #[arg(long, global = true, env = "APPTX_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Output format for listings and results.
    #[arg(long, global = true, value_enum, default_value = "table")]
    output_format: OutputFormat,

    /// Verify the appliance TLS certificate.
    #[arg(long, global = true, env = "APPTX_SECURE")]
    secure: bool,

    #[arg(long, global = true, value_enum, default_value = "https", hide = true)]
    scheme: Scheme,

    /// Seconds between two polls of a running task.
    #[arg(long, global = true, env = "APPTX_POLL_INTERVAL_SECS", default_value = "2")]
    poll_interval_secs: u64,

    /// Maximum number of polls per task.
    #[arg(long, global = true, env = "APPTX_POLL_MAX_ATTEMPTS", default_value = "900")]
    poll_max_attempts: u32,

    /// Give up waiting for a task after this many seconds.
    #[arg(long, global = true, env = "APPTX_POLL_TIMEOUT_SECS", default_value = "1800")]
    poll_timeout_secs: u64,

    /// Increase log verbosity (-v info, -vv debug). APPTX_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log line format on stderr.
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage service accounts.
    ServiceAccount(service_account::ServiceAccountCommand),

    /// Assign or reset global default service accounts.
    GlobalDefault(global_default::GlobalDefaultCommand),

    /// Manage vCenters and run discovery on them.
    Vcenter(vcenter::VCenterCommand),

    /// Manage vRNI instances.
    Vrni(vrni::VrniCommand),

    /// List and introspect virtual machines.
    VirtualMachines(virtual_machines::VirtualMachinesCommand),

    /// List discovered applications.
    Applications(applications::ApplicationsCommand),

    /// List discovered components.
    Components(components::ComponentsCommand),
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let ctx = CommandContext {
            format: self.output_format,
            connection: ConnectionArgs {
                url: self.url,
                username: self.username,
                password: self.password,
                secure: self.secure,
                scheme: self.scheme,
                poll_interval_secs: self.poll_interval_secs,
                poll_max_attempts: self.poll_max_attempts,
                poll_timeout_secs: self.poll_timeout_secs,
            },
        };

        match self.command {
            Commands::ServiceAccount(cmd) => cmd.run(ctx).await,
            Commands::GlobalDefault(cmd) => cmd.run(ctx).await,
            Commands::Vcenter(cmd) => cmd.run(ctx).await,
            Commands::Vrni(cmd) => cmd.run(ctx).await,
            Commands::VirtualMachines(cmd) => cmd.run(ctx).await,
            Commands::Applications(cmd) => cmd.run(ctx).await,
            Commands::Components(cmd) => cmd.run(ctx).await,
        }
    }
}

#[derive(Debug)]
struct ConnectionArgs {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    secure: bool,
    scheme: Scheme,
    poll_interval_secs: u64,
    poll_max_attempts: u32,
    poll_timeout_secs: u64,
}

impl ConnectionArgs {
    fn config(&self) -> Result<Config> {
        let endpoint = Endpoint::parse(self.url.as_deref().unwrap_or_default(), self.scheme)?;
        let credentials = Credentials::new(
            self.username.clone().unwrap_or_default(),
            self.password.clone().unwrap_or_default(),
        )?;
        let tls = if self.secure {
            TlsMode::Verify
        } else {
            TlsMode::Insecure
        };
        let poll = PollPolicy::new(
            Duration::from_secs(self.poll_interval_secs),
            self.poll_max_attempts,
            Duration::from_secs(self.poll_timeout_secs),
        )?;

        Ok(Config::new(endpoint, credentials, tls, poll))
    }
}

/// Shared command context.
pub struct CommandContext {
    pub format: OutputFormat,
    connection: ConnectionArgs,
}

impl CommandContext {
    /// Log in to the appliance. After Ctrl-C no further mutation is sent and
    /// a running task wait stops.
    pub async fn session(&self) -> Result<Session> {
        let config = self.connection.config()?;
        let session = Session::open(&config).await?;
        Ok(session.with_cancellation(interrupt_channel()))
    }
}

fn interrupt_channel() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; stopping before the next request");
            let _ = tx.send(true);
        }
    });
    rx
}
