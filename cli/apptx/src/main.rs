//! apptx - CLI for the application transformer discovery appliance.
//!
//! Registers service accounts, vCenters and vRNI instances, runs discovery
//! scans and lists what the appliance found.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

use commands::{Cli, LogFormat};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    if let Err(e) = cli.run().await {
        output::print_error(&e);
        std::process::exit(output::exit_code(&e));
    }

    Ok(())
}

/// Logs go to stderr so listings on stdout stay machine readable.
fn init_tracing(verbose: u8, format: LogFormat) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_env("APPTX_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    let json = format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}
