//! Application commands.

use anyhow::Result;
use apptx::services::applications;
use clap::{Args, Subcommand};

use crate::output::print_output;

use super::CommandContext;

/// Application commands.
#[derive(Debug, Args)]
pub struct ApplicationsCommand {
    #[command(subcommand)]
    command: ApplicationsSubcommand,
}

#[derive(Debug, Subcommand)]
enum ApplicationsSubcommand {
    /// List applications, one row per component.
    List,
}

impl ApplicationsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            ApplicationsSubcommand::List => {
                let session = ctx.session().await?;
                let apps = applications::list(&session).await?;
                print_output(&applications::component_rows(&apps), ctx.format)
            }
        }
    }
}
