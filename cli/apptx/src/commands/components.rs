//! Component commands.

use anyhow::Result;
use apptx::services::components;
use clap::{Args, Subcommand};

use crate::output::print_output;

use super::CommandContext;

/// Component commands.
#[derive(Debug, Args)]
pub struct ComponentsCommand {
    #[command(subcommand)]
    command: ComponentsSubcommand,
}

#[derive(Debug, Subcommand)]
enum ComponentsSubcommand {
    /// List discovered components.
    List,
}

impl ComponentsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            ComponentsSubcommand::List => {
                let session = ctx.session().await?;
                let found = components::list(&session).await?;
                print_output(&found, ctx.format)
            }
        }
    }
}
