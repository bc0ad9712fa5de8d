//! Global default service account commands.

use anyhow::Result;
use apptx::models::ServiceAccountType;
use apptx::services::global_defaults;
use clap::{Args, Subcommand};

use crate::output::print_outcome;

use super::CommandContext;

/// Global default commands.
#[derive(Debug, Args)]
pub struct GlobalDefaultCommand {
    #[command(subcommand)]
    command: GlobalDefaultSubcommand,
}

#[derive(Debug, Subcommand)]
enum GlobalDefaultSubcommand {
    /// Make a service account the default for a resource class.
    Assign(AssignArgs),

    /// Clear the default service account of a resource class.
    Reset(ResetArgs),
}

#[derive(Debug, Args)]
struct AssignArgs {
    /// Alias of the service account.
    #[arg(long)]
    sa_alias: String,

    /// Resource class the default applies to.
    #[arg(long, value_enum)]
    sa_type: ServiceAccountType,
}

#[derive(Debug, Args)]
struct ResetArgs {
    /// Resource class to reset.
    #[arg(long, value_enum)]
    sa_type: ServiceAccountType,
}

impl GlobalDefaultCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let session = ctx.session().await?;
        match self.command {
            GlobalDefaultSubcommand::Assign(args) => {
                let outcome =
                    global_defaults::assign(&session, &args.sa_alias, args.sa_type).await?;
                print_outcome(
                    &format!(
                        "Assigned '{}' as the default {} Service Account",
                        args.sa_alias, args.sa_type
                    ),
                    &outcome,
                    ctx.format,
                )
            }
            GlobalDefaultSubcommand::Reset(args) => {
                let outcome = global_defaults::reset(&session, args.sa_type).await?;
                print_outcome(
                    &format!("Reset the default {} Service Account", args.sa_type),
                    &outcome,
                    ctx.format,
                )
            }
        }
    }
}
