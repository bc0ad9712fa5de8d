//! Service account commands.

use anyhow::Result;
use apptx::services::service_accounts::{self, NewServiceAccount};
use clap::{Args, Subcommand};

use crate::output::{print_outcome, print_output};

use super::CommandContext;

/// Service account commands.
#[derive(Debug, Args)]
pub struct ServiceAccountCommand {
    #[command(subcommand)]
    command: ServiceAccountSubcommand,
}

#[derive(Debug, Subcommand)]
enum ServiceAccountSubcommand {
    /// Register a service account (no-op if the alias exists).
    Register(RegisterArgs),

    /// Remove a service account.
    Unregister(AliasArgs),

    /// List service accounts.
    List(ListArgs),
}

#[derive(Debug, Args)]
struct RegisterArgs {
    /// Alias the account is referenced by.
    #[arg(long)]
    sa_alias: String,

    /// Username of the account.
    #[arg(long)]
    sa_username: String,

    /// Password of the account.
    #[arg(long, env = "APPTX_SA_PASSWORD", hide_env_values = true)]
    sa_password: String,
}

#[derive(Debug, Args)]
struct AliasArgs {
    /// Alias of the service account.
    #[arg(long)]
    sa_alias: String,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Only accounts whose alias contains this text.
    #[arg(long)]
    sa_alias: Option<String>,
}

impl ServiceAccountCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            ServiceAccountSubcommand::Register(args) => register(ctx, args).await,
            ServiceAccountSubcommand::Unregister(args) => unregister(ctx, args).await,
            ServiceAccountSubcommand::List(args) => list(ctx, args).await,
        }
    }
}

async fn register(ctx: CommandContext, args: RegisterArgs) -> Result<()> {
    let account = NewServiceAccount::new(&args.sa_alias, args.sa_username, args.sa_password)?;
    let session = ctx.session().await?;

    let outcome = service_accounts::register(&session, &account).await?;
    print_outcome(
        &format!("Registered Service Account '{}'", args.sa_alias),
        &outcome,
        ctx.format,
    )
}

async fn unregister(ctx: CommandContext, args: AliasArgs) -> Result<()> {
    let session = ctx.session().await?;
    let outcome = service_accounts::unregister(&session, &args.sa_alias).await?;
    print_outcome(
        &format!("Deleted Service Account '{}'", args.sa_alias),
        &outcome,
        ctx.format,
    )
}

async fn list(ctx: CommandContext, args: ListArgs) -> Result<()> {
    let session = ctx.session().await?;
    let accounts = service_accounts::list(&session, args.sa_alias.as_deref()).await?;
    print_output(&accounts, ctx.format)
}
