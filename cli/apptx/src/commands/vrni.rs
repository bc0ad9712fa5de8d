//! vRNI commands.

use anyhow::Result;
use apptx::services::vrni::{self, VrniAuth, VrniRegistration};
use clap::{Args, Subcommand};

use crate::output::{print_outcome, print_output};

use super::CommandContext;

/// vRNI commands.
#[derive(Debug, Args)]
pub struct VrniCommand {
    #[command(subcommand)]
    command: VrniSubcommand,
}

#[derive(Debug, Subcommand)]
enum VrniSubcommand {
    /// Register a vRNI instance.
    Register(RegisterArgs),

    /// Remove a vRNI registration.
    Unregister(FqdnArgs),

    /// Replace the credentials of a vRNI instance.
    UpdateCredentials(UpdateCredentialsArgs),

    /// Attach vCenters to a vRNI instance.
    AddVcenters(VCentersArgs),

    /// Detach vCenters from a vRNI instance.
    RemoveVcenters(VCentersArgs),

    /// List vRNI instances.
    List,
}

#[derive(Debug, Args)]
struct FqdnArgs {
    /// FQDN of the vRNI instance.
    #[arg(long)]
    vrni_fqdn: String,
}

#[derive(Debug, Args)]
struct CredentialArgs {
    /// The instance is vRNI SaaS.
    #[arg(long, alias = "isSaaS")]
    is_saas: bool,

    /// API token of a SaaS instance.
    #[arg(long, env = "APPTX_VRNI_API_TOKEN", hide_env_values = true)]
    vrni_api_token: Option<String>,

    /// Service account alias of an on-premises instance.
    #[arg(long)]
    sa_alias: Option<String>,
}

impl CredentialArgs {
    fn auth(&self) -> Result<VrniAuth> {
        Ok(VrniAuth::new(
            self.is_saas,
            self.vrni_api_token.clone(),
            self.sa_alias.clone(),
        )?)
    }
}

#[derive(Debug, Args)]
struct RegisterArgs {
    #[command(flatten)]
    target: FqdnArgs,

    /// Comma separated vCenter names to attach.
    #[arg(long)]
    vc_names: String,

    #[command(flatten)]
    credentials: CredentialArgs,

    /// Display alias of the instance.
    #[arg(long)]
    vrni_alias: Option<String>,

    /// Certificate thumbprint of the instance, forwarded as given.
    #[arg(long)]
    certificate_thumbprint: Option<String>,
}

#[derive(Debug, Args)]
struct UpdateCredentialsArgs {
    #[command(flatten)]
    target: FqdnArgs,

    #[command(flatten)]
    credentials: CredentialArgs,
}

#[derive(Debug, Args)]
struct VCentersArgs {
    #[command(flatten)]
    target: FqdnArgs,

    /// Comma separated vCenter names.
    #[arg(long)]
    vc_names: String,
}

impl VrniCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            VrniSubcommand::Register(args) => register(ctx, args).await,
            VrniSubcommand::Unregister(args) => {
                let session = ctx.session().await?;
                let outcome = vrni::unregister(&session, &args.vrni_fqdn).await?;
                print_outcome(
                    &format!("Deleted vRNI '{}'", args.vrni_fqdn),
                    &outcome,
                    ctx.format,
                )
            }
            VrniSubcommand::UpdateCredentials(args) => {
                let auth = args.credentials.auth()?;
                let session = ctx.session().await?;
                let fqdn = &args.target.vrni_fqdn;
                let outcome = vrni::update_credentials(&session, fqdn, &auth).await?;
                print_outcome(
                    &format!("Updated credentials of vRNI '{fqdn}'"),
                    &outcome,
                    ctx.format,
                )
            }
            VrniSubcommand::AddVcenters(args) => {
                let session = ctx.session().await?;
                let fqdn = &args.target.vrni_fqdn;
                let outcome = vrni::add_vcenters(&session, fqdn, &args.vc_names).await?;
                print_outcome(
                    &format!("Added vCenters to vRNI '{fqdn}'"),
                    &outcome,
                    ctx.format,
                )
            }
            VrniSubcommand::RemoveVcenters(args) => {
                let session = ctx.session().await?;
                let fqdn = &args.target.vrni_fqdn;
                let outcome = vrni::remove_vcenters(&session, fqdn, &args.vc_names).await?;
                print_outcome(
                    &format!("Removed vCenters from vRNI '{fqdn}'"),
                    &outcome,
                    ctx.format,
                )
            }
            VrniSubcommand::List => {
                let session = ctx.session().await?;
                let instances = vrni::list(&session).await?;
                print_output(&instances, ctx.format)
            }
        }
    }
}

async fn register(ctx: CommandContext, args: RegisterArgs) -> Result<()> {
    let auth = args.credentials.auth()?;
    let registration = VrniRegistration::new(&args.target.vrni_fqdn, &args.vc_names, auth)?
        .with_alias(args.vrni_alias)
        .with_certificate_thumbprint(args.certificate_thumbprint);
    let session = ctx.session().await?;

    let outcome = vrni::register(&session, &registration).await?;
    print_outcome(
        &format!("Registered vRNI '{}'", registration.fqdn),
        &outcome,
        ctx.format,
    )
}
