//! vCenter commands.

use anyhow::Result;
use apptx::lookup::VCenterSelector;
use apptx::services::vcenters::{self, ScanOptions, ScanScope, VCenterRegistration};
use clap::{Args, Subcommand};

use crate::output::{print_outcome, print_output};

use super::CommandContext;

/// vCenter commands.
#[derive(Debug, Args)]
pub struct VCenterCommand {
    #[command(subcommand)]
    command: VCenterSubcommand,
}

#[derive(Debug, Subcommand)]
enum VCenterSubcommand {
    /// Register a vCenter.
    Register(RegisterArgs),

    /// Remove a vCenter registration.
    Unregister(SelectorArgs),

    /// Re-read the vCenter inventory.
    Sync(SelectorArgs),

    /// Discover the virtual machines a vCenter manages.
    ScanVirtualMachines(ScanArgs),

    /// Discover components running on the vCenter's virtual machines.
    ScanComponents(ScanComponentsArgs),

    /// Correlate discovered components into application topology.
    DiscoverTopology(ScanArgs),

    /// List registered vCenters.
    List,
}

#[derive(Debug, Args)]
struct RegisterArgs {
    /// vCenter FQDN.
    #[arg(long)]
    vc_fqdn: String,

    /// Display name of the vCenter.
    #[arg(long)]
    vc_name: String,

    /// Alias of the service account used to reach the vCenter.
    #[arg(long)]
    sa_alias: String,

    /// SHA-1 thumbprint of the vCenter certificate, forwarded as given.
    #[arg(long)]
    certificate_thumbprint: Option<String>,
}

#[derive(Debug, Args)]
struct SelectorArgs {
    /// vCenter name.
    #[arg(long)]
    vc_name: Option<String>,

    /// vCenter FQDN.
    #[arg(long)]
    vc_fqdn: Option<String>,
}

impl SelectorArgs {
    fn selector(&self) -> Result<VCenterSelector> {
        Ok(VCenterSelector::new(
            self.vc_name.clone(),
            self.vc_fqdn.clone(),
        )?)
    }

    fn label(&self) -> &str {
        self.vc_name
            .as_deref()
            .or(self.vc_fqdn.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Args)]
struct ScanArgs {
    #[command(flatten)]
    vcenter: SelectorArgs,

    /// Limit the scan to this datacenter.
    #[arg(long)]
    datacenter: Option<String>,

    /// Limit the scan to this cluster (needs --datacenter).
    #[arg(long)]
    cluster: Option<String>,

    /// Limit the scan to this resource pool (needs --cluster).
    #[arg(long)]
    resource_pool: Option<String>,

    /// Limit the scan to this folder (needs --datacenter).
    #[arg(long)]
    folder: Option<String>,
}

impl ScanArgs {
    fn scope(&self) -> ScanScope {
        ScanScope {
            datacenter: self.datacenter.clone(),
            cluster: self.cluster.clone(),
            resource_pool: self.resource_pool.clone(),
            folder: self.folder.clone(),
        }
    }
}

#[derive(Debug, Args)]
struct ScanComponentsArgs {
    #[command(flatten)]
    scan: ScanArgs,

    /// Apply the credential policy while scanning.
    #[arg(long)]
    apply_credential_policy: bool,

    /// Run binary analysis on discovered components.
    #[arg(long)]
    binary_analysis: bool,
}

impl VCenterCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            VCenterSubcommand::Register(args) => register(ctx, args).await,
            VCenterSubcommand::Unregister(args) => {
                let selector = args.selector()?;
                let session = ctx.session().await?;
                let outcome = vcenters::unregister(&session, &selector).await?;
                print_outcome(
                    &format!("Deleted vCenter '{}'", args.label()),
                    &outcome,
                    ctx.format,
                )
            }
            VCenterSubcommand::Sync(args) => {
                let selector = args.selector()?;
                let session = ctx.session().await?;
                let outcome = vcenters::sync(&session, &selector).await?;
                print_outcome(
                    &format!("Synced vCenter '{}'", args.label()),
                    &outcome,
                    ctx.format,
                )
            }
            VCenterSubcommand::ScanVirtualMachines(args) => {
                let selector = args.vcenter.selector()?;
                let session = ctx.session().await?;
                let outcome =
                    vcenters::scan_virtual_machines(&session, &selector, &args.scope()).await?;
                print_outcome(
                    &format!(
                        "Scanned virtual machines of vCenter '{}'",
                        args.vcenter.label()
                    ),
                    &outcome,
                    ctx.format,
                )
            }
            VCenterSubcommand::ScanComponents(args) => scan_components(ctx, args).await,
            VCenterSubcommand::DiscoverTopology(args) => {
                let selector = args.vcenter.selector()?;
                let session = ctx.session().await?;
                let outcome =
                    vcenters::discover_topology(&session, &selector, &args.scope()).await?;
                print_outcome(
                    &format!("Discovered topology of vCenter '{}'", args.vcenter.label()),
                    &outcome,
                    ctx.format,
                )
            }
            VCenterSubcommand::List => {
                let session = ctx.session().await?;
                let found = vcenters::list(&session).await?;
                print_output(&found, ctx.format)
            }
        }
    }
}

async fn register(ctx: CommandContext, args: RegisterArgs) -> Result<()> {
    let registration = VCenterRegistration::new(&args.vc_fqdn, &args.vc_name, &args.sa_alias)?
        .with_certificate_thumbprint(args.certificate_thumbprint);
    let session = ctx.session().await?;

    let outcome = vcenters::register(&session, &registration).await?;
    print_outcome(
        &format!("Registered vCenter '{}'", args.vc_name),
        &outcome,
        ctx.format,
    )
}

async fn scan_components(ctx: CommandContext, args: ScanComponentsArgs) -> Result<()> {
    let selector = args.scan.vcenter.selector()?;
    let options = ScanOptions {
        apply_credential_policy: args.apply_credential_policy,
        binary_analysis: args.binary_analysis,
    };
    let session = ctx.session().await?;

    let outcome =
        vcenters::scan_components(&session, &selector, &args.scan.scope(), options).await?;
    print_outcome(
        &format!(
            "Scanned components of vCenter '{}'",
            args.scan.vcenter.label()
        ),
        &outcome,
        ctx.format,
    )
}
