//! Virtual machine commands.

use anyhow::Result;
use apptx::services::virtual_machines::{self, VmFilter};
use clap::{Args, Subcommand};

use crate::output::{print_output, OutputFormat};

use super::CommandContext;

/// Virtual machine commands.
#[derive(Debug, Args)]
pub struct VirtualMachinesCommand {
    #[command(subcommand)]
    command: VirtualMachinesSubcommand,
}

#[derive(Debug, Subcommand)]
enum VirtualMachinesSubcommand {
    /// List virtual machines.
    List(FilterArgs),

    /// Discover components on the matching virtual machines. Needs --vm-name.
    Introspect(FilterArgs),
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// vCenter FQDN.
    #[arg(long)]
    vc_fqdn: Option<String>,

    /// Datacenter name.
    #[arg(long)]
    vc_datacenter: Option<String>,

    /// Cluster name.
    #[arg(long)]
    vc_cluster: Option<String>,

    /// Resource pool name.
    #[arg(long)]
    vc_resource_pool: Option<String>,

    /// Folder name.
    #[arg(long)]
    vc_folder: Option<String>,

    /// Virtual machine name.
    #[arg(long)]
    vm_name: Option<String>,

    /// Virtual machine IP.
    #[arg(long)]
    vm_ip: Option<String>,
}

impl From<FilterArgs> for VmFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            vcenter_fqdn: args.vc_fqdn,
            datacenter: args.vc_datacenter,
            cluster: args.vc_cluster,
            resource_pool: args.vc_resource_pool,
            folder: args.vc_folder,
            name: args.vm_name,
            ip: args.vm_ip,
        }
    }
}

impl VirtualMachinesCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            VirtualMachinesSubcommand::List(args) => {
                let session = ctx.session().await?;
                let vms = virtual_machines::list(&session, &args.into()).await?;
                print_output(&vms, ctx.format)
            }
            VirtualMachinesSubcommand::Introspect(args) => introspect(ctx, args.into()).await,
        }
    }
}

async fn introspect(ctx: CommandContext, filter: VmFilter) -> Result<()> {
    let session = ctx.session().await?;
    let report = virtual_machines::introspect(&session, &filter).await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        format => print_output(&report.results, format)?,
    }
    report.into_result()?;
    Ok(())
}
