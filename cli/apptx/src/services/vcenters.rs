//! vCenter operations.
//!
//! Registration, inventory sync, VM and component scans, and topology
//! discovery all share the same shape: resolve the vCenter, POST to one of
//! its sub-resources, follow the task.

use reqwest::Method;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::lookup::{self, Filter, VCenterSelector};
use crate::models::{
    Datacenter, DiscoverTopologyRequest, ResourceKind, VCenter, VCenterRequest, VCenterScanRequest,
};
use crate::operation::{run_mutation, Mutation, Outcome};
use crate::session::Session;

const PATH: &str = "vcenters";

/// A vCenter to register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VCenterRegistration {
    pub fqdn: String,
    pub name: String,
    pub service_account_alias: String,
    pub certificate_thumbprint: Option<String>,
}

impl VCenterRegistration {
    pub fn new(
        fqdn: impl Into<String>,
        name: impl Into<String>,
        service_account_alias: impl Into<String>,
    ) -> ApiResult<Self> {
        let registration = Self {
            fqdn: fqdn.into(),
            name: name.into(),
            service_account_alias: service_account_alias.into(),
            certificate_thumbprint: None,
        };
        if registration.fqdn.trim().is_empty()
            || registration.name.trim().is_empty()
            || registration.service_account_alias.trim().is_empty()
        {
            return Err(ApiError::usage(
                "registering a vCenter requires --vc-fqdn, --vc-name and --sa-alias",
            ));
        }
        Ok(registration)
    }

    /// Forward an operator-supplied certificate thumbprint.
    pub fn with_certificate_thumbprint(mut self, thumbprint: Option<String>) -> Self {
        self.certificate_thumbprint = thumbprint.filter(|t| !t.trim().is_empty());
        self
    }
}

/// Optional part of the inventory a scan is restricted to. The default
/// scans everything the vCenter manages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanScope {
    pub datacenter: Option<String>,
    pub cluster: Option<String>,
    pub resource_pool: Option<String>,
    pub folder: Option<String>,
}

impl ScanScope {
    pub fn is_full(&self) -> bool {
        self.datacenter.is_none()
            && self.cluster.is_none()
            && self.resource_pool.is_none()
            && self.folder.is_none()
    }

    /// Build the filter set from the vCenter's inventory tree.
    pub fn resolve(&self, vcenter: &VCenter) -> ApiResult<Datacenter> {
        if self.is_full() {
            return Ok(Datacenter::default());
        }

        let Some(dc_name) = self.datacenter.as_deref() else {
            return Err(ApiError::usage(
                "--datacenter is required when scoping a scan by cluster, resource pool or folder",
            ));
        };
        if self.resource_pool.is_some() && self.cluster.is_none() {
            return Err(ApiError::usage(
                "--cluster is required when scoping a scan by resource pool",
            ));
        }

        let datacenter = vcenter
            .datacenters
            .iter()
            .find(|dc| dc.name == dc_name)
            .ok_or_else(|| ApiError::lookup_miss(ResourceKind::Datacenter, dc_name))?;

        let mut filter = datacenter.clone();
        if self.cluster.is_none() && self.folder.is_none() {
            return Ok(filter);
        }

        filter.clusters = Vec::new();
        filter.folders = Vec::new();

        if let Some(cluster_name) = self.cluster.as_deref() {
            let mut cluster = datacenter
                .clusters
                .iter()
                .find(|c| c.name == cluster_name)
                .cloned()
                .ok_or_else(|| ApiError::lookup_miss(ResourceKind::Cluster, cluster_name))?;

            if let Some(pool_name) = self.resource_pool.as_deref() {
                cluster.resource_pools.retain(|pool| pool.name == pool_name);
                if cluster.resource_pools.is_empty() {
                    return Err(ApiError::lookup_miss(ResourceKind::ResourcePool, pool_name));
                }
            }
            filter.clusters.push(cluster);
        }

        if let Some(folder_name) = self.folder.as_deref() {
            let folder = datacenter
                .folders
                .iter()
                .find(|f| f.name == folder_name)
                .cloned()
                .ok_or_else(|| ApiError::lookup_miss(ResourceKind::Folder, folder_name))?;
            filter.folders.push(folder);
        }

        Ok(filter)
    }
}

/// Extra analysis switches for component scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    pub apply_credential_policy: bool,
    pub binary_analysis: bool,
}

/// Register a vCenter using the service account with the given alias.
pub async fn register(session: &Session, registration: &VCenterRegistration) -> ApiResult<Outcome> {
    let account =
        lookup::find_service_account(session.client(), &registration.service_account_alias)
            .await?;

    let url = session.client().url(&format!("{PATH}?action=register"))?;
    let request = VCenterRequest {
        fqdn: &registration.fqdn,
        name: &registration.name,
        service_account_uuid: &account.uuid,
        certificate_thumbprint: registration.certificate_thumbprint.as_deref(),
    };

    let mutation = Mutation::new(
        Method::POST,
        url,
        format!("register vCenter '{}'", registration.name),
    )
    .json(&request);
    run_mutation(session, mutation).await
}

/// Remove a vCenter registration.
pub async fn unregister(session: &Session, selector: &VCenterSelector) -> ApiResult<Outcome> {
    let vcenter = lookup::find_vcenter(session.client(), selector).await?;
    let url = session.client().url(&format!("{PATH}/{}", vcenter.uuid))?;

    let action = format!("delete vCenter '{}'", vcenter.name);
    run_mutation(session, Mutation::new(Method::DELETE, url, action)).await
}

/// Re-read the vCenter inventory.
pub async fn sync(session: &Session, selector: &VCenterSelector) -> ApiResult<Outcome> {
    let vcenter = lookup::find_vcenter(session.client(), selector).await?;
    let action = format!("execute sync on vCenter '{}'", vcenter.name);
    post_to_vcenter::<()>(session, &vcenter, "sync", None, action).await
}

/// Discover the virtual machines a vCenter manages.
pub async fn scan_virtual_machines(
    session: &Session,
    selector: &VCenterSelector,
    scope: &ScanScope,
) -> ApiResult<Outcome> {
    let vcenter = lookup::find_vcenter(session.client(), selector).await?;
    let request = VCenterScanRequest {
        component_scan: false,
        apply_credential_policy: false,
        binary_analysis: false,
        filters: scope.resolve(&vcenter)?,
    };

    let action = format!("scan virtual machines managed by vCenter '{}'", vcenter.name);
    post_to_vcenter(session, &vcenter, "virtualmachines", Some(&request), action).await
}

/// Discover the components running on the vCenter's virtual machines.
pub async fn scan_components(
    session: &Session,
    selector: &VCenterSelector,
    scope: &ScanScope,
    options: ScanOptions,
) -> ApiResult<Outcome> {
    let vcenter = lookup::find_vcenter(session.client(), selector).await?;
    let request = VCenterScanRequest {
        component_scan: true,
        apply_credential_policy: options.apply_credential_policy,
        binary_analysis: options.binary_analysis,
        filters: scope.resolve(&vcenter)?,
    };

    let action = format!(
        "scan components on virtual machines managed by vCenter '{}'",
        vcenter.name
    );
    post_to_vcenter(session, &vcenter, "components", Some(&request), action).await
}

/// Correlate discovered components into an application topology.
pub async fn discover_topology(
    session: &Session,
    selector: &VCenterSelector,
    scope: &ScanScope,
) -> ApiResult<Outcome> {
    let vcenter = lookup::find_vcenter(session.client(), selector).await?;
    let request = DiscoverTopologyRequest {
        filters: scope.resolve(&vcenter)?,
    };

    let action = format!("discover topology for vCenter '{}'", vcenter.name);
    post_to_vcenter(session, &vcenter, "correlation", Some(&request), action).await
}

/// All registered vCenters.
pub async fn list(session: &Session) -> ApiResult<Vec<VCenter>> {
    lookup::find_by_filter(session.client(), &Filter::new()).await
}

async fn post_to_vcenter<B: Serialize + ?Sized>(
    session: &Session,
    vcenter: &VCenter,
    sub_resource: &str,
    body: Option<&B>,
    action: String,
) -> ApiResult<Outcome> {
    let url = session
        .client()
        .url(&format!("{PATH}/{}/{sub_resource}", vcenter.uuid))?;
    let mutation = Mutation::new(Method::POST, url, action);

    match body {
        Some(body) => run_mutation(session, mutation.json(body)).await,
        None => run_mutation(session, mutation).await,
    }
}
