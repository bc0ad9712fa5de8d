//! Wire types of the appliance API.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Kinds of appliance resources, used in lookups and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    ServiceAccount,
    VCenter,
    Vrni,
    VirtualMachine,
    Datacenter,
    Cluster,
    ResourcePool,
    Folder,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ServiceAccount => "Service Account",
            Self::VCenter => "vCenter",
            Self::Vrni => "vRNI instance",
            Self::VirtualMachine => "Virtual Machine",
            Self::Datacenter => "Datacenter",
            Self::Cluster => "Cluster",
            Self::ResourcePool => "Resource Pool",
            Self::Folder => "Folder",
        })
    }
}

/// HAL-style list envelope: `{"_embedded": {"<collection>": [...]}}`.
#[derive(Debug, Default, Deserialize)]
pub struct HalPage {
    #[serde(rename = "_embedded", default)]
    embedded: serde_json::Map<String, serde_json::Value>,
}

impl HalPage {
    /// Take the collection stored under `key`. A missing key is an empty list.
    pub fn take<T: DeserializeOwned>(mut self, key: &str) -> Result<Vec<T>, serde_json::Error> {
        match self.embedded.remove(key) {
            Some(serde_json::Value::Null) | None => Ok(Vec::new()),
            Some(items) => serde_json::from_value(items),
        }
    }
}

// -----------------------------------------------------------------------------
// Service accounts
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tabled)]
pub struct ServiceAccount {
    #[tabled(rename = "UUID")]
    #[serde(default)]
    pub uuid: String,

    #[tabled(rename = "Alias")]
    #[serde(default)]
    pub alias: String,

    #[tabled(rename = "Username")]
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceAccountRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub alias: &'a str,
}

/// Resource class a global default service account applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum ServiceAccountType {
    #[serde(rename = "VCs")]
    #[value(name = "VCs")]
    VCenters,

    #[serde(rename = "VRNIs")]
    #[value(name = "VRNIs")]
    Vrnis,

    #[serde(rename = "LINUX_VMs")]
    #[value(name = "LINUX_VMs")]
    LinuxVms,

    #[serde(rename = "WINDOWS_VMs")]
    #[value(name = "WINDOWS_VMs")]
    WindowsVms,
}

impl fmt::Display for ServiceAccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VCenters => "VCs",
            Self::Vrnis => "VRNIs",
            Self::LinuxVms => "LINUX_VMs",
            Self::WindowsVms => "WINDOWS_VMs",
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalDefaultRequest<'a> {
    #[serde(rename = "serviceAccountUUID")]
    pub service_account_uuid: &'a str,
    pub service_account_type: ServiceAccountType,
}

// -----------------------------------------------------------------------------
// vCenters and inventory filters
// -----------------------------------------------------------------------------

/// Leaf of the vCenter inventory (resource pool or folder).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryNode {
    #[serde(rename = "modId", default)]
    pub mod_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(rename = "modId", default)]
    pub mod_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "resourcePools", default)]
    pub resource_pools: Vec<InventoryNode>,
}

/// A datacenter subtree. Also serves as the scan filter set; the default
/// (all fields empty) scans the whole vCenter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datacenter {
    #[serde(rename = "modId", default)]
    pub mod_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub folders: Vec<InventoryNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tabled)]
pub struct VCenter {
    #[tabled(rename = "UUID")]
    #[serde(rename = "irisVcenterUUID", default)]
    pub uuid: String,

    #[tabled(rename = "Name")]
    #[serde(rename = "vcName", default)]
    pub name: String,

    #[tabled(rename = "FQDN")]
    #[serde(default)]
    pub fqdn: String,

    #[tabled(rename = "Datacenters", display = "display_datacenters")]
    #[serde(rename = "dataCenters", default)]
    pub datacenters: Vec<Datacenter>,
}

fn display_datacenters(datacenters: &[Datacenter]) -> String {
    datacenters
        .iter()
        .map(|dc| dc.name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Serialize)]
pub struct VCenterRequest<'a> {
    pub fqdn: &'a str,
    #[serde(rename = "vcName")]
    pub name: &'a str,
    #[serde(rename = "vcServiceAccountUUID")]
    pub service_account_uuid: &'a str,
    #[serde(
        rename = "certificateThumbprint",
        skip_serializing_if = "Option::is_none"
    )]
    pub certificate_thumbprint: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VCenterScanRequest {
    pub component_scan: bool,
    pub apply_credential_policy: bool,
    pub binary_analysis: bool,
    pub filters: Datacenter,
}

#[derive(Debug, Serialize)]
pub struct DiscoverTopologyRequest {
    pub filters: Datacenter,
}

// -----------------------------------------------------------------------------
// vRNI
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrniVCenter {
    #[serde(default)]
    pub fqdn: String,
    #[serde(rename = "irisVcenterUUID", default)]
    pub uuid: String,
    #[serde(rename = "vcName", default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccountRef {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub alias: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Tabled)]
pub struct VrniInstance {
    #[tabled(rename = "ID")]
    #[serde(default)]
    pub id: String,

    #[tabled(rename = "Alias")]
    #[serde(default)]
    pub alias: String,

    #[tabled(rename = "FQDN")]
    #[serde(default)]
    pub ip: String,

    #[tabled(rename = "Type")]
    #[serde(rename = "vrniType", default)]
    pub vrni_type: String,

    #[tabled(rename = "SaaS")]
    #[serde(rename = "isSaaS", alias = "isSaas", default)]
    pub is_saas: bool,

    #[tabled(skip)]
    #[serde(rename = "apiToken", default, skip_serializing)]
    pub api_token: String,

    #[tabled(rename = "vCenters", display = "display_vrni_vcenters")]
    #[serde(default)]
    pub vcenters: Vec<VrniVCenter>,

    #[tabled(rename = "Service Account", display = "display_service_account_ref")]
    #[serde(rename = "serviceAccount", default)]
    pub service_account: Option<ServiceAccountRef>,
}

impl VrniInstance {
    /// UUIDs of the vCenters currently attached, in appliance order.
    pub fn vcenter_uuids(&self) -> Vec<String> {
        self.vcenters.iter().map(|vc| vc.uuid.clone()).collect()
    }
}

fn display_vrni_vcenters(vcenters: &[VrniVCenter]) -> String {
    vcenters
        .iter()
        .map(|vc| vc.name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn display_service_account_ref(account: &Option<ServiceAccountRef>) -> String {
    account
        .as_ref()
        .map(|sa| sa.alias.clone())
        .filter(|alias| !alias.is_empty())
        .unwrap_or_else(|| "-".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VrniRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub ip: String,
    pub api_token: String,
    pub is_saas: bool,
    pub vc_uuids: Vec<String>,
    #[serde(rename = "serviceAccountUUID")]
    pub service_account_uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_thumbprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrni_type: Option<String>,
}

// -----------------------------------------------------------------------------
// Virtual machines, applications, components
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    #[tabled(rename = "VM ID")]
    #[serde(default)]
    pub id: String,

    #[tabled(rename = "Name")]
    #[serde(default)]
    pub name: String,

    #[tabled(rename = "vCenter")]
    #[serde(default)]
    pub vcenter_fqdn: String,

    #[tabled(rename = "Datacenter")]
    #[serde(default)]
    pub data_center: String,

    #[tabled(rename = "Cluster")]
    #[serde(default)]
    pub cluster: String,

    #[tabled(rename = "Resource Pool")]
    #[serde(default)]
    pub resource_pool: String,

    #[tabled(rename = "Folder")]
    #[serde(default)]
    pub folder: String,

    #[tabled(skip)]
    #[serde(default)]
    pub hostname: String,

    #[tabled(rename = "Network")]
    #[serde(default)]
    pub network: String,

    #[tabled(rename = "Datastore")]
    #[serde(default)]
    pub datastore: String,

    #[tabled(rename = "IP")]
    #[serde(default)]
    pub ip: String,

    #[tabled(rename = "CPU")]
    #[serde(rename = "numCPU", default)]
    pub num_cpu: i64,

    #[tabled(rename = "Memory (MB)", display = "display_json")]
    #[serde(rename = "memoryMB", default)]
    pub memory_mb: serde_json::Value,

    #[tabled(skip)]
    #[serde(default)]
    pub num_of_disks: i64,

    #[tabled(rename = "Disk Size", display = "display_json")]
    #[serde(default)]
    pub size_of_disks: serde_json::Value,

    #[tabled(rename = "Services", display = "display_list")]
    #[serde(default)]
    pub services: Vec<String>,
}

fn display_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "-".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn display_list(values: &[String]) -> String {
    values.join(",")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[tabled(rename = "Component Name")]
    #[serde(default)]
    pub comp_name: String,

    #[tabled(rename = "Process Name")]
    #[serde(default)]
    pub process_name: String,

    #[tabled(rename = "Component Type")]
    #[serde(rename = "type", default)]
    pub kind: String,

    #[tabled(rename = "VM Name")]
    #[serde(default)]
    pub vm_name: String,

    #[tabled(rename = "VM UUID")]
    #[serde(rename = "vmUUID", default)]
    pub vm_uuid: String,

    #[tabled(rename = "Service Type")]
    #[serde(default)]
    pub service_type: String,

    #[tabled(rename = "Is Containerizable")]
    #[serde(default)]
    pub is_containerizable: bool,

    #[tabled(skip)]
    #[serde(default)]
    pub id: String,

    #[tabled(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[tabled(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_introspect: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmComponents {
    #[serde(default)]
    pub vm_name: String,
    #[serde(default)]
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "componentsGroupedByVMs", default)]
    pub components_by_vm: Vec<VmComponents>,
}

/// One component of one application, flattened for tabular output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct ApplicationComponentRow {
    #[tabled(rename = "Application Name")]
    pub application: String,
    #[tabled(rename = "ID")]
    pub application_id: String,
    #[tabled(rename = "Component Name")]
    pub component: String,
    #[tabled(rename = "Process Name")]
    pub process_name: String,
    #[tabled(rename = "Component Type")]
    pub kind: String,
    #[tabled(rename = "VM Name")]
    pub vm_name: String,
    #[tabled(rename = "VM UUID")]
    pub vm_uuid: String,
    #[tabled(rename = "Service Type")]
    pub service_type: String,
    #[tabled(rename = "Is Containerizable")]
    pub is_containerizable: bool,
}

impl Application {
    /// Flatten application → VM group → component into rows.
    pub fn component_rows(&self) -> Vec<ApplicationComponentRow> {
        self.components_by_vm
            .iter()
            .flat_map(|group| group.components.iter())
            .map(|component| ApplicationComponentRow {
                application: self.name.clone(),
                application_id: self.id.clone(),
                component: component.comp_name.clone(),
                process_name: component.process_name.clone(),
                kind: component.kind.clone(),
                vm_name: component.vm_name.clone(),
                vm_uuid: component.vm_uuid.clone(),
                service_type: component.service_type.clone(),
                is_containerizable: component.is_containerizable,
            })
            .collect()
    }
}
