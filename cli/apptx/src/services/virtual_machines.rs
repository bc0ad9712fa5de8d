//! Virtual machine listing and introspection.

use reqwest::Method;
use serde::Serialize;
use tabled::Tabled;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::lookup::{self, Collection, Filter};
use crate::models::{ResourceKind, VirtualMachine};
use crate::operation::{run_mutation, Mutation, Outcome};
use crate::session::Session;

/// Server-side filters of the virtual machine list. Unset fields are not
/// sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmFilter {
    pub vcenter_fqdn: Option<String>,
    pub datacenter: Option<String>,
    pub cluster: Option<String>,
    pub resource_pool: Option<String>,
    pub folder: Option<String>,
    pub name: Option<String>,
    pub ip: Option<String>,
}

impl VmFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    fn to_filter(&self) -> Filter {
        Filter::new()
            .with_opt("vcenterFqdn", self.vcenter_fqdn.as_deref())
            .with_opt("dataCenter", self.datacenter.as_deref())
            .with_opt("folder", self.folder.as_deref())
            .with_opt("cluster", self.cluster.as_deref())
            .with_opt("resourcePool", self.resource_pool.as_deref())
            .with_opt("name", self.name.as_deref())
            .with_opt("ip", self.ip.as_deref())
    }

    fn describe(&self) -> String {
        let filter = self.to_filter();
        if filter.is_empty() {
            "all virtual machines".to_string()
        } else {
            filter.describe()
        }
    }
}

/// Virtual machines matching the filter.
pub async fn list(session: &Session, filter: &VmFilter) -> ApiResult<Vec<VirtualMachine>> {
    lookup::find_by_filter(session.client(), &filter.to_filter()).await
}

/// Result of introspecting one virtual machine.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct VmIntrospection {
    #[tabled(rename = "VM ID")]
    pub vm_id: String,

    #[tabled(rename = "VM Name")]
    pub vm_name: String,

    #[tabled(rename = "Result")]
    pub result: String,

    #[tabled(skip)]
    pub succeeded: bool,
}

/// Per-VM results of an introspection run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntrospectReport {
    pub results: Vec<VmIntrospection>,
}

impl IntrospectReport {
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.succeeded).count()
    }

    /// `Partial` if any virtual machine failed.
    pub fn into_result(self) -> ApiResult<Self> {
        let failed = self.failed();
        if failed > 0 {
            return Err(ApiError::Partial {
                failed,
                total: self.results.len(),
                what: "virtual machine introspections".to_string(),
            });
        }
        Ok(self)
    }
}

/// Start component introspection on every VM the filter matches. The
/// filter must name the virtual machine.
///
/// A failure on one VM does not stop the others. Cancellation does.
pub async fn introspect(session: &Session, filter: &VmFilter) -> ApiResult<IntrospectReport> {
    if filter.name.as_deref().is_none_or(|name| name.trim().is_empty()) {
        return Err(ApiError::usage("introspecting virtual machines requires --vm-name"));
    }

    let vms = list(session, filter).await?;
    if vms.is_empty() {
        return Err(ApiError::lookup_miss(
            ResourceKind::VirtualMachine,
            filter.describe(),
        ));
    }

    let mut report = IntrospectReport::default();
    for vm in vms {
        if session.is_cancelled() {
            warn!(
                vm = %vm.name,
                done = report.results.len(),
                "Interrupted; skipping the remaining virtual machines"
            );
            return Err(ApiError::Interrupted {
                action: format!("introspect virtual machine '{}'", vm.name),
            });
        }

        let outcome = introspect_one(session, &vm).await;
        let (result, succeeded) = match outcome {
            Ok(outcome) => {
                info!(vm = %vm.name, %outcome, "Introspection finished");
                (outcome.to_string(), true)
            }
            Err(e @ (ApiError::Cancelled { .. } | ApiError::Interrupted { .. })) => return Err(e),
            Err(e) => {
                warn!(vm = %vm.name, error = %e, "Introspection failed");
                (e.to_string(), false)
            }
        };
        report.results.push(VmIntrospection {
            vm_id: vm.id,
            vm_name: vm.name,
            result,
            succeeded,
        });
    }

    Ok(report)
}

async fn introspect_one(session: &Session, vm: &VirtualMachine) -> ApiResult<Outcome> {
    let url = session
        .client()
        .url(&format!("{}/{}/components", VirtualMachine::PATH, vm.id))?;
    let action = format!("introspect virtual machine '{}'", vm.name);
    run_mutation(session, Mutation::new(Method::POST, url, action)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    #[test]
    fn filter_sends_only_set_fields() {
        let filter = VmFilter {
            vcenter_fqdn: Some("vc1.example.com".into()),
            cluster: Some("prod".into()),
            ip: Some(String::new()),
            ..VmFilter::default()
        };
        let mut url = Url::parse("https://appliance/discovery/virtualmachines").unwrap();
        filter.to_filter().apply(&mut url);
        assert_eq!(url.query(), Some("vcenterFqdn=vc1.example.com&cluster=prod"));
    }

    #[test]
    fn report_with_failures_is_partial() {
        let report = IntrospectReport {
            results: vec![
                VmIntrospection {
                    vm_id: "1".into(),
                    vm_name: "web-1".into(),
                    result: "ok".into(),
                    succeeded: true,
                },
                VmIntrospection {
                    vm_id: "2".into(),
                    vm_name: "db-1".into(),
                    result: "failed".into(),
                    succeeded: false,
                },
            ],
        };
        match report.into_result() {
            Err(ApiError::Partial { failed, total, .. }) => assert_eq!((failed, total), (1, 2)),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
