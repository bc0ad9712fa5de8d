//! Name → UUID resolution helpers.
//!
//! The API is UUID-addressed. For UX, the CLI accepts aliases, names and
//! FQDNs. This module resolves them by querying the list endpoints with
//! server-side filters and then confirming an exact match locally, since
//! the appliance filters are partial matches.

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Application, Component, HalPage, ResourceKind, ServiceAccount, VCenter, VirtualMachine,
    VrniInstance,
};

/// A list endpoint wrapped in a HAL envelope.
pub trait Collection: DeserializeOwned {
    /// Path below `/discovery/`.
    const PATH: &'static str;

    /// Key of the collection inside `_embedded`.
    const EMBEDDED_KEY: &'static str;
}

impl Collection for ServiceAccount {
    const PATH: &'static str = "serviceaccounts";
    const EMBEDDED_KEY: &'static str = "serviceAccounts";
}

impl Collection for VCenter {
    const PATH: &'static str = "vcenters";
    const EMBEDDED_KEY: &'static str = "vcenters";
}

impl Collection for VirtualMachine {
    const PATH: &'static str = "virtualmachines";
    const EMBEDDED_KEY: &'static str = "virtualmachines";
}

impl Collection for Application {
    const PATH: &'static str = "applications";
    const EMBEDDED_KEY: &'static str = "applications";
}

impl Collection for Component {
    const PATH: &'static str = "components";
    const EMBEDDED_KEY: &'static str = "components";
}

/// Query-string filter. Empty values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pairs: Vec<(&'static str, String)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `key=value` unless the value is empty.
    pub fn with(mut self, key: &'static str, value: impl AsRef<str>) -> Self {
        let value = value.as_ref().trim();
        if !value.is_empty() {
            self.pairs.push((key, value.to_string()));
        }
        self
    }

    pub fn with_opt(self, key: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    /// Pagination defaults used by the appliance UI.
    pub fn page(mut self, page: u32, size: u32) -> Self {
        self.pairs.push(("page", page.to_string()));
        self.pairs.push(("size", size.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `key=value` pairs joined with spaces, for messages.
    pub fn describe(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Append the pairs to a URL (percent-encoded).
    pub fn apply(&self, url: &mut Url) {
        if self.pairs.is_empty() {
            return;
        }
        let mut query = url.query_pairs_mut();
        for (key, value) in &self.pairs {
            query.append_pair(key, value);
        }
    }
}

/// Query a collection with a filter and decode the embedded items.
pub async fn find_by_filter<T: Collection>(client: &ApiClient, filter: &Filter) -> ApiResult<Vec<T>> {
    let mut url = client.url(T::PATH)?;
    filter.apply(&mut url);

    let action = format!("list {}", T::PATH);
    let response = client.get(url).await?;
    let page: HalPage = response.success_json(&action)?;
    let items = page
        .take(T::EMBEDDED_KEY)
        .map_err(|e| ApiError::decode(action, e))?;

    debug!(collection = T::PATH, count = items.len(), "Fetched collection");
    Ok(items)
}

/// Return the first candidate that matches exactly.
///
/// Zero exact matches is a lookup miss.
pub fn first_exact<T>(
    candidates: Vec<T>,
    kind: ResourceKind,
    ident: &str,
    is_match: impl Fn(&T) -> bool,
) -> ApiResult<T> {
    let total = candidates.len();
    let found = candidates.into_iter().enumerate().find(|(index, candidate)| {
        let hit = is_match(candidate);
        if !hit {
            debug!(%kind, ident, index, "Candidate is not an exact match");
        }
        hit
    });
    match found {
        Some((_, found)) => Ok(found),
        None => {
            warn!(%kind, ident, candidates = total, "Lookup found no exact match");
            Err(ApiError::lookup_miss(kind, ident))
        }
    }
}

/// Service accounts whose alias matches the appliance's partial filter.
pub async fn search_service_accounts(
    client: &ApiClient,
    alias: &str,
) -> ApiResult<Vec<ServiceAccount>> {
    let filter = Filter::new().page(0, 10).with("alias", alias);
    find_by_filter(client, &filter).await
}

/// Resolve a service account alias to exactly one account.
pub async fn find_service_account(client: &ApiClient, alias: &str) -> ApiResult<ServiceAccount> {
    let candidates = search_service_accounts(client, alias).await?;
    first_exact(candidates, ResourceKind::ServiceAccount, alias, |sa| {
        sa.alias == alias
    })
}

/// Identifies a vCenter by name, FQDN or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VCenterSelector {
    name: Option<String>,
    fqdn: Option<String>,
}

impl VCenterSelector {
    /// At least one of `name` and `fqdn` must be non-empty.
    pub fn new(name: Option<String>, fqdn: Option<String>) -> ApiResult<Self> {
        let name = name.filter(|n| !n.trim().is_empty());
        let fqdn = fqdn.filter(|f| !f.trim().is_empty());
        if name.is_none() && fqdn.is_none() {
            return Err(ApiError::usage(
                "a vCenter must be identified by --vc-name or --vc-fqdn",
            ));
        }
        Ok(Self { name, fqdn })
    }

    pub fn by_name(name: impl Into<String>) -> ApiResult<Self> {
        Self::new(Some(name.into()), None)
    }

    fn filter(&self) -> Filter {
        Filter::new()
            .with_opt("vcName", self.name.as_deref())
            .with_opt("fqdn", self.fqdn.as_deref())
    }

    /// A vCenter matches when either given identifier matches exactly.
    pub fn matches(&self, vcenter: &VCenter) -> bool {
        self.name.as_deref() == Some(vcenter.name.as_str())
            || self.fqdn.as_deref() == Some(vcenter.fqdn.as_str())
    }

    fn ident(&self) -> String {
        match (&self.name, &self.fqdn) {
            (Some(name), Some(fqdn)) => format!("{name} ({fqdn})"),
            (Some(name), None) => name.clone(),
            (None, Some(fqdn)) => fqdn.clone(),
            (None, None) => String::new(),
        }
    }
}

/// Resolve a vCenter by name and/or FQDN.
pub async fn find_vcenter(client: &ApiClient, selector: &VCenterSelector) -> ApiResult<VCenter> {
    let candidates: Vec<VCenter> = find_by_filter(client, &selector.filter()).await?;
    first_exact(candidates, ResourceKind::VCenter, &selector.ident(), |vc| {
        selector.matches(vc)
    })
}

/// Split a comma separated list, dropping blanks.
pub fn split_csv(csv: &str) -> Vec<&str> {
    csv.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Resolve a comma separated list of vCenter names to UUIDs, in order.
///
/// Names that do not resolve are skipped with a warning, so the result can
/// be shorter than the input. It is never empty: a list without names is a
/// usage error, and a list where no name resolves is a lookup miss.
pub async fn resolve_vcenter_names(client: &ApiClient, csv: &str) -> ApiResult<Vec<String>> {
    let names = split_csv(csv);
    if names.is_empty() {
        return Err(ApiError::usage("--vc-names must name at least one vCenter"));
    }

    let mut uuids = Vec::new();
    for &name in &names {
        let selector = VCenterSelector::by_name(name)?;
        match find_vcenter(client, &selector).await {
            Ok(vcenter) => uuids.push(vcenter.uuid),
            Err(ApiError::LookupMiss { .. }) => {
                warn!(vcenter = name, "Skipping vCenter that does not exist");
            }
            Err(e) => return Err(e),
        }
    }

    if uuids.is_empty() {
        return Err(ApiError::lookup_miss(ResourceKind::VCenter, names.join(",")));
    }
    Ok(uuids)
}

/// All vRNI instances. This endpoint returns a bare JSON array.
pub async fn list_vrni(client: &ApiClient) -> ApiResult<Vec<VrniInstance>> {
    let url = client.url(VRNI_PATH)?;
    let response = client.get(url).await?;
    response.success_json("list vRNI instances")
}

/// Path of the vRNI collection.
pub const VRNI_PATH: &str = "vrni";

/// Resolve a vRNI instance by its FQDN/IP.
pub async fn find_vrni(client: &ApiClient, fqdn: &str) -> ApiResult<VrniInstance> {
    let instances = list_vrni(client).await?;
    first_exact(instances, ResourceKind::Vrni, fqdn, |vrni| vrni.ip == fqdn)
}
