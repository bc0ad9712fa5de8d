//! vRNI (network insight) registrations.
//!
//! vRNI instances are addressed by their FQDN, which the appliance stores in
//! the `ip` field. Updates are full PUTs, so every mutation after register
//! re-sends the credentials and vCenter list of the current instance.

use reqwest::Method;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::lookup::{self, VRNI_PATH};
use crate::models::{ResourceKind, VrniInstance, VrniRequest};
use crate::operation::{run_mutation, Mutation, Outcome};
use crate::session::Session;

/// How the appliance authenticates against the vRNI instance.
#[derive(Clone, PartialEq, Eq)]
pub enum VrniAuth {
    /// SaaS instances authenticate with an API token.
    Saas { api_token: String },

    /// On-premises instances use a registered service account.
    OnPrem { service_account_alias: String },
}

impl VrniAuth {
    /// Validate the credential flags for the chosen deployment type.
    pub fn new(
        is_saas: bool,
        api_token: Option<String>,
        service_account_alias: Option<String>,
    ) -> ApiResult<Self> {
        let api_token = api_token.filter(|t| !t.trim().is_empty());
        let alias = service_account_alias.filter(|a| !a.trim().is_empty());

        match (is_saas, api_token, alias) {
            (true, Some(api_token), None) => Ok(Self::Saas { api_token }),
            (true, None, _) => Err(ApiError::usage(
                "a SaaS vRNI instance requires --vrni-api-token",
            )),
            (true, Some(_), Some(_)) => Err(ApiError::usage(
                "a SaaS vRNI instance authenticates with --vrni-api-token, not --sa-alias",
            )),
            (false, None, Some(service_account_alias)) => Ok(Self::OnPrem {
                service_account_alias,
            }),
            (false, _, None) => Err(ApiError::usage(
                "an on-premises vRNI instance requires --sa-alias",
            )),
            (false, Some(_), Some(_)) => Err(ApiError::usage(
                "--vrni-api-token is only valid together with --is-saas",
            )),
        }
    }

    pub fn is_saas(&self) -> bool {
        matches!(self, Self::Saas { .. })
    }
}

impl std::fmt::Debug for VrniAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Saas { .. } => f.write_str("Saas { api_token: <redacted> }"),
            Self::OnPrem {
                service_account_alias,
            } => f
                .debug_struct("OnPrem")
                .field("service_account_alias", service_account_alias)
                .finish(),
        }
    }
}

/// A vRNI instance to register.
#[derive(Debug, Clone)]
pub struct VrniRegistration {
    pub fqdn: String,
    pub alias: Option<String>,
    pub vcenter_names: String,
    pub auth: VrniAuth,
    pub certificate_thumbprint: Option<String>,
}

impl VrniRegistration {
    pub fn new(fqdn: impl Into<String>, vcenter_names: impl Into<String>, auth: VrniAuth) -> ApiResult<Self> {
        let registration = Self {
            fqdn: fqdn.into(),
            alias: None,
            vcenter_names: vcenter_names.into(),
            auth,
            certificate_thumbprint: None,
        };
        if registration.fqdn.trim().is_empty() {
            return Err(ApiError::usage("--vrni-fqdn is required"));
        }
        if lookup::split_csv(&registration.vcenter_names).is_empty() {
            return Err(ApiError::usage(
                "registering a vRNI instance requires --vc-names",
            ));
        }
        Ok(registration)
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn with_certificate_thumbprint(mut self, thumbprint: Option<String>) -> Self {
        self.certificate_thumbprint = thumbprint.filter(|t| !t.trim().is_empty());
        self
    }
}

/// Append `additions` to `current`, skipping UUIDs already present.
pub fn merge_vcenters(current: &[String], additions: &[String]) -> Vec<String> {
    let mut merged = current.to_vec();
    for uuid in additions {
        if !merged.contains(uuid) {
            merged.push(uuid.clone());
        }
    }
    merged
}

/// `current` minus `removals`, keeping the order of `current`.
pub fn subtract_vcenters(current: &[String], removals: &[String]) -> Vec<String> {
    current
        .iter()
        .filter(|uuid| !removals.contains(uuid))
        .cloned()
        .collect()
}

/// Register a vRNI instance. An instance with the same FQDN is rejected.
pub async fn register(session: &Session, registration: &VrniRegistration) -> ApiResult<Outcome> {
    let client = session.client();

    let existing = lookup::list_vrni(client).await?;
    if existing.iter().any(|vrni| vrni.ip == registration.fqdn) {
        warn!(fqdn = %registration.fqdn, "vRNI is already registered");
        return Err(ApiError::AlreadyExists {
            kind: ResourceKind::Vrni,
            ident: registration.fqdn.clone(),
        });
    }

    let vc_uuids = lookup::resolve_vcenter_names(client, &registration.vcenter_names).await?;
    let (api_token, service_account_uuid) = match &registration.auth {
        VrniAuth::Saas { api_token } => (api_token.clone(), String::new()),
        VrniAuth::OnPrem {
            service_account_alias,
        } => {
            let account = lookup::find_service_account(client, service_account_alias).await?;
            (String::new(), account.uuid)
        }
    };

    let request = VrniRequest {
        alias: registration.alias.clone(),
        ip: registration.fqdn.clone(),
        api_token,
        is_saas: registration.auth.is_saas(),
        vc_uuids,
        service_account_uuid,
        certificate_thumbprint: registration.certificate_thumbprint.clone(),
        vrni_type: None,
    };

    let url = client.url(VRNI_PATH)?;
    let action = format!("register vRNI '{}'", registration.fqdn);
    run_mutation(session, Mutation::new(Method::POST, url, action).json(&request)).await
}

/// Remove the vRNI registration for `fqdn`.
pub async fn unregister(session: &Session, fqdn: &str) -> ApiResult<Outcome> {
    let instance = lookup::find_vrni(session.client(), fqdn).await?;
    let url = session
        .client()
        .url(&format!("{VRNI_PATH}/{}", instance.id))?;

    let action = format!("delete vRNI '{fqdn}'");
    run_mutation(session, Mutation::new(Method::DELETE, url, action)).await
}

/// Replace the credentials of a registered instance, keeping its vCenters.
///
/// The new credentials must match the instance's deployment type.
pub async fn update_credentials(session: &Session, fqdn: &str, auth: &VrniAuth) -> ApiResult<Outcome> {
    let client = session.client();
    let instance = lookup::find_vrni(client, fqdn).await?;

    if instance.is_saas != auth.is_saas() {
        let expected = if instance.is_saas {
            "--vrni-api-token"
        } else {
            "--sa-alias"
        };
        return Err(ApiError::usage(format!(
            "vRNI '{fqdn}' is {} and needs {expected}",
            if instance.is_saas { "SaaS" } else { "on-premises" },
        )));
    }

    let mut request = current_request(&instance, instance.vcenter_uuids());
    match auth {
        VrniAuth::Saas { api_token } => request.api_token = api_token.clone(),
        VrniAuth::OnPrem {
            service_account_alias,
        } => {
            let account = lookup::find_service_account(client, service_account_alias).await?;
            request.service_account_uuid = account.uuid;
        }
    }

    put_instance(
        session,
        &instance,
        &request,
        format!("update credentials of vRNI '{fqdn}'"),
    )
    .await
}

/// Attach more vCenters to a registered instance.
pub async fn add_vcenters(session: &Session, fqdn: &str, vcenter_names: &str) -> ApiResult<Outcome> {
    let client = session.client();
    let instance = lookup::find_vrni(client, fqdn).await?;
    let additions = lookup::resolve_vcenter_names(client, vcenter_names).await?;

    let current = instance.vcenter_uuids();
    let merged = merge_vcenters(&current, &additions);
    if merged.len() == current.len() {
        info!(fqdn, "vCenters already attached to vRNI");
        return Ok(Outcome::Unchanged {
            reason: format!("vRNI '{fqdn}' already includes the requested vCenters"),
        });
    }

    let request = current_request(&instance, merged);
    put_instance(
        session,
        &instance,
        &request,
        format!("add vCenters to vRNI '{fqdn}'"),
    )
    .await
}

/// Detach vCenters from a registered instance.
pub async fn remove_vcenters(session: &Session, fqdn: &str, vcenter_names: &str) -> ApiResult<Outcome> {
    let client = session.client();
    let instance = lookup::find_vrni(client, fqdn).await?;
    let removals = lookup::resolve_vcenter_names(client, vcenter_names).await?;

    let current = instance.vcenter_uuids();
    let remaining = subtract_vcenters(&current, &removals);
    if remaining.len() == current.len() {
        info!(fqdn, "None of the vCenters are attached to vRNI");
        return Ok(Outcome::Unchanged {
            reason: format!("vRNI '{fqdn}' does not include the requested vCenters"),
        });
    }

    let request = current_request(&instance, remaining);
    put_instance(
        session,
        &instance,
        &request,
        format!("remove vCenters from vRNI '{fqdn}'"),
    )
    .await
}

/// All registered vRNI instances.
pub async fn list(session: &Session) -> ApiResult<Vec<VrniInstance>> {
    lookup::list_vrni(session.client()).await
}

/// Request body that re-sends the instance's current credentials.
fn current_request(instance: &VrniInstance, vc_uuids: Vec<String>) -> VrniRequest {
    let (api_token, service_account_uuid) = if instance.is_saas {
        (instance.api_token.clone(), String::new())
    } else {
        let uuid = instance
            .service_account
            .as_ref()
            .map(|sa| sa.uuid.clone())
            .unwrap_or_default();
        (String::new(), uuid)
    };

    VrniRequest {
        alias: Some(instance.alias.clone()).filter(|a| !a.is_empty()),
        ip: instance.ip.clone(),
        api_token,
        is_saas: instance.is_saas,
        vc_uuids,
        service_account_uuid,
        certificate_thumbprint: None,
        vrni_type: Some(instance.vrni_type.clone()).filter(|t| !t.is_empty()),
    }
}

async fn put_instance(
    session: &Session,
    instance: &VrniInstance,
    request: &VrniRequest,
    action: String,
) -> ApiResult<Outcome> {
    let url = session
        .client()
        .url(&format!("{VRNI_PATH}/{}", instance.id))?;
    run_mutation(session, Mutation::new(Method::PUT, url, action).json(request)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceAccountRef;
    use rstest::rstest;

    fn uuids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(&["A", "B", "C"], &["B"], &["A", "C"])]
    #[case(&["A", "B", "C"], &["A", "C"], &["B"])]
    #[case(&["A", "B"], &["X"], &["A", "B"])]
    #[case(&["A", "B"], &["A", "B"], &[])]
    fn subtract_keeps_order(#[case] current: &[&str], #[case] removals: &[&str], #[case] expected: &[&str]) {
        assert_eq!(
            subtract_vcenters(&uuids(current), &uuids(removals)),
            uuids(expected)
        );
    }

    #[rstest]
    #[case(&["A"], &["B", "C"], &["A", "B", "C"])]
    #[case(&["A", "B"], &["B", "C", "C"], &["A", "B", "C"])]
    #[case(&[], &["A"], &["A"])]
    fn merge_appends_without_duplicates(
        #[case] current: &[&str],
        #[case] additions: &[&str],
        #[case] expected: &[&str],
    ) {
        assert_eq!(
            merge_vcenters(&uuids(current), &uuids(additions)),
            uuids(expected)
        );
    }

    #[test]
    fn auth_validation() {
        assert!(matches!(
            VrniAuth::new(true, Some("tok".into()), None),
            Ok(VrniAuth::Saas { .. })
        ));
        assert!(matches!(
            VrniAuth::new(false, None, Some("net-admin".into())),
            Ok(VrniAuth::OnPrem { .. })
        ));

        for (is_saas, token, alias) in [
            (true, None, Some("net-admin")),
            (true, Some("tok"), Some("net-admin")),
            (false, Some("tok"), None),
            (false, None, None),
        ] {
            let result = VrniAuth::new(is_saas, token.map(String::from), alias.map(String::from));
            assert!(matches!(result, Err(ApiError::Usage(_))), "{is_saas} {token:?} {alias:?}");
        }
    }

    #[test]
    fn saas_token_is_redacted() {
        let auth = VrniAuth::new(true, Some("secret-token".into()), None).unwrap();
        assert!(!format!("{auth:?}").contains("secret-token"));
    }

    #[test]
    fn current_request_keeps_on_prem_account() {
        let instance = VrniInstance {
            id: "v1".into(),
            ip: "vrni.example.com".into(),
            is_saas: false,
            service_account: Some(ServiceAccountRef {
                uuid: "sa-1".into(),
                alias: "net-admin".into(),
            }),
            ..VrniInstance::default()
        };

        let request = current_request(&instance, uuids(&["A"]));
        assert_eq!(request.service_account_uuid, "sa-1");
        assert_eq!(request.api_token, "");
        assert_eq!(request.vc_uuids, uuids(&["A"]));
        assert_eq!(request.alias, None);
    }

    #[test]
    fn registration_requires_vcenters() {
        let auth = VrniAuth::new(true, Some("tok".into()), None).unwrap();
        assert!(VrniRegistration::new("vrni.example.com", " , ", auth.clone()).is_err());
        assert!(VrniRegistration::new("", "VC1", auth.clone()).is_err());
        assert!(VrniRegistration::new("vrni.example.com", "VC1", auth).is_ok());
    }
}
