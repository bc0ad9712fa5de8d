//! vCenter orchestration against a mock appliance.

mod common;

use apptx::lookup::VCenterSelector;
use apptx::models::ResourceKind;
use apptx::services::vcenters::{self, ScanOptions, ScanScope, VCenterRegistration};
use apptx::tasks::TaskStatus;
use apptx::{ApiError, Outcome};
use serde_json::json;
use tokio::sync::watch;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{accepted, appliance, hal, service_account, session, task, vcenter};

async fn mount_service_accounts(server: &MockServer, accounts: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/discovery/serviceaccounts"))
        .and(query_param("alias", "vc-admin"))
        .and(query_param("page", "0"))
        .and(query_param("size", "10"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(hal("serviceAccounts", accounts)),
        )
        .mount(server)
        .await;
}

fn registration() -> VCenterRegistration {
    VCenterRegistration::new("vc1.example.com", "VC1", "vc-admin").unwrap()
}

#[tokio::test]
async fn register_posts_documented_body_and_follows_task() {
    let server = appliance().await;
    mount_service_accounts(&server, json!([service_account("sa-123", "vc-admin")])).await;
    Mock::given(method("POST"))
        .and(path("/discovery/vcenters"))
        .and(query_param("action", "register"))
        .and(body_json(json!({
            "fqdn": "vc1.example.com",
            "vcName": "VC1",
            "vcServiceAccountUUID": "sa-123"
        })))
        .respond_with(accepted("t-reg"))
        .expect(1)
        .mount(&server)
        .await;
    task("t-reg", &["IN_PROGRESS", "SUCCESS"])
        .expect(2)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let outcome = vcenters::register(&session, &registration()).await.unwrap();

    assert_eq!(
        outcome,
        Outcome::TaskSucceeded {
            task_id: "t-reg".to_string()
        }
    );
}

#[tokio::test]
async fn register_forwards_explicit_thumbprint() {
    let server = appliance().await;
    mount_service_accounts(&server, json!([service_account("sa-123", "vc-admin")])).await;
    Mock::given(method("POST"))
        .and(path("/discovery/vcenters"))
        .and(body_json(json!({
            "fqdn": "vc1.example.com",
            "vcName": "VC1",
            "vcServiceAccountUUID": "sa-123",
            "certificateThumbprint": "AB:CD"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let registration = registration().with_certificate_thumbprint(Some("AB:CD".to_string()));
    let outcome = vcenters::register(&session, &registration).await.unwrap();
    assert_eq!(outcome, Outcome::Completed { status: 200 });
}

#[tokio::test]
async fn missing_service_account_never_posts() {
    let server = appliance().await;
    // Partial match only.
    mount_service_accounts(&server, json!([service_account("sa-9", "vc-admin-old")])).await;
    Mock::given(method("POST"))
        .and(path("/discovery/vcenters"))
        .respond_with(accepted("never"))
        .expect(0)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let err = vcenters::register(&session, &registration())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApiError::LookupMiss {
            kind: ResourceKind::ServiceAccount,
            ref ident,
        } if ident == "vc-admin"
    ));
}

#[tokio::test]
async fn rejected_register_is_a_remote_error() {
    let server = appliance().await;
    mount_service_accounts(&server, json!([service_account("sa-123", "vc-admin")])).await;
    Mock::given(method("POST"))
        .and(path("/discovery/vcenters"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate"))
        .mount(&server)
        .await;

    let session = session(&server).await;
    let err = vcenters::register(&session, &registration())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Remote { status: 409, .. }));
    assert_eq!(
        err.to_string(),
        "Failed to register vCenter 'VC1'. Response Code: 409"
    );
}

#[tokio::test]
async fn failed_task_is_reported() {
    let server = appliance().await;
    mount_service_accounts(&server, json!([service_account("sa-123", "vc-admin")])).await;
    Mock::given(method("POST"))
        .and(path("/discovery/vcenters"))
        .respond_with(accepted("t-bad"))
        .mount(&server)
        .await;
    task("t-bad", &["IN_PROGRESS", "FAILED"])
        .expect(2)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let err = vcenters::register(&session, &registration())
        .await
        .unwrap_err();

    match err {
        ApiError::TaskFailed {
            task_id, status, ..
        } => {
            assert_eq!(task_id, "t-bad");
            assert_eq!(status, TaskStatus::Other("FAILED".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn sync_resolves_by_fqdn() {
    let server = appliance().await;
    Mock::given(method("GET"))
        .and(path("/discovery/vcenters"))
        .and(query_param("fqdn", "vc1.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hal(
            "vcenters",
            json!([
                vcenter("vc-10", "VC10", "vc10.example.com"),
                vcenter("vc-1", "VC1", "vc1.example.com")
            ]),
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/discovery/vcenters/vc-1/sync"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let selector = VCenterSelector::new(None, Some("vc1.example.com".to_string())).unwrap();
    let outcome = vcenters::sync(&session, &selector).await.unwrap();
    assert_eq!(outcome, Outcome::Completed { status: 204 });
}

#[tokio::test]
async fn interrupted_session_sends_no_mutation() {
    let server = appliance().await;
    Mock::given(method("GET"))
        .and(path("/discovery/vcenters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hal(
            "vcenters",
            json!([vcenter("vc-1", "VC1", "vc1.example.com")]),
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/discovery/vcenters/vc-1/sync"))
        .respond_with(accepted("t-sync"))
        .expect(0)
        .mount(&server)
        .await;

    let (_tx, rx) = watch::channel(true);
    let session = session(&server).await.with_cancellation(rx);
    let selector = VCenterSelector::by_name("VC1").unwrap();

    let err = vcenters::sync(&session, &selector).await.unwrap_err();
    assert!(matches!(err, ApiError::Interrupted { .. }), "{err:?}");
}

#[tokio::test]
async fn scan_components_sends_scoped_filters() {
    let server = appliance().await;
    Mock::given(method("GET"))
        .and(path("/discovery/vcenters"))
        .and(query_param("vcName", "VC1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hal(
            "vcenters",
            json!([{
                "irisVcenterUUID": "vc-1",
                "vcName": "VC1",
                "fqdn": "vc1.example.com",
                "dataCenters": [{
                    "modId": "dc-1", "name": "DC1", "type": "Datacenter",
                    "clusters": [
                        { "modId": "c-1", "name": "prod", "type": "Cluster", "resourcePools": [] },
                        { "modId": "c-2", "name": "dev", "type": "Cluster", "resourcePools": [] }
                    ],
                    "folders": [{ "modId": "f-1", "name": "apps", "type": "Folder" }]
                }]
            }]),
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/discovery/vcenters/vc-1/components"))
        .and(body_json(json!({
            "componentScan": true,
            "applyCredentialPolicy": false,
            "binaryAnalysis": true,
            "filters": {
                "modId": "dc-1", "name": "DC1", "type": "Datacenter",
                "clusters": [
                    { "modId": "c-1", "name": "prod", "type": "Cluster", "resourcePools": [] }
                ],
                "folders": []
            }
        })))
        .respond_with(accepted("t-scan"))
        .expect(1)
        .mount(&server)
        .await;
    task("t-scan", &["SUCCESS"]).mount(&server).await;

    let session = session(&server).await;
    let selector = VCenterSelector::by_name("VC1").unwrap();
    let scope = ScanScope {
        datacenter: Some("DC1".to_string()),
        cluster: Some("prod".to_string()),
        ..ScanScope::default()
    };
    let options = ScanOptions {
        apply_credential_policy: false,
        binary_analysis: true,
    };

    let outcome = vcenters::scan_components(&session, &selector, &scope, options)
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::TaskSucceeded { .. }));
}

#[tokio::test]
async fn discover_topology_with_full_scope() {
    let server = appliance().await;
    Mock::given(method("GET"))
        .and(path("/discovery/vcenters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hal(
            "vcenters",
            json!([vcenter("vc-1", "VC1", "vc1.example.com")]),
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/discovery/vcenters/vc-1/correlation"))
        .and(body_json(json!({
            "filters": { "modId": "", "name": "", "type": "", "clusters": [], "folders": [] }
        })))
        .respond_with(accepted("t-topo"))
        .expect(1)
        .mount(&server)
        .await;
    task("t-topo", &["NOT_STARTED", "SUCCESS"])
        .mount(&server)
        .await;

    let session = session(&server).await;
    let selector = VCenterSelector::by_name("VC1").unwrap();
    let outcome = vcenters::discover_topology(&session, &selector, &ScanScope::default())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::TaskSucceeded {
            task_id: "t-topo".to_string()
        }
    );
}

#[tokio::test]
async fn unknown_vcenter_never_deletes() {
    let server = appliance().await;
    Mock::given(method("GET"))
        .and(path("/discovery/vcenters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hal("vcenters", json!([]))))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let selector = VCenterSelector::by_name("VC1").unwrap();
    let err = vcenters::unregister(&session, &selector).await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::LookupMiss {
            kind: ResourceKind::VCenter,
            ..
        }
    ));
}
