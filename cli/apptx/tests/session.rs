//! Login and bearer token handling.

mod common;

use apptx::services::components;
use apptx::config::{Credentials, Endpoint, PollPolicy, Scheme, TlsMode};
use apptx::{ApiError, Config, Session};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{config, hal, TOKEN};

#[tokio::test]
async fn login_token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/discovery/session"))
        .and(body_json(json!({ "username": "admin", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Set-Cookie": TOKEN })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/discovery/components"))
        .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(hal(
            "components",
            json!([{ "compName": "nginx", "type": "WEB", "vmName": "web-1" }]),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::open(&config(&server)).await.unwrap();
    let found = components::list(&session).await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].comp_name, "nginx");
}

#[tokio::test]
async fn plain_token_field_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/discovery/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "tok-2" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/discovery/components"))
        .and(header("Authorization", "Bearer tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::open(&config(&server)).await.unwrap();
    assert!(components::list(&session).await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_credentials_fail_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/discovery/session"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = Session::open(&config(&server)).await.unwrap_err();
    assert!(matches!(err, ApiError::Authentication { status: 401, .. }));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn login_without_token_fails_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/discovery/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Set-Cookie": "" })))
        .mount(&server)
        .await;

    let err = Session::open(&config(&server)).await.unwrap_err();
    assert!(matches!(err, ApiError::Authentication { status: 200, .. }));
}

#[tokio::test]
async fn unparsable_login_response_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/discovery/session"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = Session::open(&config(&server)).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }), "{err:?}");
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn unreachable_appliance_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let host = listener.local_addr().unwrap().to_string();
    drop(listener);

    let config = Config::new(
        Endpoint::parse(&host, Scheme::Http).unwrap(),
        Credentials::new("admin", "secret").unwrap(),
        TlsMode::Insecure,
        PollPolicy::default(),
    );

    let err = Session::open(&config).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.hint().is_some());
}
