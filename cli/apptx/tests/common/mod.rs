//! Mock appliance shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use apptx::config::{Credentials, Endpoint, PollPolicy, Scheme, TlsMode};
use apptx::{Config, Session};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TOKEN: &str = "test-session-token";

/// A mock appliance that accepts `admin`/`secret`.
pub async fn appliance() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/discovery/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Set-Cookie": TOKEN })))
        .mount(&server)
        .await;
    server
}

/// Polls back-to-back with a generous attempt budget.
pub fn fast_poll() -> PollPolicy {
    PollPolicy::new(Duration::ZERO, 20, Duration::from_secs(30)).unwrap()
}

pub fn config(server: &MockServer) -> Config {
    config_with_poll(server, fast_poll())
}

pub fn config_with_poll(server: &MockServer, poll: PollPolicy) -> Config {
    Config::new(
        Endpoint::parse(&server.address().to_string(), Scheme::Http).unwrap(),
        Credentials::new("admin", "secret").unwrap(),
        TlsMode::Insecure,
        poll,
    )
}

pub async fn session(server: &MockServer) -> Session {
    Session::open(&config(server)).await.unwrap()
}

/// HAL list body: `{"_embedded": {key: items}}`.
pub fn hal(key: &str, items: Value) -> Value {
    json!({ "_embedded": { key: items } })
}

pub fn accepted(task_id: &str) -> ResponseTemplate {
    ResponseTemplate::new(202).set_body_json(json!({ "task_id": task_id }))
}

/// Answers successive polls of a task with the scripted statuses, repeating
/// the last one once the script runs out.
pub struct ScriptedStatuses {
    statuses: Vec<&'static str>,
    calls: AtomicUsize,
}

impl ScriptedStatuses {
    pub fn new(statuses: &[&'static str]) -> Self {
        Self {
            statuses: statuses.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Respond for ScriptedStatuses {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let status = self
            .statuses
            .get(call)
            .or(self.statuses.last())
            .copied()
            .unwrap_or("UNKNOWN");
        ResponseTemplate::new(200).set_body_json(json!({ "status": status }))
    }
}

/// `GET tasks/{task_id}` answering with the script.
pub fn task(task_id: &str, statuses: &[&'static str]) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/discovery/tasks/{task_id}")))
        .respond_with(ScriptedStatuses::new(statuses))
}

pub fn service_account(uuid: &str, alias: &str) -> Value {
    json!({ "uuid": uuid, "alias": alias, "username": "administrator@vsphere.local" })
}

pub fn vcenter(uuid: &str, name: &str, fqdn: &str) -> Value {
    json!({ "irisVcenterUUID": uuid, "vcName": name, "fqdn": fqdn, "dataCenters": [] })
}
