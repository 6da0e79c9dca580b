//! Mock e-signature org using wiremock for integration testing.
//!
//! Mounts the base-URI discovery endpoint so the access point resolves
//! back to the mock server itself, and offers fixture builders for the
//! listing and detail payloads.

#![allow(dead_code)]

use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inksync_client::auth::IntegrationKey;
use inksync_client::retry::RetryPolicy;
use inksync_client::{ClientConfig, EsignClient};

/// Integration key every mounted matcher expects.
pub const TEST_KEY: &str = "integration-key-123";

/// Admin account the client must exclude from bulk fetches.
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// A mock e-signature org.
pub struct MockEsignServer {
    server: MockServer,
}

impl MockEsignServer {
    /// Start a server whose v6 base-URI discovery points back at itself.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest/v6/baseUris"))
            .and(header("Authorization", format!("Bearer {TEST_KEY}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "apiAccessPoint": format!("{}/", server.uri()),
            })))
            .mount(&server)
            .await;
        Self { server }
    }

    /// The wiremock server, for mounting additional expectations.
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Base URI of the mock server.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Client configuration pointing at this server, with a
    /// millisecond-scale retry schedule.
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.uri(), IntegrationKey::new(TEST_KEY), ADMIN_EMAIL);
        config.timeout = Duration::from_secs(5);
        config.retry = RetryPolicy::new(3, Duration::from_millis(5), 2);
        config
    }

    /// Client with the default test configuration.
    pub fn client(&self) -> EsignClient {
        EsignClient::new(self.config()).unwrap()
    }

    /// Mount the user listing for the given ids.
    pub async fn mock_user_listing(&self, user_ids: &[&str]) {
        let stubs: Vec<Value> = user_ids.iter().map(|id| json!({"userId": id})).collect();
        Mock::given(method("GET"))
            .and(path("/api/rest/v6/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "userInfoList": stubs,
            })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Mount one user's detail response, optionally delayed.
    pub async fn mock_user_detail(&self, user_id: &str, detail: Value, delay: Option<Duration>) {
        let mut template = ResponseTemplate::new(200).set_body_json(detail);
        if let Some(delay) = delay {
            template = template.set_delay(delay);
        }
        Mock::given(method("GET"))
            .and(path(format!("/api/rest/v6/users/{user_id}")))
            .respond_with(template)
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Mount the group listing.
    pub async fn mock_group_listing(&self, groups: &[(&str, &str)]) {
        let entries: Vec<Value> = groups
            .iter()
            .map(|(id, name)| json!({"groupId": id, "groupName": name}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/api/rest/v6/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "groupInfoList": entries,
            })))
            .mount(&self.server)
            .await;
    }
}

/// Detail payload for an active user with explicit roles.
pub fn detail_json(email: &str, first_name: &str, last_name: &str, roles: &[&str]) -> Value {
    json!({
        "email": email,
        "firstName": first_name,
        "lastName": last_name,
        "userStatus": "ACTIVE",
        "roles": roles,
    })
}

/// Detail payload with an arbitrary status and no roles field.
pub fn detail_json_with_status(email: &str, status: &str) -> Value {
    json!({
        "email": email,
        "firstName": "Test",
        "lastName": "User",
        "userStatus": status,
    })
}
