//! A mock Jira Cloud site served by wiremock.
//!
//! The tokio runtime only drives mock registration; the code under test
//! uses blocking HTTP from the test thread.

use serde_json::{Value, json};
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const EMAIL: &str = "me@example.com";
pub const TOKEN: &str = "secret";
/// `base64("me@example.com:secret")`
pub const BASIC_AUTH: &str = "Basic bWVAZXhhbXBsZS5jb206c2VjcmV0";

pub struct MockJira {
    pub server: MockServer,
    runtime: Runtime,
}

impl MockJira {
    pub fn start() -> Self {
        let runtime = Runtime::new().expect("tokio runtime");
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn get_json(&self, route: &str, body: Value) {
        self.mount(
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_json(body)),
        );
    }

    /// `--url/--email/--token` flags pointing at this server.
    pub fn auth_args(&self) -> Vec<String> {
        vec![
            "--url".to_string(),
            self.uri(),
            "--email".to_string(),
            EMAIL.to_string(),
            "--token".to_string(),
            TOKEN.to_string(),
        ]
    }

    /// Search, fields and two issues with status history.
    pub fn mount_ops_project(&self) {
        self.mount(
            Mock::given(method("POST"))
                .and(path("/rest/api/3/search"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "startAt": 0,
                    "maxResults": 100,
                    "total": 2,
                    "issues": [{"key": "OPS-1"}, {"key": "OPS-2"}]
                }))),
        );
        self.get_json(
            "/rest/api/3/field",
            json!([
                {"id": "summary", "name": "Summary", "custom": false},
                {"id": "status", "name": "Status", "custom": false},
                {"id": "description", "name": "Description", "custom": false},
                {"id": "customfield_10016", "name": "Story Points", "custom": true}
            ]),
        );
        self.get_json("/rest/api/3/issue/OPS-1", fixture("issue_ops_1.json"));
        self.get_json("/rest/api/3/issue/OPS-2", fixture("issue_ops_2.json"));
    }
}

pub fn fixture(name: &str) -> Value {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let text = std::fs::read_to_string(&path).expect("fixture");
    serde_json::from_str(&text).expect("fixture json")
}
