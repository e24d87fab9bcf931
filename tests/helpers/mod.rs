#![allow(dead_code)]

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use wiremock::matchers;
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER: &str = "octo";
pub const REPO: &str = "policies";
pub const TOKEN: &str = "ghp_test_token";
pub const API_KEY: &str = "pat.acct.key";
pub const ACCOUNT: &str = "acct123";
pub const POLICY_PATH: &str = "/gateway/pm/api/v1/policies";

/// Mock GitHub and Harness servers for one test.
pub struct Servers {
    pub github: MockServer,
    pub harness: MockServer,
}

impl Servers {
    pub async fn start() -> Self {
        Self {
            github: MockServer::start().await,
            harness: MockServer::start().await,
        }
    }

    /// Environment with every required variable pointing at the mocks.
    pub fn env(&self) -> HashMap<String, String> {
        [
            ("HARNESSACCOUNTID", ACCOUNT.to_owned()),
            ("HARNESSAPIKEY", API_KEY.to_owned()),
            ("GITHUBTOKEN", TOKEN.to_owned()),
            ("GITHUBUSER", USER.to_owned()),
            ("GITHUBREPO", REPO.to_owned()),
            ("GITHUBAPIURL", self.github.uri()),
            (
                "HARNESSPOLICYURL",
                format!("{}{POLICY_PATH}", self.harness.uri()),
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
    }

    pub async fn github_requests(&self) -> usize {
        self.github.received_requests().await.unwrap().len()
    }

    pub async fn harness_requests(&self) -> usize {
        self.harness.received_requests().await.unwrap().len()
    }
}

pub fn lookup(env: HashMap<String, String>) -> impl Fn(&str) -> Option<String> {
    move |key| env.get(key).cloned()
}

pub fn contents_path(file: &str) -> String {
    if file.is_empty() {
        format!("/repos/{USER}/{REPO}/contents")
    } else {
        format!("/repos/{USER}/{REPO}/contents/{file}")
    }
}

/// Mount a root listing of `(path, type)` entries.
pub async fn mount_listing(server: &MockServer, entries: &[(&str, &str)]) {
    let body: Vec<serde_json::Value> = entries
        .iter()
        .map(|(path, kind)| json!({ "name": path, "path": path, "type": kind, "sha": "0" }))
        .collect();

    Mock::given(matchers::method("GET"))
        .and(matchers::path(contents_path("")))
        .and(matchers::header("authorization", format!("token {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Mount a base64-encoded file the way GitHub serves it.
pub async fn mount_file(server: &MockServer, file: &str, content: &str) {
    Mock::given(matchers::method("GET"))
        .and(matchers::path(contents_path(file)))
        .and(matchers::header("authorization", format!("token {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": file,
            "type": "file",
            "encoding": "base64",
            "content": STANDARD.encode(content),
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Accept any creation request with the given identifier.
pub async fn mount_create(server: &MockServer, identifier: &str, status: u16, body: &str) {
    Mock::given(matchers::method("POST"))
        .and(matchers::path(POLICY_PATH))
        .and(matchers::body_partial_json(json!({ "identifier": identifier })))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}
