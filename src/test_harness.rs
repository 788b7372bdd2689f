//! Mock GitHub contents API for tests
//!
//! Serves the leaderboard file endpoints from a local mockito server so the
//! client and handler can be exercised without a real repository.
//!
//! The `mock_*` helpers return unregistered mocks; tests add expectations and
//! then call `create_async`.

use std::sync::{Arc, Mutex};

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

use crate::config::HandlerConfig;
use crate::contents::{decode_content, encode_content};
use crate::leaderboard::ScoreEntry;

pub const TEST_TOKEN: &str = "test-token";
pub const TEST_BRANCH: &str = "main";
pub const FILE_PATH: &str = "/repos/octo/arcade/contents/data/highscores.json";

/// A test harness that stands in for the GitHub API
pub struct TestHarness {
    pub server: ServerGuard,
}

impl TestHarness {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        Self { server }
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Handler configuration pointing at the mock server.
    pub fn config(&self) -> HandlerConfig {
        HandlerConfig::new(TEST_TOKEN, "octo", "arcade", "data/highscores.json", TEST_BRANCH)
            .with_api_url(self.url())
    }

    fn get_file(&mut self) -> Mock {
        self.server
            .mock("GET", FILE_PATH)
            .match_query(Matcher::UrlEncoded("ref".to_string(), TEST_BRANCH.to_string()))
            .match_header("authorization", format!("Bearer {}", TEST_TOKEN).as_str())
            .match_header("accept", "application/vnd.github.v3+json")
    }

    /// Serve `raw` as the file content, base64-wrapped like GitHub does.
    pub fn mock_get_file(&mut self, raw: &str, sha: &str) -> Mock {
        let wrapped = encode_content(raw)
            .as_bytes()
            .chunks(60)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect::<Vec<_>>()
            .join("\n");

        self.get_file()
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "type": "file",
                    "encoding": "base64",
                    "path": "data/highscores.json",
                    "sha": sha,
                    "content": wrapped,
                })
                .to_string(),
            )
    }

    /// Serve a stored leaderboard.
    pub fn mock_get_entries(&mut self, entries: &[ScoreEntry], sha: &str) -> Mock {
        let raw = serde_json::to_string_pretty(entries).unwrap();
        self.mock_get_file(&raw, sha)
    }

    /// First run: the file does not exist yet.
    pub fn mock_get_missing(&mut self) -> Mock {
        self.get_file()
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(json!({ "message": "Not Found" }).to_string())
    }

    pub fn mock_get_raw(&mut self, status: usize, body: String) -> Mock {
        self.get_file()
            .with_status(status)
            .with_body(body)
    }

    /// Accept a write carrying `sha` (or none) on the test branch.
    pub fn mock_put_success(&mut self, sha: Option<&str>) -> Mock {
        let mut expected = json!({
            "message": "Updated highscores",
            "branch": TEST_BRANCH,
        });
        if let Some(sha) = sha {
            expected["sha"] = json!(sha);
        }

        self.server
            .mock("PUT", FILE_PATH)
            .match_header("authorization", format!("Bearer {}", TEST_TOKEN).as_str())
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(expected))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "content": { "sha": "sha-new" } }).to_string())
    }

    /// Accept any write and keep the last JSON body sent.
    pub fn mock_put_capture(&mut self) -> (Mock, Arc<Mutex<Option<Value>>>) {
        let written = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&written);

        let mock = self
            .server
            .mock("PUT", FILE_PATH)
            .match_request(move |request| {
                let body = request
                    .body()
                    .ok()
                    .and_then(|raw| serde_json::from_slice::<Value>(raw).ok());
                *sink.lock().unwrap() = body;
                true
            })
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "content": { "sha": "sha-new" } }).to_string());

        (mock, written)
    }

    pub fn mock_put_status(&mut self, status: usize) -> Mock {
        self.server
            .mock("PUT", FILE_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(json!({ "message": "rejected" }).to_string())
    }
}

/// Decode the leaderboard carried in a captured PUT body.
pub fn written_entries(put_body: &Value) -> Vec<Value> {
    let encoded = put_body["content"].as_str().unwrap();
    serde_json::from_str(&decode_content(encoded).unwrap()).unwrap()
}
