//! GitHub contents API client.
//!
//! Reads and writes a single repository file. All status code handling for
//! the remote store lives here; callers only see `UpdateError` variants.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::HandlerConfig;
use crate::error::{UpdateError, UpdateResult};

const GITHUB_JSON: &str = "application/vnd.github.v3+json";
const USER_AGENT_VALUE: &str = concat!("highscore-function/", env!("CARGO_PKG_VERSION"));

/// File as returned by the read step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteFile {
    /// Decoded UTF-8 content; `None` when the file is missing or empty.
    pub content: Option<String>,
    /// Revision marker to send back with the write.
    pub sha: Option<String>,
}

/// Subset of the contents API GET response we use.
#[derive(Debug, Clone, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    sha: Option<String>,
}

/// Body of the contents API PUT request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PutFileRequest<'a> {
    pub message: &'a str,
    pub content: String, // base64
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
    pub branch: &'a str,
}

/// API client for the leaderboard file
pub struct ContentsClient {
    url: String,
    branch: String,
    token: String,
    commit_message: String,
    client: reqwest::Client,
}

impl ContentsClient {
    pub fn new(config: &HandlerConfig) -> UpdateResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));

        // GitHub rejects requests without a User-Agent.
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT_VALUE)
            .default_headers(default_headers)
            .build()
            .map_err(|e| UpdateError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            url: config.contents_url(),
            branch: config.branch.clone(),
            token: config.token.clone(),
            commit_message: config.commit_message.clone(),
            client,
        })
    }

    /// URL of the file on the contents API.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the current file content and revision marker.
    ///
    /// A 404 is the first-run case and yields an empty `RemoteFile`.
    pub async fn fetch_file(&self) -> UpdateResult<RemoteFile> {
        debug!(url = %self.url, branch = %self.branch, "fetching leaderboard file");

        let response = self
            .client
            .get(&self.url)
            .query(&[("ref", self.branch.as_str())])
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("leaderboard file not found, starting empty");
            return Ok(RemoteFile::default());
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(UpdateError::UpstreamRead {
                message: format!("{}: {}", status, error_text),
            });
        }

        let data: ContentsResponse = response
            .json()
            .await
            .map_err(|e| UpdateError::UpstreamRead {
                message: format!("failed to parse contents response: {}", e),
            })?;

        let content = match data.content.as_deref() {
            Some(encoded) if !encoded.trim().is_empty() => Some(decode_content(encoded)?),
            _ => None,
        };

        Ok(RemoteFile {
            content,
            sha: data.sha,
        })
    }

    /// Write `content` back, guarded by the revision marker from the read.
    pub async fn put_file(&self, content: &str, sha: Option<&str>) -> UpdateResult<()> {
        let request = PutFileRequest {
            message: &self.commit_message,
            content: encode_content(content),
            sha,
            branch: &self.branch,
        };

        debug!(url = %self.url, sha = ?sha, bytes = content.len(), "writing leaderboard file");

        let response = self
            .client
            .put(&self.url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::CONFLICT {
            return Err(UpdateError::WriteConflict);
        }

        Err(UpdateError::UpstreamWrite {
            status: status.as_u16(),
            reason: status
                .canonical_reason()
                .map(String::from)
                .unwrap_or_else(|| status.as_str().to_string()),
        })
    }
}

/// Encode file content the way the contents API expects it.
pub fn encode_content(raw: &str) -> String {
    STANDARD.encode(raw.as_bytes())
}

/// Decode contents API base64, which GitHub wraps at 60 columns.
pub fn decode_content(encoded: &str) -> UpdateResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| UpdateError::MalformedStoredData {
            message: format!("invalid base64: {}", e),
        })?;

    String::from_utf8(bytes).map_err(|e| UpdateError::MalformedStoredData {
        message: format!("invalid UTF-8: {}", e),
    })
}
