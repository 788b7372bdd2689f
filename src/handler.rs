//! Score update handler
//!
//! One invocation is one read-modify-write of the leaderboard file:
//! fetch, insert the new entry, re-rank, write back guarded by the revision
//! marker from the fetch. Any failure other than a wrong method becomes a 500
//! with the error message in the body.

use axum::http::{Method, StatusCode};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::config::HandlerConfig;
use crate::contents::ContentsClient;
use crate::error::{UpdateError, UpdateResult};
use crate::leaderboard::{Leaderboard, ScoreEntry, ScoreSubmission};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// Transport-neutral view of an inbound request.
///
/// The body is kept as raw bytes; it must be UTF-8 JSON to be accepted.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub method: Method,
    pub body: Vec<u8>,
}

impl HandlerRequest {
    pub fn new(method: Method, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method,
            body: body.into(),
        }
    }
}

/// Transport-neutral response.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl HandlerResponse {
    fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: TEXT_PLAIN,
            body: body.into(),
        }
    }

    fn from_error(err: &UpdateError) -> Self {
        match err {
            UpdateError::MethodNotAllowed => Self::text(err.status_code(), err.to_string()),
            _ => Self::text(err.status_code(), format!("Error: {}", err)),
        }
    }
}

/// Success payload: `{ "success": true, "updated": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateResponse {
    pub success: bool,
    pub updated: Vec<ScoreEntry>,
}

/// Parse a request body into a typed submission.
pub fn parse_submission(body: &str) -> UpdateResult<ScoreSubmission> {
    serde_json::from_str(body).map_err(|e| UpdateError::MalformedInput {
        message: e.to_string(),
    })
}

fn body_text(body: &[u8]) -> UpdateResult<&str> {
    std::str::from_utf8(body).map_err(|e| UpdateError::MalformedInput {
        message: format!("body is not valid UTF-8: {}", e),
    })
}

/// Records submitted scores in the remote leaderboard file.
pub struct ScoreHandler {
    contents: ContentsClient,
    conflict_retries: u32,
}

impl ScoreHandler {
    pub fn new(config: &HandlerConfig) -> UpdateResult<Self> {
        Ok(Self {
            contents: ContentsClient::new(config)?,
            conflict_retries: config.conflict_retries,
        })
    }

    /// Handle one inbound request end to end.
    pub async fn handle(&self, request: HandlerRequest) -> HandlerResponse {
        let span = tracing::info_span!(
            "update_score",
            invocation_id = %Uuid::new_v4(),
            method = %request.method,
        );

        async move {
            let result = self.process(&request).await;
            match result {
                Ok(board) => {
                    let payload = UpdateResponse {
                        success: true,
                        updated: board.into_entries(),
                    };
                    match serde_json::to_string(&payload) {
                        Ok(body) => HandlerResponse {
                            status: StatusCode::OK,
                            content_type: APPLICATION_JSON,
                            body,
                        },
                        Err(e) => {
                            error!(error = %e, "failed to serialize response");
                            HandlerResponse::text(
                                StatusCode::INTERNAL_SERVER_ERROR,
                                format!("Error: {}", e),
                            )
                        }
                    }
                }
                Err(err) => {
                    match &err {
                        UpdateError::MethodNotAllowed => warn!("rejected non-POST request"),
                        _ => error!(error = %err, "score update failed"),
                    }
                    HandlerResponse::from_error(&err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn process(&self, request: &HandlerRequest) -> UpdateResult<Leaderboard> {
        if request.method != Method::POST {
            return Err(UpdateError::MethodNotAllowed);
        }

        let submission = parse_submission(body_text(&request.body)?)?;
        let entry = submission.into_entry(Utc::now());
        self.record_entry(entry).await
    }

    /// Insert `entry` into the stored leaderboard and return the new board.
    ///
    /// With `conflict_retries > 0`, a stale-revision rejection triggers a
    /// fresh read-modify-write, up to that many extra times.
    pub async fn record_entry(&self, entry: ScoreEntry) -> UpdateResult<Leaderboard> {
        let mut attempt = 0;
        loop {
            match self.update_once(entry.clone()).await {
                Err(e) if e.is_conflict() && attempt < self.conflict_retries => {
                    attempt += 1;
                    warn!(
                        retry = attempt,
                        max_retries = self.conflict_retries,
                        "leaderboard changed underneath us, retrying"
                    );
                }
                other => return other,
            }
        }
    }

    async fn update_once(&self, entry: ScoreEntry) -> UpdateResult<Leaderboard> {
        let file = self.contents.fetch_file().await?;

        let mut board = match file.content.as_deref() {
            Some(raw) => Leaderboard::from_json(raw).map_err(|e| UpdateError::MalformedStoredData {
                message: e.to_string(),
            })?,
            None => Leaderboard::new(),
        };

        let name = entry.name.clone();
        let score = entry.score.clone();
        let placed = board.record(entry);

        let serialized = board
            .to_pretty_json()
            .map_err(|e| UpdateError::MalformedStoredData {
                message: e.to_string(),
            })?;

        // A missing sha is sent as-is; the store decides whether to accept it.
        self.contents.put_file(&serialized, file.sha.as_deref()).await?;

        info!(
            name = %name,
            score = %score,
            placed,
            entries = board.len(),
            "leaderboard updated"
        );
        Ok(board)
    }
}
