//! HTTP front end
//!
//! Exposes the score handler on `/` and `/update-score`, plus a `/health`
//! probe for the hosting platform.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};

use crate::config::{HandlerConfig, ServerConfig};
use crate::handler::{HandlerRequest, HandlerResponse, ScoreHandler};

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<ScoreHandler>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", any(update_score))
        .route("/update-score", any(update_score))
        .route("/health", get(health))
        .with_state(state)
}

/// Build the handler and serve it until ctrl-c.
pub async fn run(server: ServerConfig, config: HandlerConfig) -> Result<()> {
    tracing::info!(config = ?config, "starting highscore function");

    let handler = ScoreHandler::new(&config).context("failed to build GitHub client")?;
    let app = build_router(AppState {
        handler: Arc::new(handler),
    });

    let addr = SocketAddr::new(server.host, server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind port")?;
    tracing::info!("highscore function listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn update_score(state: State<AppState>, method: Method, body: Bytes) -> HandlerResponse {
    let request = HandlerRequest::new(method, body.to_vec());
    state.handler.handle(request).await
}

async fn health() -> &'static str {
    "ok"
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        (self.status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::UpdateResponse;
    use crate::test_harness::TestHarness;

    async fn spawn_app(config: &HandlerConfig) -> String {
        let handler = ScoreHandler::new(config).unwrap();
        let app = build_router(AppState {
            handler: Arc::new(handler),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_health() {
        let harness = TestHarness::new().await;
        let base = spawn_app(&harness.config()).await;

        let response = reqwest::get(format!("{}/health", base)).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_get_is_method_not_allowed() {
        let harness = TestHarness::new().await;
        let base = spawn_app(&harness.config()).await;

        let response = reqwest::get(format!("{}/update-score", base)).await.unwrap();
        assert_eq!(response.status(), 405);
        assert_eq!(response.text().await.unwrap(), "Method Not Allowed");
    }

    #[tokio::test]
    async fn test_post_updates_leaderboard() {
        let mut harness = TestHarness::new().await;
        let _get = harness.mock_get_missing().create_async().await;
        let put = harness.mock_put_success(None).create_async().await;
        let base = spawn_app(&harness.config()).await;

        let response = reqwest::Client::new()
            .post(format!("{}/", base))
            .body(r#"{"name":"Ada","score":1200,"country":"GB"}"#)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()[reqwest::header::CONTENT_TYPE],
            "application/json"
        );
        let payload: UpdateResponse = response.json().await.unwrap();
        assert!(payload.success);
        assert_eq!(payload.updated.len(), 1);
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_with_bad_body_is_plain_text_500() {
        let harness = TestHarness::new().await;
        let base = spawn_app(&harness.config()).await;

        let response = reqwest::Client::new()
            .post(format!("{}/update-score", base))
            .body("nope")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        assert!(response.text().await.unwrap().starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_post_with_invalid_utf8_is_rejected() {
        let mut harness = TestHarness::new().await;
        let get = harness.mock_get_missing().expect(0).create_async().await;
        let put = harness.mock_put_status(200).expect(0).create_async().await;
        let base = spawn_app(&harness.config()).await;

        let mut body = br#"{"name":"A"#.to_vec();
        body.push(0xff);
        body.extend_from_slice(br#"","score":10,"country":"GB"}"#);

        let response = reqwest::Client::new()
            .post(format!("{}/update-score", base))
            .body(body)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        assert!(response
            .text()
            .await
            .unwrap()
            .starts_with("Error: invalid score submission: body is not valid UTF-8"));
        get.assert_async().await;
        put.assert_async().await;
    }
}
