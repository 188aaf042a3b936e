use crate::config::AppState;
use anyhow::Result;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use nexussync_core::NexusConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod handlers;

/// Start the API server
pub async fn serve(addr: &str, config: &NexusConfig) -> Result<()> {
    let state = AppState::new(config)?;

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down API server");
        })
        .await?;

    Ok(())
}

/// Create the API router
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/terminal/convert", post(handlers::convert))
        .route("/api/terminal/execute", post(handlers::execute))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "nexussync",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Error type for API handlers
#[derive(Debug)]
pub enum ApiError {
    /// Rejected request input (400)
    BadRequest(String),
    /// Anything unexpected (500)
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
            }
            Self::Internal(err) => {
                tracing::error!("Request failed: {:#}", err);
                let error_msg = err.to_string();
                let details = err.chain().skip(1).map(|e| e.to_string()).collect::<Vec<_>>().join(": ");

                let response = if details.is_empty() {
                    ErrorResponse::new(error_msg)
                } else {
                    ErrorResponse::with_details(error_msg, details)
                };

                (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::TerminalRunner;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use nexussync_core::{CommandExecutor, NaturalLanguageResolver};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState {
            resolver: Arc::new(NaturalLanguageResolver::new(None).unwrap()),
            terminal: Arc::new(TerminalRunner::new(
                "nexussync-missing-terminal-program",
                CommandExecutor::new(Duration::from_secs(5)),
            )),
        };
        create_router(state)
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "nexussync");
    }

    #[tokio::test]
    async fn test_convert_pattern_match() {
        let (status, body) = post_json(
            app(),
            "/api/terminal/convert",
            json!({ "text": "add the file report.pdf to my knowledge base" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "success": true,
                "command": "jaegis add-file report.pdf",
                "description": "Add file to knowledge base",
                "method": "pattern-match"
            })
        );
    }

    #[tokio::test]
    async fn test_convert_accepts_input_alias() {
        let (status, body) =
            post_json(app(), "/api/terminal/convert", json!({ "input": "sync my google drive" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["command"], "jaegis gdrive-sync");
    }

    #[tokio::test]
    async fn test_convert_without_match_falls_back_to_help() {
        let (_, body) =
            post_json(app(), "/api/terminal/convert", json!({ "text": "bake me a cake" })).await;

        assert_eq!(body["command"], "help");
        assert_eq!(body["method"], "fallback");
    }

    #[tokio::test]
    async fn test_convert_requires_input() {
        let (status, body) = post_json(app(), "/api/terminal/convert", json!({ "text": "   " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Input is required" }));

        let (status, _) = post_json(app(), "/api/terminal/convert", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_execute_help() {
        let (status, body) =
            post_json(app(), "/api/terminal/execute", json!({ "command": "help" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["command"], "help");
        assert!(body["output"].as_str().unwrap().contains("JAEGIS NexusSync Commands"));
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_execute_unknown_command() {
        let (status, body) =
            post_json(app(), "/api/terminal/execute", json!({ "command": "ls" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": "Unknown command: ls\nType \"help\" to see available commands.",
                "command": "ls"
            })
        );
    }

    #[tokio::test]
    async fn test_execute_failure_has_diagnostic() {
        let (status, body) =
            post_json(app(), "/api/terminal/execute", json!({ "command": "jaegis status" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Failed to start"));
    }

    #[tokio::test]
    async fn test_execute_requires_command() {
        let (status, body) =
            post_json(app(), "/api/terminal/execute", json!({ "command": "" })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Command is required");
    }

    #[tokio::test]
    async fn test_internal_error_response() {
        let err = anyhow::anyhow!("disk unplugged").context("Failed to read state");
        let response = ApiError::from(err).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Failed to read state");
        assert_eq!(body["details"], "disk unplugged");
    }
}
