//! Streamable HTTP transport
//!
//! Stateless: every `POST /mcp` gets a fresh [`McpServer`] session over the
//! shared tool handler and answers with a single JSON response.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde_json::json;

use crate::error::{DoctocMcpError, McpError, Result};
use crate::mcp::server::{McpServer, SERVER_NAME};
use crate::mcp::tools::ToolHandler;

/// Build the HTTP router
pub fn router(tool_handler: Arc<ToolHandler>) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp).options(handle_preflight))
        .route("/health", get(handle_health).options(handle_preflight))
        .fallback(handle_fallback)
        .layer(middleware::map_response(with_cors))
        .with_state(tool_handler)
}

/// Serve the router until the process receives Ctrl-C
pub async fn serve(tool_handler: Arc<ToolHandler>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("[{}] HTTP server listening on port {}", SERVER_NAME, port);
    tracing::info!("[{}] MCP endpoint: http://localhost:{}/mcp", SERVER_NAME, port);
    tracing::info!("[{}] Health check: http://localhost:{}/health", SERVER_NAME, port);

    axum::serve(listener, router(tool_handler))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("[{}] shutting down", SERVER_NAME);
        })
        .await
        .map_err(|e| {
            DoctocMcpError::Mcp(McpError::TransportError {
                message: e.to_string(),
            })
        })
}

async fn handle_mcp(State(tool_handler): State<Arc<ToolHandler>>, body: String) -> Response {
    let mut session = McpServer::new(tool_handler);
    match session.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn handle_health(State(tool_handler): State<Arc<ToolHandler>>) -> Response {
    Json(json!({
        "status": "ok",
        "server": SERVER_NAME,
        "tools": tool_handler.list_tools().len(),
    }))
    .into_response()
}

async fn handle_preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn handle_fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return handle_preflight().await.into_response();
    }

    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "Not found. Use POST /mcp or GET /health"})),
    )
        .into_response()
}

async fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, GET, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, mcp-session-id"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("mcp-session-id"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let handler = ToolHandler::from_config(&Config::default()).unwrap();
        router(Arc::new(handler))
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_tool_count() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["tools"], 30);
    }

    #[tokio::test]
    async fn test_mcp_list_tools() {
        let request = Request::post("/mcp")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 30);
    }

    #[tokio::test]
    async fn test_mcp_notification_is_accepted() {
        let request = Request::post("/mcp")
            .body(Body::from(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_preflight_and_unknown_route() {
        let preflight = Request::builder()
            .method(Method::OPTIONS)
            .uri("/mcp")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(preflight).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
