//! HTTP transport: JSON-RPC over POST plus a one-way SSE channel.
//!
//! `POST /mcp` carries the request/response cycle; `GET /mcp` opens a
//! keep-alive Server-Sent-Events stream that exists only so clients can hold
//! a connection open (tool responses always travel on the POST path).
//! `GET /health` is a liveness probe. The server holds no session state: an
//! `mcp-session-id` header is echoed back when the caller supplies one,
//! nothing more.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::ACCEPT},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures::StreamExt;
use futures::stream;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::{Result, UpstageError};

use super::dispatcher::Dispatcher;
use super::protocol::{JsonRpcError, JsonRpcResponse};

const SESSION_HEADER: &str = "mcp-session-id";

#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Dispatcher>,
}

/// Liveness probe response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub transport: String,
    pub version: String,
}

/// Build the HTTP router.
///
/// CORS mirrors the request origin on every response, which also
/// short-circuits `OPTIONS` preflights with 200.
pub fn create_router(dispatcher: Arc<Dispatcher>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/mcp", post(mcp_post_handler).get(mcp_sse_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { dispatcher })
}

/// Serve the HTTP transport on localhost until the process exits.
pub async fn serve(dispatcher: Dispatcher, port: u16) -> Result<()> {
    let app = create_router(Arc::new(dispatcher));
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    info!("starting MCP HTTP transport on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(UpstageError::Io)?;
    axum::serve(listener, app).await.map_err(UpstageError::Io)?;
    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        transport: "http".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn mcp_post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !accept_allows_json(&headers) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Accept header must include application/json or text/event-stream"
            })),
        )
            .into_response();
    }

    let session = headers.get(SESSION_HEADER).cloned();

    let raw: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            debug!(error = %err, "unparseable request body");
            let response = JsonRpcResponse::error(
                None,
                JsonRpcError::parse_error(format!("invalid JSON: {}", err)),
            );
            return with_session(session, Json(response).into_response());
        }
    };

    match state.dispatcher.dispatch_value(raw).await {
        Some(response) => with_session(session, Json(response).into_response()),
        // Notifications are accepted with no body.
        None => with_session(session, StatusCode::ACCEPTED.into_response()),
    }
}

async fn mcp_sse_handler(headers: HeaderMap) -> Response {
    let accepts_sse = headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("text/event-stream"));
    if !accepts_sse {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Accept header must include text/event-stream"})),
        )
            .into_response();
    }

    debug!("SSE stream opened");

    let initial = stream::once(async {
        Ok::<_, Infallible>(
            Event::default()
                .event("connected")
                .data(json!({"status": "connected"}).to_string()),
        )
    });
    let events = initial.chain(stream::pending());

    Sse::new(events)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("keep-alive"),
        )
        .into_response()
}

fn accept_allows_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value.contains("application/json") || value.contains("text/event-stream")
        })
}

fn with_session(
    session: Option<axum::http::HeaderValue>,
    mut response: Response,
) -> Response {
    if let Some(session) = session {
        response.headers_mut().insert(SESSION_HEADER, session);
    }
    response
}
