//! HTTP surface: MCP over streamable HTTP plus the plain health endpoints.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use rmcp::ServerHandler;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::health::{self, ServiceStatus};

const EVENT_STREAM: &str = "text/event-stream";
const MCP_ACCEPT: &str = "application/json, text/event-stream";

/// Router for one MCP service, mounted at `/` and `/mcp`.
pub fn router<S>(handler: S, status: ServiceStatus) -> Router
where
    S: ServerHandler + Clone + Send + Sync + 'static,
{
    let sessions = Arc::new(LocalSessionManager::default());
    let mcp = |handler: S| {
        StreamableHttpService::new(
            move || Ok(handler.clone()),
            sessions.clone(),
            StreamableHttpServerConfig::default(),
        )
    };

    let mcp_routes = Router::new()
        .route_service("/", mcp(handler.clone()))
        .nest_service("/mcp", mcp(handler))
        .layer(middleware::from_fn(normalize_accept));

    Router::new()
        .route("/ping", get(ping))
        .merge(health::router(status))
        .merge(mcp_routes)
        .layer(cors())
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([CONTENT_TYPE, CACHE_CONTROL, HeaderName::from_static("x-request-id")])
}

async fn ping() -> &'static str {
    warn!(event_name = "http.ping", correlation_id = "ping", "ping received");
    "pong"
}

/// Streamable HTTP clients must accept both JSON and SSE; some hosts send
/// neither, so the header is filled in before rmcp sees the request.
async fn normalize_accept(mut request: Request, next: Next) -> Response {
    let accepts_stream = request
        .headers()
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains(EVENT_STREAM));

    if !accepts_stream {
        request.headers_mut().insert(ACCEPT, HeaderValue::from_static(MCP_ACCEPT));
    }
    next.run(request).await
}
