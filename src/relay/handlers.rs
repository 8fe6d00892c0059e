use super::forward::{carries_body, forward, RelayReply, RelayState, HEALTH_PATH};
use crate::error::Error;
use axum::{
    extract::{Path, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use bytes::Bytes;
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

const INDEX_TEXT: &str = "Notion proxy running. Use /api/<notion-path> to forward requests to Notion API. Example: POST /api/databases/<DB_ID>/query";

/// Build the relay router
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/", any(proxy_root_handler))
        .route("/api/{*path}", any(proxy_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for the index page
pub async fn index_handler() -> &'static str {
    INDEX_TEXT
}

/// Handler for everything under /api/
pub async fn proxy_handler(
    State(state): State<RelayState>,
    method: Method,
    Path(path): Path<String>,
    uri: Uri,
    body: Bytes,
) -> Response {
    proxy(state, method, path, uri, body).await
}

/// Handler for /api/ itself, forwarded to the upstream base
pub async fn proxy_root_handler(
    State(state): State<RelayState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    proxy(state, method, String::new(), uri, body).await
}

async fn proxy(
    state: RelayState,
    method: Method,
    path: String,
    uri: Uri,
    body: Bytes,
) -> Response {
    if path == HEALTH_PATH {
        return RelayReply::health().into_response();
    }

    let body = if carries_body(&method) {
        match parse_body(&body) {
            Ok(body) => body,
            Err(reply) => return reply.into_response(),
        }
    } else {
        None
    };

    let request_id = Uuid::new_v4();
    let span = info_span!("relay", %request_id, %method, path = %path);

    async move {
        match forward(&state, method, &path, uri.query(), body).await {
            Ok(reply) => {
                info!(status = reply.status().as_u16(), "Forwarded");
                reply.into_response()
            }
            Err(e) => {
                error!("Forwarding failed: {}", e);
                let description = match e {
                    Error::Relay(description) => description,
                    other => other.to_string(),
                };
                RelayReply::failure(StatusCode::INTERNAL_SERVER_ERROR, description).into_response()
            }
        }
    }
    .instrument(span)
    .await
}

/// Empty bodies become `None`; anything else must be JSON
fn parse_body(body: &Bytes) -> Result<Option<Value>, RelayReply> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(|e| {
        RelayReply::failure(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e))
    })
}
