use crate::config::RelayConfig;
use crate::error::{relay_error, CalendarResult, Error};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::{json, Value};
use std::error::Error as StdError;
use std::sync::Arc;
use tracing::debug;

/// Path suffix answered locally instead of being forwarded
pub const HEALTH_PATH: &str = "health";

const NOTION_VERSION_HEADER: &str = "Notion-Version";

/// Shared, read-only relay state: the loaded configuration and a pooled client
#[derive(Clone)]
pub struct RelayState {
    inner: Arc<RelayInner>,
}

struct RelayInner {
    client: Client,
    config: RelayConfig,
}

impl RelayState {
    pub fn new(config: RelayConfig) -> CalendarResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner: Arc::new(RelayInner { client, config }),
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }
}

/// What the relay sends back to its caller
#[derive(Debug, Clone, PartialEq)]
pub enum RelayReply {
    /// Upstream body parsed as JSON
    Json { status: StatusCode, body: Value },
    /// Upstream body that was not JSON, passed through untouched
    Text { status: StatusCode, body: String },
}

impl RelayReply {
    pub fn health() -> Self {
        RelayReply::Json {
            status: StatusCode::OK,
            body: json!({ "ok": true, "message": "proxy ok" }),
        }
    }

    /// Error reply carrying a failure description
    pub fn failure(status: StatusCode, description: impl Into<String>) -> Self {
        RelayReply::Json {
            status,
            body: json!({ "error": description.into() }),
        }
    }

    /// Decode an upstream body: JSON when it parses, raw text otherwise
    pub fn from_upstream(status: StatusCode, text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(body) => RelayReply::Json { status, body },
            Err(_) => RelayReply::Text { status, body: text },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayReply::Json { status, .. } | RelayReply::Text { status, .. } => *status,
        }
    }
}

impl IntoResponse for RelayReply {
    fn into_response(self) -> Response {
        match self {
            RelayReply::Json { status, body } => (status, Json(body)).into_response(),
            RelayReply::Text { status, body } => (status, body).into_response(),
        }
    }
}

/// Methods whose body is forwarded
pub fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Forward one call upstream with the relay credential.
///
/// `body` is only sent for methods that carry one, as `{}` when absent.
/// Network failures come back as `Error::Relay`; HTTP errors from upstream are
/// relayed as ordinary replies.
pub async fn forward(
    state: &RelayState,
    method: Method,
    path: &str,
    query: Option<&str>,
    body: Option<Value>,
) -> CalendarResult<RelayReply> {
    let config = state.config();
    let mut url = format!("{}{}", config.notion_api_base, path);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    debug!(%method, path, "Forwarding to upstream");

    let mut request = state
        .inner
        .client
        .request(method.clone(), &url)
        .bearer_auth(&config.notion_secret)
        .header(NOTION_VERSION_HEADER, &config.notion_version)
        .header(CONTENT_TYPE, "application/json");

    if carries_body(&method) {
        let body = body.unwrap_or_else(|| json!({}));
        request = request.body(serde_json::to_vec(&body)?);
    }

    let response = request
        .send()
        .await
        .map_err(|e| relay_error(&describe_failure(e)))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| relay_error(&describe_failure(e)))?;

    Ok(RelayReply::from_upstream(status, text))
}

/// Failure description with its cause chain, without the upstream URL
fn describe_failure(e: reqwest::Error) -> String {
    let e = e.without_url();
    let mut description = e.to_string();
    let mut source = StdError::source(&e);
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }
    description
}
