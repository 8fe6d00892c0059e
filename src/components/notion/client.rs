use super::connection::Connection;
use super::models::{ApiErrorBody, CreatePage, CreatedPage, DatabaseQuery, QueryResponse};
use crate::config::Config;
use crate::error::{relay_error, CalendarResult, Error};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Header carrying the Notion API version
pub const NOTION_VERSION_HEADER: &str = "Notion-Version";

/// Calls the widget makes against Notion
#[async_trait]
pub trait NotionApi: Send + Sync {
    /// `POST databases/{id}/query`
    async fn query_database(
        &self,
        connection: &Connection,
        query: &DatabaseQuery,
    ) -> CalendarResult<QueryResponse>;

    /// `POST pages`
    async fn create_page(
        &self,
        connection: &Connection,
        page: &CreatePage,
    ) -> CalendarResult<CreatedPage>;
}

/// HTTP client for Notion, either direct or through the relay
#[derive(Clone)]
pub struct NotionClient {
    client: Client,
    api_base: String,
    relay_base: String,
    notion_version: String,
}

impl NotionClient {
    pub fn new(
        api_base: &str,
        relay_base: &str,
        notion_version: &str,
        timeout: Duration,
    ) -> CalendarResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: normalize_base(api_base)?,
            relay_base: normalize_base(relay_base)?,
            notion_version: notion_version.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> CalendarResult<Self> {
        Self::new(
            &config.notion_api_base,
            &config.relay_url,
            &config.notion_version,
            config.request_timeout(),
        )
    }

    fn base_for(&self, connection: &Connection) -> &str {
        if connection.use_relay() {
            &self.relay_base
        } else {
            &self.api_base
        }
    }

    async fn post<B, R>(&self, connection: &Connection, endpoint: &str, body: &B) -> CalendarResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let via_relay = connection.use_relay();
        let url = format!("{}{}", self.base_for(connection), endpoint);
        debug!(endpoint, via_relay, "Calling Notion");

        let mut request = self
            .client
            .post(&url)
            .header(NOTION_VERSION_HEADER, &self.notion_version)
            .json(body);
        if let Some(token) = connection.credential() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| Error::Transport {
            message: e.to_string(),
            via_relay,
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| Error::Transport {
            message: e.to_string(),
            via_relay,
        })?;

        if !status.is_success() {
            let parsed: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
            warn!(
                status = status.as_u16(),
                code = parsed.code.as_deref().unwrap_or("unknown"),
                "Notion call failed"
            );
            // The relay reports its own forwarding failures as {"error": ...}
            if via_relay && parsed.code.is_none() {
                if let Some(description) = parsed.error {
                    return Err(relay_error(&description));
                }
            }
            return Err(Error::from_status(status.as_u16(), parsed.code, parsed.message));
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl NotionApi for NotionClient {
    async fn query_database(
        &self,
        connection: &Connection,
        query: &DatabaseQuery,
    ) -> CalendarResult<QueryResponse> {
        let endpoint = format!("databases/{}/query", connection.database_id());
        self.post(connection, &endpoint, query).await
    }

    async fn create_page(
        &self,
        connection: &Connection,
        page: &CreatePage,
    ) -> CalendarResult<CreatedPage> {
        self.post(connection, "pages", page).await
    }
}

/// Validate a base URL and make sure it ends with a slash
fn normalize_base(base: &str) -> CalendarResult<String> {
    let url = Url::parse(base)
        .map_err(|e| Error::Config(format!("Invalid base URL {}: {}", base, e)))?;
    let mut base = url.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(base)
}
