use crate::error::{config_error, env_error, CalendarResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::time::Duration;

/// Base URL of the public Notion API
pub const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com/v1/";
/// Notion API version sent with every call
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
/// Where the widget expects the relay when none is configured
pub const DEFAULT_RELAY_URL: &str = "http://localhost:8787/api/";
/// Port the relay listens on by default
pub const DEFAULT_RELAY_PORT: u16 = 8787;
/// Upper bound for a single upstream call
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Delay between a successful creation and the follow-up query
pub const DEFAULT_REFRESH_DELAY_MS: u64 = 800;

const WIDGET_CONFIG_PATH: &str = "config/widget.toml";

/// Widget configuration
#[derive(Clone)]
pub struct Config {
    /// Notion API base used in direct mode
    pub notion_api_base: String,
    /// Relay base used in relay mode
    pub relay_url: String,
    /// Value of the Notion-Version header
    pub notion_version: String,
    /// IANA time zone used for "today" and for resolving record dates
    pub timezone: String,
    /// UI locale ("en" or "ko")
    pub locale: String,
    /// Timeout for every upstream call, in seconds
    pub request_timeout_secs: u64,
    /// Delay before re-querying after a creation, in milliseconds
    pub refresh_delay_ms: u64,
    /// Open pages in the browser right after creating them
    pub open_created_pages: bool,
    /// Token used to connect at startup
    pub notion_token: Option<String>,
    /// Database used to connect at startup
    pub database_id: Option<String>,
    /// Connect through the relay at startup
    pub use_relay: bool,
}

/// Values accepted in `config/widget.toml`
#[derive(Debug, Default, Deserialize)]
struct WidgetFile {
    notion_api_base: Option<String>,
    relay_url: Option<String>,
    notion_version: Option<String>,
    timezone: Option<String>,
    locale: Option<String>,
    request_timeout_secs: Option<u64>,
    refresh_delay_ms: Option<u64>,
    open_created_pages: Option<bool>,
    database_id: Option<String>,
    use_relay: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notion_api_base: DEFAULT_NOTION_API_BASE.to_string(),
            relay_url: DEFAULT_RELAY_URL.to_string(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            timezone: String::from("UTC"),
            locale: String::from("en"),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            refresh_delay_ms: DEFAULT_REFRESH_DELAY_MS,
            open_created_pages: false,
            notion_token: None,
            database_id: None,
            use_relay: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("notion_api_base", &self.notion_api_base)
            .field("relay_url", &self.relay_url)
            .field("notion_version", &self.notion_version)
            .field("timezone", &self.timezone)
            .field("locale", &self.locale)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("refresh_delay_ms", &self.refresh_delay_ms)
            .field("open_created_pages", &self.open_created_pages)
            .field("notion_token", &self.notion_token.as_ref().map(|_| "<redacted>"))
            .field("database_id", &self.database_id)
            .field("use_relay", &self.use_relay)
            .finish()
    }
}

impl Config {
    /// Load configuration from defaults, the optional config file and the environment
    pub fn load() -> CalendarResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Config::default();

        if let Ok(content) = fs::read_to_string(WIDGET_CONFIG_PATH) {
            let file: WidgetFile = toml::from_str(&content)?;
            config.apply_file(file);
        }

        config.apply_env()?;
        config.tz()?;

        Ok(config)
    }

    fn apply_file(&mut self, file: WidgetFile) {
        if let Some(v) = file.notion_api_base {
            self.notion_api_base = v;
        }
        if let Some(v) = file.relay_url {
            self.relay_url = v;
        }
        if let Some(v) = file.notion_version {
            self.notion_version = v;
        }
        if let Some(v) = file.timezone {
            self.timezone = v;
        }
        if let Some(v) = file.locale {
            self.locale = v;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file.refresh_delay_ms {
            self.refresh_delay_ms = v;
        }
        if let Some(v) = file.open_created_pages {
            self.open_created_pages = v;
        }
        if file.database_id.is_some() {
            self.database_id = file.database_id;
        }
        if let Some(v) = file.use_relay {
            self.use_relay = v;
        }
    }

    fn apply_env(&mut self) -> CalendarResult<()> {
        if let Ok(v) = env::var("NOTION_API_BASE") {
            self.notion_api_base = v;
        }
        if let Ok(v) = env::var("RELAY_URL") {
            self.relay_url = v;
        }
        if let Ok(v) = env::var("NOTION_VERSION") {
            self.notion_version = v;
        }
        if let Ok(v) = env::var("TIMEZONE") {
            self.timezone = v;
        }
        if let Ok(v) = env::var("WIDGET_LOCALE") {
            self.locale = v;
        }
        if let Ok(v) = env::var("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v
                .parse()
                .map_err(|_| config_error("Invalid REQUEST_TIMEOUT_SECS format"))?;
        }
        if let Ok(v) = env::var("REFRESH_DELAY_MS") {
            self.refresh_delay_ms = v
                .parse()
                .map_err(|_| config_error("Invalid REFRESH_DELAY_MS format"))?;
        }
        if let Ok(v) = env::var("OPEN_CREATED_PAGES") {
            self.open_created_pages = parse_flag(&v);
        }
        if let Ok(v) = env::var("NOTION_TOKEN") {
            self.notion_token = Some(v);
        }
        if let Ok(v) = env::var("NOTION_DATABASE_ID") {
            self.database_id = Some(v);
        }
        if let Ok(v) = env::var("USE_RELAY") {
            self.use_relay = parse_flag(&v);
        }
        Ok(())
    }

    /// Parsed time zone
    pub fn tz(&self) -> CalendarResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| config_error(&format!("Invalid timezone {}: {}", self.timezone, e)))
    }

    /// Timeout applied to every upstream call
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Delay before the post-creation refresh
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

/// Relay process configuration
#[derive(Clone)]
pub struct RelayConfig {
    /// Bearer credential injected into every forwarded call
    pub notion_secret: String,
    /// Address to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Upstream base URL; always ends with a slash
    pub notion_api_base: String,
    /// Value of the Notion-Version header
    pub notion_version: String,
    /// Timeout for every upstream call, in seconds
    pub timeout_secs: u64,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("notion_secret", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("notion_api_base", &self.notion_api_base)
            .field("notion_version", &self.notion_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RelayConfig {
    /// Load relay configuration from the environment
    pub fn load() -> CalendarResult<Self> {
        dotenv().ok();

        let notion_secret = env::var("NOTION_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| env_error("NOTION_SECRET"))?;

        let host = env::var("RELAY_HOST").unwrap_or_else(|_| String::from("127.0.0.1"));

        let port = match env::var("PORT") {
            Ok(p) => p
                .parse::<u16>()
                .map_err(|_| config_error("Invalid PORT format"))?,
            Err(_) => DEFAULT_RELAY_PORT,
        };

        let notion_api_base =
            env::var("NOTION_API_BASE").unwrap_or_else(|_| DEFAULT_NOTION_API_BASE.to_string());
        let notion_version =
            env::var("NOTION_VERSION").unwrap_or_else(|_| DEFAULT_NOTION_VERSION.to_string());

        let timeout_secs = match env::var("RELAY_TIMEOUT_SECS") {
            Ok(t) => t
                .parse::<u64>()
                .map_err(|_| config_error("Invalid RELAY_TIMEOUT_SECS format"))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self::new(notion_secret, notion_api_base)
            .with_bind(host, port)
            .with_version(notion_version)
            .with_timeout_secs(timeout_secs))
    }

    /// Configuration with defaults for everything but the secret and upstream
    pub fn new(notion_secret: impl Into<String>, notion_api_base: impl Into<String>) -> Self {
        let mut base = notion_api_base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self {
            notion_secret: notion_secret.into(),
            host: String::from("127.0.0.1"),
            port: DEFAULT_RELAY_PORT,
            notion_api_base: base,
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_bind(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.notion_version = version.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
