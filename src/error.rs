use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the widget and the relay
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Invalid connection settings: {0}")]
    #[diagnostic(code(notion_calendar::validation))]
    Validation(String),

    #[error("Notion rejected the request: HTTP {status} ({})", .code.as_deref().unwrap_or("unknown"))]
    #[diagnostic(
        code(notion_calendar::unauthorized),
        help("Check the integration token and that the database is shared with the integration")
    )]
    Unauthorized {
        status: u16,
        code: Option<String>,
        message: Option<String>,
    },

    #[error("Notion API error: HTTP {status} ({})", .code.as_deref().unwrap_or("unknown"))]
    #[diagnostic(code(notion_calendar::api))]
    Api {
        status: u16,
        code: Option<String>,
        message: Option<String>,
    },

    #[error("Communication error: {message}")]
    #[diagnostic(code(notion_calendar::transport))]
    Transport { message: String, via_relay: bool },

    #[error("Relay error: {0}")]
    #[diagnostic(code(notion_calendar::relay))]
    Relay(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(notion_calendar::component))]
    Component(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(notion_calendar::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(notion_calendar::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(notion_calendar::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(notion_calendar::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(notion_calendar::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl Error {
    /// Build the error for a non-2xx upstream response.
    ///
    /// 401 and 403 are reported as authorization failures, everything else as
    /// a generic API error. `code` and `message` come from the upstream error
    /// body when it carried them.
    pub fn from_status(status: u16, code: Option<String>, message: Option<String>) -> Self {
        match status {
            401 | 403 => Error::Unauthorized {
                status,
                code,
                message,
            },
            _ => Error::Api {
                status,
                code,
                message,
            },
        }
    }

    /// Whether the user should be sent back to the connection settings
    pub fn requests_reconfigure(&self) -> bool {
        matches!(
            self,
            Error::Unauthorized { .. }
                | Error::Api { .. }
                | Error::Transport { .. }
                | Error::Relay(_)
        )
    }

    /// Localized, user-facing rendering of the error
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(detail) => t!("error.validation", detail = detail).into_owned(),
            Error::Unauthorized { status, code, .. } => t!(
                "error.unauthorized",
                status = status.to_string(),
                code = code.as_deref().unwrap_or("unknown")
            )
            .into_owned(),
            Error::Api { status, code, .. } => t!(
                "error.api",
                status = status.to_string(),
                code = code.as_deref().unwrap_or("unknown")
            )
            .into_owned(),
            Error::Transport {
                message,
                via_relay: false,
            } => t!("error.transport_direct", message = message).into_owned(),
            Error::Transport {
                message,
                via_relay: true,
            } => t!("error.transport_relay", message = message).into_owned(),
            other => other.to_string(),
        }
    }
}

/// Type alias for Result with our Error type
pub type CalendarResult<T> = Result<T, Error>;

/// Helper to create validation errors
pub fn validation_error(message: &str) -> Error {
    Error::Validation(message.to_string())
}

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create relay errors
pub fn relay_error(message: &str) -> Error {
    Error::Relay(message.to_string())
}
