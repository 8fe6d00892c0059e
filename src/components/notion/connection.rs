use super::identifier::{DatabaseId, ID_LEN};
use crate::error::{validation_error, CalendarResult};
use std::fmt;
use tracing::warn;

/// Token prefixes Notion has issued for internal integrations
const KNOWN_TOKEN_PREFIXES: [&str; 2] = ["secret_", "ntn_"];

/// Raw connection parameters as entered by the user
#[derive(Clone, Default)]
pub struct ConnectionSettings {
    pub credential: Option<String>,
    pub database_id: String,
    pub use_relay: bool,
}

impl ConnectionSettings {
    /// Settings for a direct connection with an integration token
    pub fn direct(credential: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            credential: Some(credential.into()),
            database_id: database_id.into(),
            use_relay: false,
        }
    }

    /// Settings for a connection through the relay
    pub fn relayed(database_id: impl Into<String>) -> Self {
        Self {
            credential: None,
            database_id: database_id.into(),
            use_relay: true,
        }
    }

    /// Check the settings and produce a usable connection.
    ///
    /// No network call is made here.
    pub fn validate(self) -> CalendarResult<Connection> {
        let credential = self
            .credential
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if !self.use_relay {
            match &credential {
                None => {
                    return Err(validation_error(&t!("validation.credential_required")));
                }
                Some(token) => {
                    if !KNOWN_TOKEN_PREFIXES.iter().any(|p| token.starts_with(p)) {
                        warn!("Notion token does not start with a known prefix");
                    }
                }
            }
        }

        let database_id = DatabaseId::normalize(&self.database_id);
        if database_id.compact_len() != ID_LEN {
            return Err(validation_error(&t!(
                "validation.database_id_length",
                length = database_id.compact_len().to_string()
            )));
        }

        Ok(Connection {
            credential,
            database_id,
            use_relay: self.use_relay,
        })
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("database_id", &self.database_id)
            .field("use_relay", &self.use_relay)
            .finish()
    }
}

/// Validated connection held for the session
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    credential: Option<String>,
    database_id: DatabaseId,
    use_relay: bool,
}

impl Connection {
    /// Token for direct calls; `None` in relay mode
    pub fn credential(&self) -> Option<&str> {
        if self.use_relay {
            None
        } else {
            self.credential.as_deref()
        }
    }

    pub fn database_id(&self) -> &DatabaseId {
        &self.database_id
    }

    pub fn use_relay(&self) -> bool {
        self.use_relay
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("database_id", &self.database_id)
            .field("use_relay", &self.use_relay)
            .finish()
    }
}
