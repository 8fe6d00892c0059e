//! Credential-injecting relay in front of the Notion API.

mod forward;
mod handlers;

pub use forward::{carries_body, forward, RelayReply, RelayState, HEALTH_PATH};
pub use handlers::router;
