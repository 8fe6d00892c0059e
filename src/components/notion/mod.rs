pub mod client;
pub mod connection;
pub mod identifier;
pub mod models;

pub use client::{NotionApi, NotionClient};
pub use connection::{Connection, ConnectionSettings};
pub use identifier::{page_url, DatabaseId};
