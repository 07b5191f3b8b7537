//! HyperMon Proxy
//!
//! Relays AllStarLink node pages to the HyperMon web interface as JSON:
//! - Currently keyed nodes (`/api/keyed-nodes`)
//! - Node-list search (`/api/search-nodes?q=`)
//! - Single node lookup (`/api/node-info/{id}`)
//!
//! Every request fetches the upstream page fresh and extracts records from
//! its first table. Nothing is cached between requests.

pub mod config;
pub mod error;
pub mod extractors;
pub mod fetch;
pub mod server;

pub use config::ProxyConfig;
pub use error::{ApiError, ConfigError, FetchError};
pub use extractors::*;
pub use fetch::Fetcher;
pub use server::{router, serve, AppState};
