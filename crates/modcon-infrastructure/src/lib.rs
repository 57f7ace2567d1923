//! Infrastructure layer for the moderation console.
//!
//! Concrete implementations of the seams defined in `modcon-core`: the HTTP
//! dashboard client, the TOML config service and platform path resolution.

pub mod config_service;
pub mod dto;
pub mod http_client;
pub mod paths;

pub use config_service::ConfigService;
pub use http_client::HttpDashboardClient;
pub use paths::ModconPaths;
