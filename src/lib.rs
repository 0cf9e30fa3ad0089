//! Feed-Harvester: a paginated record collector
//!
//! This crate collects people, posts and comments from a paginated JSON API,
//! enriches people with a per-item detail lookup, and publishes every record
//! to an append-only log and a key/value store.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for Feed-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Fetch of {url} failed after {attempts} attempt(s): {source}")]
    TransientFetch {
        url: String,
        attempts: u32,
        #[source]
        source: crawler::TransportError,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Feed-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{Comment, PageRequest, Person, Post, Record, ResourceKind};
pub use output::{RunSummary, UnitOutcome, UnitStatus};
pub use state::UnitState;
