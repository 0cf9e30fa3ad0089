//! Configuration module for Feed-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use feed_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvesting pages {:?}", config.pages.range());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, KafkaConfig, PagesConfig, PipelineConfig, RedisConfig, RetryConfig, SourceConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, APP_ID_ENV,
};
pub use validation::validate;
