use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable that overrides `source.app-id`
pub const APP_ID_ENV: &str = "APP_ID";

/// Loads and parses a configuration file from the given path
///
/// The `APP_ID` environment variable, when set and non-empty, replaces the
/// `app-id` from the file so the secret can stay out of it.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let app_id = std::env::var(APP_ID_ENV).ok();
    parse_config(&content, app_id)
}

/// Parses and validates configuration from TOML text
///
/// # Arguments
///
/// * `content` - TOML document
/// * `app_id_override` - Replacement for `source.app-id`, ignored when empty
pub fn parse_config(content: &str, app_id_override: Option<String>) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(content)?;

    if let Some(app_id) = app_id_override.filter(|id| !id.trim().is_empty()) {
        config.source.app_id = app_id;
    }

    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
