use crate::config::types::{
    Config, KafkaConfig, PagesConfig, PipelineConfig, RedisConfig, RetryConfig, SourceConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_pages_config(&config.pages)?;
    validate_retry_config(&config.retry)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_kafka_config(&config.kafka)?;
    validate_redis_config(&config.redis)?;
    Ok(())
}

/// Validates the remote source configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    if config.app_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "app-id cannot be empty (set it in [source] or via APP_ID)".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.page_size < 1 || config.page_size > 100 {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and 100, got {}",
            config.page_size
        )));
    }

    Ok(())
}

/// Validates the page range
fn validate_pages_config(config: &PagesConfig) -> Result<(), ConfigError> {
    if config.first < 1 {
        return Err(ConfigError::Validation(
            "pages.first must be >= 1".to_string(),
        ));
    }

    if config.last < config.first {
        return Err(ConfigError::Validation(format!(
            "pages.last ({}) must not be below pages.first ({})",
            config.last, config.first
        )));
    }

    Ok(())
}

/// Validates the retry policy
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if !config.backoff_multiplier.is_finite() || config.backoff_multiplier < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff-multiplier must be a finite number >= 1.0, got {}",
            config.backoff_multiplier
        )));
    }

    if config.max_delay_ms < config.initial_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max-delay-ms ({}) must not be below initial-delay-ms ({})",
            config.max_delay_ms, config.initial_delay_ms
        )));
    }

    Ok(())
}

/// Validates the concurrency limits
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_units < 1 {
        return Err(ConfigError::Validation(
            "max-concurrent-units must be >= 1".to_string(),
        ));
    }

    if config.max_concurrent_details < 1 {
        return Err(ConfigError::Validation(
            "max-concurrent-details must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the log sink configuration
fn validate_kafka_config(config: &KafkaConfig) -> Result<(), ConfigError> {
    if config.brokers.split(',').all(|broker| broker.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "kafka.brokers cannot be empty".to_string(),
        ));
    }

    if config.topic.trim().is_empty() {
        return Err(ConfigError::Validation(
            "kafka.topic cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the key/value sink configuration
fn validate_redis_config(config: &RedisConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid redis.url: {}", e)))?;

    if url.scheme() != "redis" && url.scheme() != "rediss" {
        return Err(ConfigError::InvalidUrl(format!(
            "redis.url '{}' must use the redis:// or rediss:// scheme",
            config.url
        )));
    }

    Ok(())
}
