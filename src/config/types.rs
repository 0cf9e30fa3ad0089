use serde::Deserialize;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Main configuration structure for Feed-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub pages: PagesConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub redis: RedisConfig,
}

/// Remote data source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL every endpoint path is appended to
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Value of the `app-id` header. Overridden by `APP_ID` when set.
    #[serde(rename = "app-id", default)]
    pub app_id: String,

    /// Value of the `User-Agent` header
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Upper bound on a single HTTP attempt (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Items requested per list page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Contiguous page range harvested for every kind
#[derive(Debug, Clone, Deserialize)]
pub struct PagesConfig {
    #[serde(default = "default_first_page")]
    pub first: u32,

    #[serde(default = "default_last_page")]
    pub last: u32,
}

impl PagesConfig {
    pub fn range(&self) -> RangeInclusive<u32> {
        self.first..=self.last
    }
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            first: default_first_page(),
            last: default_last_page(),
        }
    }
}

/// Retry policy for a single GET
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "initial-delay-ms", default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Factor applied to the delay after each retry; 1.0 gives a fixed delay
    #[serde(rename = "backoff-multiplier", default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Cap on a single delay (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Cap on the sum of all delays for one request (milliseconds)
    #[serde(rename = "max-total-wait-ms", default = "default_max_total_wait_ms")]
    pub max_total_wait_ms: u64,

    /// Randomize each delay between 50% and 100% of its nominal value
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn max_total_wait(&self) -> Duration {
        Duration::from_millis(self.max_total_wait_ms)
    }

    /// A fixed-delay policy with no jitter
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        let delay_ms = delay.as_millis() as u64;
        Self {
            max_attempts,
            initial_delay_ms: delay_ms,
            backoff_multiplier: 1.0,
            max_delay_ms: delay_ms,
            max_total_wait_ms: delay_ms.saturating_mul(max_attempts as u64),
            jitter: false,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay_ms(),
            max_total_wait_ms: default_max_total_wait_ms(),
            jitter: true,
        }
    }
}

/// Concurrency limits for the two fan-out levels
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum (page, kind) units running at once
    #[serde(rename = "max-concurrent-units", default = "default_max_concurrent_units")]
    pub max_concurrent_units: u32,

    /// Maximum person detail lookups in flight at once, across all pages
    #[serde(
        rename = "max-concurrent-details",
        default = "default_max_concurrent_details"
    )]
    pub max_concurrent_details: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_units: default_max_concurrent_units(),
            max_concurrent_details: default_max_concurrent_details(),
        }
    }
}

/// Append-only log sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    /// Comma-separated bootstrap servers
    #[serde(default = "default_kafka_brokers")]
    pub brokers: String,

    #[serde(default = "default_kafka_topic")]
    pub topic: String,

    /// How long a single produce may wait for delivery (milliseconds)
    #[serde(rename = "delivery-timeout-ms", default = "default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,

    /// Consumer group used by the tail command
    #[serde(rename = "tail-group-id", default = "default_tail_group_id")]
    pub tail_group_id: String,
}

impl KafkaConfig {
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: default_kafka_brokers(),
            topic: default_kafka_topic(),
            delivery_timeout_ms: default_delivery_timeout_ms(),
            tail_group_id: default_tail_group_id(),
        }
    }
}

/// Key/value sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://dummyapi.io/data/v1".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_page_size() -> u32 {
    10
}

fn default_first_page() -> u32 {
    1
}

fn default_last_page() -> u32 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    2_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_max_total_wait_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_units() -> u32 {
    30
}

fn default_max_concurrent_details() -> u32 {
    20
}

fn default_kafka_brokers() -> String {
    "localhost:9092".to_string()
}

fn default_kafka_topic() -> String {
    "scraped-data".to_string()
}

fn default_delivery_timeout_ms() -> u64 {
    5_000
}

fn default_tail_group_id() -> String {
    "feed-harvester-tail".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}
