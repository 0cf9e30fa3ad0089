//! Output module for publishing harvested records
//!
//! This module handles:
//! - The sink interfaces and their Kafka, Redis and in-memory implementations
//! - Building versioned log messages and publishing records to both sinks
//! - Aggregating unit outcomes into a run summary

#[cfg(feature = "kafka")]
mod kafka;
pub mod memory;
mod publisher;
#[cfg(feature = "redis")]
mod redis_store;
pub mod stats;
mod traits;

#[cfg(feature = "kafka")]
pub use kafka::{tail_log, KafkaLogSink};
pub use memory::{MemoryKeyValueSink, MemoryLogSink};
pub use publisher::{build_message, Publisher, RecordEnvelope, ENVELOPE_SCHEMA, ENVELOPE_VERSION};
#[cfg(feature = "redis")]
pub use redis_store::RedisKeyValueSink;
pub use stats::{print_summary, KindTotals, RunSummary};
pub use traits::{
    KeyValueSink, LogMessage, LogSink, PublishReport, SinkError, SinkResult, UnitOutcome,
    UnitStatus,
};

use crate::config::Config;
use std::sync::Arc;

/// Connects both production sinks and checks they answer
///
/// # Returns
///
/// * `Ok(Publisher)` - Publisher writing to Kafka and Redis
/// * `Err(SinkError)` - A sink was unreachable or the build lacks it
pub async fn connect_sinks(config: &Config) -> SinkResult<Publisher> {
    let log = connect_log(config).await?;
    let store = connect_store(config).await?;
    Ok(Publisher::new(log, store))
}

#[cfg(feature = "kafka")]
async fn connect_log(config: &Config) -> SinkResult<Arc<dyn LogSink>> {
    let sink = KafkaLogSink::new(&config.kafka)?;
    sink.check_connection().await?;
    Ok(Arc::new(sink))
}

#[cfg(not(feature = "kafka"))]
async fn connect_log(_config: &Config) -> SinkResult<Arc<dyn LogSink>> {
    Err(SinkError::Connection(
        "built without the `kafka` feature".to_string(),
    ))
}

#[cfg(feature = "redis")]
async fn connect_store(config: &Config) -> SinkResult<Arc<dyn KeyValueSink>> {
    let sink = RedisKeyValueSink::connect(&config.redis).await?;
    sink.ping().await?;
    Ok(Arc::new(sink))
}

#[cfg(not(feature = "redis"))]
async fn connect_store(_config: &Config) -> SinkResult<Arc<dyn KeyValueSink>> {
    Err(SinkError::Connection(
        "built without the `redis` feature".to_string(),
    ))
}
