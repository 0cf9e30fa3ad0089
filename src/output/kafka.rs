//! Kafka implementation of the append-only log
//!
//! Records are produced with the natural key as the Kafka key so every
//! update for one key lands on the same partition.

use crate::config::KafkaConfig;
use crate::output::traits::{LogMessage, LogSink, SinkError, SinkResult};
use async_trait::async_trait;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::{ClientConfig, Message};
use std::future::Future;
use std::time::Duration;

/// Log sink producing to a single Kafka topic
pub struct KafkaLogSink {
    producer: FutureProducer,
    topic: String,
    delivery_timeout: Duration,
}

impl KafkaLogSink {
    /// Creates a producer for the configured brokers
    pub fn new(config: &KafkaConfig) -> SinkResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", config.delivery_timeout_ms.to_string())
            .create()
            .map_err(|e| SinkError::Connection(format!("Kafka producer: {}", e)))?;

        Ok(Self {
            producer,
            topic: config.topic.clone(),
            delivery_timeout: config.delivery_timeout(),
        })
    }

    /// Fetches topic metadata to prove the brokers are reachable
    pub async fn check_connection(&self) -> SinkResult<()> {
        let producer = self.producer.clone();
        let topic = self.topic.clone();
        let timeout = self.delivery_timeout;

        let brokers = tokio::task::spawn_blocking(move || {
            producer
                .client()
                .fetch_metadata(Some(topic.as_str()), timeout)
                .map(|metadata| metadata.brokers().len())
        })
        .await
        .map_err(|e| SinkError::Connection(format!("Kafka metadata task: {}", e)))?
        .map_err(|e| SinkError::Connection(format!("Kafka brokers unreachable: {}", e)))?;

        tracing::info!(
            topic = %self.topic,
            brokers,
            "Connected to Kafka"
        );
        Ok(())
    }
}

#[async_trait]
impl LogSink for KafkaLogSink {
    async fn append(&self, message: &LogMessage) -> SinkResult<()> {
        let record = FutureRecord::to(&self.topic)
            .key(&message.key)
            .payload(&message.value);

        self.producer
            .send(record, self.delivery_timeout)
            .await
            .map_err(|(err, _)| SinkError::Log(format!("Kafka publish failed: {}", err)))?;

        Ok(())
    }
}

/// Prints every message on the log topic until interrupted
///
/// Output format: `Message at offset <offset>: <key> = <value>`.
pub async fn tail_log(config: &KafkaConfig) -> SinkResult<()> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &config.brokers)
        .set("group.id", &config.tail_group_id)
        .set("auto.offset.reset", "earliest")
        .set("enable.auto.commit", "true")
        .create()
        .map_err(|e| SinkError::Connection(format!("Kafka consumer: {}", e)))?;

    consumer
        .subscribe(&[config.topic.as_str()])
        .map_err(|e| SinkError::Connection(format!("Kafka subscribe: {}", e)))?;

    tracing::info!(topic = %config.topic, "Tailing log topic (Ctrl-C to stop)");

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let consumer = &consumer;

    drain_until(
        move || consumer.recv(),
        shutdown,
        |received| match received {
            Ok(message) => {
                let key = message.key().map(String::from_utf8_lossy).unwrap_or_default();
                let value = message.payload().map(String::from_utf8_lossy).unwrap_or_default();
                println!("Message at offset {}: {} = {}", message.offset(), key, value);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read message from Kafka");
            }
        },
    )
    .await;

    tracing::info!("Stopping tail");
    Ok(())
}

/// Hands every item from `next` to `handle` until `shutdown` completes
///
/// `shutdown` is pinned once and polled first on every turn, so a signal
/// raised while an item is being handled still ends the loop.
async fn drain_until<T, N, Fut, S, H>(mut next: N, shutdown: S, mut handle: H)
where
    N: FnMut() -> Fut,
    Fut: Future<Output = T>,
    S: Future<Output = ()>,
    H: FnMut(T),
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => return,
            item = next() => handle(item),
        }
    }
}
