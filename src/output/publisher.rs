//! Publisher writing each record to both sinks
//!
//! The log entry is keyed by the record's natural key and carries a
//! versioned JSON envelope. The key/value entry stores the record's JSON
//! under the same key. Both writes are best-effort.

use crate::model::{Record, ResourceKind};
use crate::output::traits::{KeyValueSink, LogMessage, LogSink, PublishReport, SinkResult};
use serde::Serialize;
use std::sync::Arc;

/// Schema tag of the log envelope
pub const ENVELOPE_SCHEMA: &str = "feed-harvester.record";

/// Current envelope version
pub const ENVELOPE_VERSION: u32 = 1;

/// Versioned wrapper around a record on the log
#[derive(Debug, Serialize)]
pub struct RecordEnvelope<'a> {
    pub schema: &'static str,
    pub version: u32,
    pub kind: ResourceKind,
    pub key: &'a str,
    /// Human-readable one-line (posts: multi-line) rendering
    pub summary: String,
    pub record: &'a Record,
}

impl<'a> RecordEnvelope<'a> {
    pub fn new(record: &'a Record) -> Self {
        Self {
            schema: ENVELOPE_SCHEMA,
            version: ENVELOPE_VERSION,
            kind: record.kind(),
            key: record.natural_key(),
            summary: record.to_string(),
            record,
        }
    }
}

/// Builds the log message for a record
pub fn build_message(record: &Record) -> SinkResult<LogMessage> {
    let value = serde_json::to_vec(&RecordEnvelope::new(record))?;
    Ok(LogMessage {
        key: record.natural_key().as_bytes().to_vec(),
        value,
    })
}

/// Writes records to the log sink and the key/value sink
#[derive(Clone)]
pub struct Publisher {
    log: Arc<dyn LogSink>,
    store: Arc<dyn KeyValueSink>,
}

impl Publisher {
    pub fn new(log: Arc<dyn LogSink>, store: Arc<dyn KeyValueSink>) -> Self {
        Self { log, store }
    }

    /// Publishes one record. Failures are logged and counted, never returned.
    pub async fn publish(&self, record: &Record) -> PublishReport {
        let mut report = PublishReport::default();
        let key = record.natural_key();

        // Both sinks are keyed; an empty key is never written
        if key.is_empty() {
            tracing::warn!(kind = %record.kind(), "Skipping record without a natural key");
            report.log_failed += 1;
            report.kv_failed += 1;
            return report;
        }

        match build_message(record) {
            Ok(message) => match self.log.append(&message).await {
                Ok(()) => {
                    tracing::debug!(kind = %record.kind(), key = %key, "Wrote record to log");
                    report.log_written += 1;
                }
                Err(e) => {
                    tracing::error!(kind = %record.kind(), key = %key, error = %e, "Failed to write record to log");
                    report.log_failed += 1;
                }
            },
            Err(e) => {
                tracing::error!(kind = %record.kind(), key = %key, error = %e, "Failed to encode log message");
                report.log_failed += 1;
            }
        }

        let stored = match serde_json::to_string(record) {
            Ok(value) => self.store.put(key, &value).await,
            Err(e) => Err(e.into()),
        };
        match stored {
            Ok(()) => report.kv_written += 1,
            Err(e) => {
                tracing::error!(kind = %record.kind(), key = %key, error = %e, "Failed to store record");
                report.kv_failed += 1;
            }
        }

        report
    }

    /// Publishes records one after another, continuing past failures
    pub async fn publish_all(&self, records: &[Record]) -> PublishReport {
        let mut report = PublishReport::default();
        for record in records {
            report += self.publish(record).await;
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Comment, Person, Post};
    use crate::output::memory::{MemoryKeyValueSink, MemoryLogSink};
    use crate::output::SinkError;
    use async_trait::async_trait;

    struct BrokenLog;

    #[async_trait]
    impl LogSink for BrokenLog {
        async fn append(&self, _message: &LogMessage) -> SinkResult<()> {
            Err(SinkError::Log("broker unavailable".to_string()))
        }
    }

    fn person() -> Person {
        Person {
            title: "mr".to_string(),
            first_name: "Adam".to_string(),
            last_name: "Smith".to_string(),
            email: "adam.smith@example.com".to_string(),
            gender: "male".to_string(),
        }
    }

    fn samples() -> Vec<Record> {
        vec![
            Record::from(person()),
            Record::from(Post {
                owner: Person {
                    email: "poster@example.com".to_string(),
                    ..person()
                },
                text: "dog in the snow".to_string(),
                likes: 4,
                tags: vec!["dog".to_string()],
                publish_date: "2020-05-24T14:53:17.598Z".to_string(),
            }),
            Record::from(Comment {
                id: "60d21b4667d0d8992e610c85".to_string(),
                message: "nice".to_string(),
                owner: person(),
            }),
        ]
    }

    #[tokio::test]
    async fn test_message_key_is_natural_key() {
        let log = Arc::new(MemoryLogSink::new());
        let store = Arc::new(MemoryKeyValueSink::new());
        let publisher = Publisher::new(log.clone(), store.clone());

        for record in samples() {
            publisher.publish(&record).await;
        }

        let keys: Vec<_> = log
            .messages()
            .iter()
            .map(|m| String::from_utf8(m.key.clone()).unwrap())
            .collect();
        assert_eq!(
            keys,
            vec![
                "adam.smith@example.com",
                "poster@example.com",
                "60d21b4667d0d8992e610c85"
            ]
        );

        let stored: Vec<_> = store.writes().into_iter().map(|(k, _)| k).collect();
        assert_eq!(stored, keys);
    }

    #[tokio::test]
    async fn test_envelope_is_versioned() {
        let record = samples().remove(2);
        let message = build_message(&record).unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&message.value).unwrap();

        assert_eq!(envelope["schema"], ENVELOPE_SCHEMA);
        assert_eq!(envelope["version"], ENVELOPE_VERSION);
        assert_eq!(envelope["kind"], "comment");
        assert_eq!(envelope["key"], "60d21b4667d0d8992e610c85");
        assert_eq!(envelope["summary"], "Comment: nice by Adam Smith");
        assert_eq!(envelope["record"]["owner"]["firstName"], "Adam");
    }

    #[tokio::test]
    async fn test_store_value_is_record_json() {
        let store = Arc::new(MemoryKeyValueSink::new());
        let publisher = Publisher::new(Arc::new(MemoryLogSink::new()), store.clone());

        publisher.publish(&Record::from(person())).await;

        let value = store.get("adam.smith@example.com").unwrap();
        let decoded: Person = serde_json::from_str(&value).unwrap();
        assert_eq!(decoded, person());
    }

    #[tokio::test]
    async fn test_record_without_key_is_not_written() {
        let log = Arc::new(MemoryLogSink::new());
        let store = Arc::new(MemoryKeyValueSink::new());
        let publisher = Publisher::new(log.clone(), store.clone());

        let anonymous = |text: &str| {
            Record::from(Post {
                owner: Person {
                    email: String::new(),
                    ..person()
                },
                text: text.to_string(),
                ..Post::default()
            })
        };
        let records = vec![anonymous("first"), Record::from(person()), anonymous("second")];

        let report = publisher.publish_all(&records).await;

        assert_eq!(report.log_written, 1);
        assert_eq!(report.kv_written, 1);
        assert_eq!(report.log_failed, 2);
        assert_eq!(report.kv_failed, 2);
        assert!(report.has_failures());
        assert_eq!(log.len(), 1);
        assert_eq!(store.writes().len(), 1);
        assert!(store.get("").is_none());
    }

    #[tokio::test]
    async fn test_log_failure_does_not_stop_publishing() {
        let store = Arc::new(MemoryKeyValueSink::new());
        let publisher = Publisher::new(Arc::new(BrokenLog), store.clone());

        let report = publisher.publish_all(&samples()).await;

        assert_eq!(report.log_failed, 3);
        assert_eq!(report.log_written, 0);
        assert_eq!(report.kv_written, 3);
        assert_eq!(store.writes().len(), 3);
    }
}
