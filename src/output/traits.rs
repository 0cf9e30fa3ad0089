//! Sink traits and outcome types
//!
//! This module defines the interfaces the publisher writes through and the
//! per-unit outcome records the coordinator aggregates.

use crate::model::PageRequest;
use async_trait::async_trait;
use std::ops::AddAssign;
use thiserror::Error;

/// Errors that can occur while writing to a sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Log sink write failed: {0}")]
    Log(String),

    #[error("Key/value sink write failed: {0}")]
    KeyValue(String),

    #[error("Sink connection failed: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// One entry for the append-only log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Append-only log destination
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Appends one message
    async fn append(&self, message: &LogMessage) -> SinkResult<()>;
}

/// Key/value destination
///
/// Entries are written without expiration.
#[async_trait]
pub trait KeyValueSink: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value
    async fn put(&self, key: &str, value: &str) -> SinkResult<()>;
}

/// Counts of sink writes for some set of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub log_written: usize,
    pub log_failed: usize,
    pub kv_written: usize,
    pub kv_failed: usize,
}

impl PublishReport {
    /// Returns true if any write failed
    pub fn has_failures(&self) -> bool {
        self.log_failed > 0 || self.kv_failed > 0
    }
}

impl AddAssign for PublishReport {
    fn add_assign(&mut self, other: Self) {
        self.log_written += other.log_written;
        self.log_failed += other.log_failed;
        self.kv_written += other.kv_written;
        self.kv_failed += other.kv_failed;
    }
}

/// How a unit of work ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    /// Every record was retrieved and handed to the publisher
    Succeeded {
        fetched: usize,
        publish: PublishReport,
    },

    /// The list call worked but some person detail lookups did not
    Partial {
        fetched: usize,
        missing: Vec<String>,
        publish: PublishReport,
    },

    /// The fetch failed; nothing was published
    Failed { error: String },
}

/// Outcome of one (page, kind) unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOutcome {
    pub request: PageRequest,
    pub status: UnitStatus,
}

impl UnitOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, UnitStatus::Failed { .. })
    }

    pub fn is_partial(&self) -> bool {
        matches!(self.status, UnitStatus::Partial { .. })
    }

    /// Number of records the fetch returned
    pub fn fetched(&self) -> usize {
        match &self.status {
            UnitStatus::Succeeded { fetched, .. } | UnitStatus::Partial { fetched, .. } => *fetched,
            UnitStatus::Failed { .. } => 0,
        }
    }

    /// Sink write counts; zero for failed units
    pub fn publish(&self) -> PublishReport {
        match &self.status {
            UnitStatus::Succeeded { publish, .. } | UnitStatus::Partial { publish, .. } => *publish,
            UnitStatus::Failed { .. } => PublishReport::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceKind;

    #[test]
    fn test_publish_report_accumulates() {
        let mut total = PublishReport::default();
        total += PublishReport {
            log_written: 3,
            log_failed: 0,
            kv_written: 2,
            kv_failed: 1,
        };
        total += PublishReport {
            log_written: 1,
            ..PublishReport::default()
        };

        assert_eq!(total.log_written, 4);
        assert_eq!(total.kv_written, 2);
        assert!(total.has_failures());
    }

    #[test]
    fn test_outcome_accessors() {
        let request = PageRequest::new(1, ResourceKind::Post);
        let failed = UnitOutcome {
            request,
            status: UnitStatus::Failed {
                error: "boom".to_string(),
            },
        };
        assert!(failed.is_failed());
        assert_eq!(failed.fetched(), 0);
        assert_eq!(failed.publish(), PublishReport::default());

        let partial = UnitOutcome {
            request,
            status: UnitStatus::Partial {
                fetched: 9,
                missing: vec!["x".to_string()],
                publish: PublishReport {
                    log_written: 9,
                    kv_written: 9,
                    ..PublishReport::default()
                },
            },
        };
        assert!(partial.is_partial());
        assert_eq!(partial.fetched(), 9);
        assert_eq!(partial.publish().log_written, 9);
    }
}
