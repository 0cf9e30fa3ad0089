//! In-memory sinks
//!
//! Used by `--dry-run` and by tests. Writes are kept in arrival order.

use crate::output::traits::{KeyValueSink, LogMessage, LogSink, SinkResult};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a sink buffer, recovering it if a writer panicked while holding it
fn lock<T>(buffer: &Mutex<T>) -> MutexGuard<'_, T> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Log sink that keeps every appended message
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    messages: Mutex<Vec<LogMessage>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all messages appended so far
    pub fn messages(&self) -> Vec<LogMessage> {
        lock(&self.messages).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.messages).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn append(&self, message: &LogMessage) -> SinkResult<()> {
        lock(&self.messages).push(message.clone());
        Ok(())
    }
}

/// Key/value sink that records every write
#[derive(Debug, Default)]
pub struct MemoryKeyValueSink {
    writes: Mutex<Vec<(String, String)>>,
}

impl MemoryKeyValueSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write in order, including overwrites of the same key
    pub fn writes(&self) -> Vec<(String, String)> {
        lock(&self.writes).clone()
    }

    /// Latest value stored under `key`
    pub fn get(&self, key: &str) -> Option<String> {
        lock(&self.writes)
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}

#[async_trait]
impl KeyValueSink for MemoryKeyValueSink {
    async fn put(&self, key: &str, value: &str) -> SinkResult<()> {
        lock(&self.writes).push((key.to_string(), value.to_string()));
        Ok(())
    }
}
