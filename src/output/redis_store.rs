//! Redis implementation of the key/value sink

use crate::config::RedisConfig;
use crate::output::traits::{KeyValueSink, SinkError, SinkResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Key/value sink backed by a Redis connection manager
#[derive(Clone)]
pub struct RedisKeyValueSink {
    manager: ConnectionManager,
}

impl RedisKeyValueSink {
    /// Opens a managed connection to the configured server
    pub async fn connect(config: &RedisConfig) -> SinkResult<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| SinkError::Connection(format!("Invalid Redis URL: {}", e)))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| SinkError::Connection(format!("Redis unreachable: {}", e)))?;

        Ok(Self { manager })
    }

    /// Sends `PING` and expects `PONG`
    pub async fn ping(&self) -> SinkResult<()> {
        let mut conn = self.manager.clone();
        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| SinkError::Connection(format!("Redis PING failed: {}", e)))?;

        if reply != "PONG" {
            return Err(SinkError::Connection(format!(
                "Unexpected PING reply: {}",
                reply
            )));
        }

        tracing::info!("Connected to Redis");
        Ok(())
    }
}

#[async_trait]
impl KeyValueSink for RedisKeyValueSink {
    async fn put(&self, key: &str, value: &str) -> SinkResult<()> {
        let mut conn = self.manager.clone();
        // Plain SET: entries never expire
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(|e| SinkError::KeyValue(format!("Redis SET {} failed: {}", key, e)))?;

        tracing::debug!(key = %key, "Stored record");
        Ok(())
    }
}
