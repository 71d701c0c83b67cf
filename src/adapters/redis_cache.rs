//! Redis implementation of ViewCache. Values are JSON strings written with `SET key value EX ttl`.
//!
//! The connection is a [`ConnectionManager`]: a command that fails on a dropped
//! socket surfaces as one error and the manager reconnects in the background, so
//! later calls reach Redis again without restarting the service.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::TransactionView;
use crate::metrics::CacheMetrics;
use crate::ports::{CacheError, ViewCache};

#[derive(Clone)]
pub struct RedisViewCache {
    conn: ConnectionManager,
    metrics: Arc<CacheMetrics>,
}

impl RedisViewCache {
    pub async fn connect(redis_url: &str, metrics: Arc<CacheMetrics>) -> anyhow::Result<Self> {
        let redis_client = redis::Client::open(redis_url)?;
        let conn = redis_client.get_connection_manager().await?;
        Ok(Self { conn, metrics })
    }
}

#[async_trait]
impl ViewCache for RedisViewCache {
    async fn get(&self, key: &str) -> Option<TransactionView> {
        let mut conn = self.conn.clone();

        let existing: Option<String> = match conn.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read failed, treating as miss");
                self.metrics.record_read_failure();
                return None;
            }
        };

        match serde_json::from_str(&existing?) {
            Ok(view) => Some(view),
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to decode cached view, treating as miss");
                self.metrics.record_read_failure();
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &TransactionView, ttl: Duration) -> Result<(), CacheError> {
        let serialized = serde_json::to_string(value).map_err(|e| CacheError(e.to_string()))?;
        let mut conn = self.conn.clone();

        let _: () = conn
            .set_ex(key, serialized, ttl.as_secs())
            .await
            .map_err(|e| CacheError(e.to_string()))?;
        Ok(())
    }
}
