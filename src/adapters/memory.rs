//! In-memory implementations of the store and cache traits.
//! Used by tests and by local runs that have no Postgres or Redis around.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{truncate_description, Transaction, TransactionView};
use crate::metrics::CacheMetrics;
use crate::ports::{CacheError, StoreError, StoreResult, TransactionStore, ViewCache};

#[derive(Clone, Default)]
pub struct InMemoryTransactionStore {
    records: Arc<RwLock<Vec<(Uuid, Transaction)>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn prepare(tx: &Transaction) -> (Uuid, Transaction) {
        let id = Uuid::new_v4();
        let mut stored = tx.clone();
        stored.id = Some(id.to_string());
        stored.description = truncate_description(&tx.description);
        (id, stored)
    }
}

fn parse_id(id: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, tx: &Transaction) -> StoreResult<String> {
        let (id, stored) = Self::prepare(tx);
        self.records.write().await.push((id, stored));
        Ok(id.to_string())
    }

    async fn insert_batch(&self, txs: &[Transaction]) -> StoreResult<Vec<String>> {
        let prepared: Vec<_> = txs.iter().map(Self::prepare).collect();
        let ids = prepared.iter().map(|(id, _)| id.to_string()).collect();
        self.records.write().await.extend(prepared);
        Ok(ids)
    }

    async fn get_by_ids(&self, ids: &[String]) -> StoreResult<Vec<Transaction>> {
        let wanted = ids
            .iter()
            .map(|id| parse_id(id))
            .collect::<StoreResult<Vec<_>>>()?;

        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|(id, _)| wanted.contains(id))
            .map(|(_, tx)| tx.clone())
            .collect())
    }

    async fn get_by_date_range(&self, start: i64, end: i64) -> StoreResult<Vec<Transaction>> {
        let records = self.records.read().await;
        let mut found: Vec<Transaction> = records
            .iter()
            .filter(|(_, tx)| tx.created_at >= start && tx.created_at < end)
            .map(|(_, tx)| tx.clone())
            .collect();
        found.sort_by_key(|tx| tx.created_at);
        Ok(found)
    }
}

/// TTL map holding JSON blobs, the same shape Redis stores.
#[derive(Clone)]
pub struct InMemoryViewCache {
    entries: Arc<RwLock<HashMap<String, (String, Instant)>>>,
    metrics: Arc<CacheMetrics>,
}

impl InMemoryViewCache {
    pub fn new(metrics: Arc<CacheMetrics>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            metrics,
        }
    }

    /// Stores a raw blob, bypassing serialization.
    pub async fn put_raw(&self, key: &str, blob: &str, ttl: Duration) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), (blob.to_string(), Instant::now() + ttl));
    }
}

#[async_trait]
impl ViewCache for InMemoryViewCache {
    async fn get(&self, key: &str) -> Option<TransactionView> {
        let blob = {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((blob, expires_at)) if *expires_at > Instant::now() => blob.clone(),
                _ => return None,
            }
        };

        match serde_json::from_str(&blob) {
            Ok(view) => Some(view),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding undecodable cache entry");
                self.metrics.record_read_failure();
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &TransactionView, ttl: Duration) -> Result<(), CacheError> {
        let blob = serde_json::to_string(value).map_err(|e| CacheError(e.to_string()))?;
        self.put_raw(key, &blob, ttl).await;
        Ok(())
    }
}
