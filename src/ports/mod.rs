//! Capability traits the retrieval pipeline is written against.
//! Each has one production adapter and one in-memory adapter under `crate::adapters`.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use thiserror::Error;

use crate::domain::{ExchangeRateQuote, Transaction, TransactionView};
use crate::fiscal::FiscalDataError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid transaction id: {0}")]
    InvalidId(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Source of truth for purchase transactions.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persists one record and returns its store-assigned id.
    async fn insert(&self, tx: &Transaction) -> StoreResult<String>;

    /// Persists all records or none. Ids are returned in input order.
    async fn insert_batch(&self, txs: &[Transaction]) -> StoreResult<Vec<String>>;

    /// Fails with [`StoreError::InvalidId`] if any id is malformed.
    /// Well-formed ids without a record are left out of the result.
    async fn get_by_ids(&self, ids: &[String]) -> StoreResult<Vec<Transaction>>;

    /// Records with `created_at` in `[start, end)`, oldest first.
    async fn get_by_date_range(&self, start: i64, end: i64) -> StoreResult<Vec<Transaction>>;
}

#[derive(Debug, Error)]
#[error("cache error: {0}")]
pub struct CacheError(pub String);

/// TTL key/value store for enriched views.
#[async_trait]
pub trait ViewCache: Send + Sync {
    /// Misses, connection faults and undecodable entries all yield `None`.
    async fn get(&self, key: &str) -> Option<TransactionView>;

    async fn set(&self, key: &str, value: &TransactionView, ttl: Duration) -> Result<(), CacheError>;
}

/// Point-in-time exchange rate lookup.
#[async_trait]
pub trait ExchangeRateClient: Send + Sync {
    /// `Ok(None)` when the provider has no quote inside the lookback window.
    async fn quote(
        &self,
        currency_label: &str,
        reference_date: NaiveDate,
    ) -> Result<Option<ExchangeRateQuote>, FiscalDataError>;
}
