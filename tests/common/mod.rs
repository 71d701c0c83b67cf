#![allow(dead_code)]

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use purchase_ledger::adapters::{InMemoryTransactionStore, InMemoryViewCache};
use purchase_ledger::config::{CacheConfig, CacheFillStrategy};
use purchase_ledger::domain::{ExchangeRateQuote, NewTransaction, Transaction, TransactionView};
use purchase_ledger::fiscal::FiscalDataError;
use purchase_ledger::metrics::CacheMetrics;
use purchase_ledger::ports::{
    CacheError, ExchangeRateClient, StoreError, StoreResult, TransactionStore, ViewCache,
};
use purchase_ledger::services::TransactionService;

pub const CANADA: &str = "Canada-Dollar";

pub fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

pub fn purchase(amount: &str, description: &str, date: Option<&str>) -> NewTransaction {
    NewTransaction {
        purchase_amount: dec(amount),
        description: description.to_string(),
        purchase_date: date.map(str::to_string),
    }
}

/// In-memory store that counts lookups.
#[derive(Default)]
pub struct CountingStore {
    pub inner: InMemoryTransactionStore,
    pub get_by_ids_calls: AtomicUsize,
    pub last_ids: Mutex<Vec<String>>,
    pub range_calls: AtomicUsize,
    pub insert_calls: AtomicUsize,
}

impl CountingStore {
    pub fn get_by_ids_calls(&self) -> usize {
        self.get_by_ids_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionStore for CountingStore {
    async fn insert(&self, tx: &Transaction) -> StoreResult<String> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(tx).await
    }

    async fn insert_batch(&self, txs: &[Transaction]) -> StoreResult<Vec<String>> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_batch(txs).await
    }

    async fn get_by_ids(&self, ids: &[String]) -> StoreResult<Vec<Transaction>> {
        self.get_by_ids_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_ids.lock().unwrap() = ids.to_vec();
        self.inner.get_by_ids(ids).await
    }

    async fn get_by_date_range(&self, start: i64, end: i64) -> StoreResult<Vec<Transaction>> {
        self.range_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_date_range(start, end).await
    }
}

/// Store whose backend rejects every call.
pub struct FailingStore;

#[async_trait]
impl TransactionStore for FailingStore {
    async fn insert(&self, _tx: &Transaction) -> StoreResult<String> {
        Err(StoreError::Backend("connection reset".to_string()))
    }

    async fn insert_batch(&self, _txs: &[Transaction]) -> StoreResult<Vec<String>> {
        Err(StoreError::Backend("connection reset".to_string()))
    }

    async fn get_by_ids(&self, _ids: &[String]) -> StoreResult<Vec<Transaction>> {
        Err(StoreError::Backend("connection reset".to_string()))
    }

    async fn get_by_date_range(&self, _start: i64, _end: i64) -> StoreResult<Vec<Transaction>> {
        Err(StoreError::Backend("connection reset".to_string()))
    }
}

/// Rate provider returning a fixed rate, or nothing when `rate` is `None`.
pub struct StubRates {
    pub rate: Option<BigDecimal>,
    pub calls: AtomicUsize,
    pub fail_with_status: Option<u16>,
}

impl StubRates {
    pub fn with_rate(rate: &str) -> Self {
        Self {
            rate: Some(dec(rate)),
            calls: AtomicUsize::new(0),
            fail_with_status: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            rate: None,
            calls: AtomicUsize::new(0),
            fail_with_status: None,
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            rate: None,
            calls: AtomicUsize::new(0),
            fail_with_status: Some(status),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeRateClient for StubRates {
    async fn quote(
        &self,
        currency_label: &str,
        reference_date: NaiveDate,
    ) -> Result<Option<ExchangeRateQuote>, FiscalDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.fail_with_status {
            return Err(FiscalDataError::UnexpectedStatus(status));
        }

        Ok(self.rate.clone().map(|rate| ExchangeRateQuote {
            currency_label: currency_label.to_string(),
            rate,
            quote_date: reference_date,
        }))
    }
}

/// In-memory cache that records every write and its TTL.
pub struct RecordingCache {
    pub inner: InMemoryViewCache,
    pub writes: Mutex<Vec<(String, Duration)>>,
    pub reads: AtomicUsize,
}

impl RecordingCache {
    pub fn new(metrics: Arc<CacheMetrics>) -> Self {
        Self {
            inner: InMemoryViewCache::new(metrics),
            writes: Mutex::new(Vec::new()),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> Vec<(String, Duration)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ViewCache for RecordingCache {
    async fn get(&self, key: &str) -> Option<TransactionView> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &TransactionView, ttl: Duration) -> Result<(), CacheError> {
        self.writes.lock().unwrap().push((key.to_string(), ttl));
        self.inner.set(key, value, ttl).await
    }
}

/// Cache whose backend is unreachable.
pub struct BrokenCache;

#[async_trait]
impl ViewCache for BrokenCache {
    async fn get(&self, _key: &str) -> Option<TransactionView> {
        None
    }

    async fn set(&self, _key: &str, _value: &TransactionView, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError("connection refused".to_string()))
    }
}

pub struct Harness {
    pub service: TransactionService,
    pub store: Arc<CountingStore>,
    pub cache: Arc<RecordingCache>,
    pub rates: Arc<StubRates>,
    pub metrics: Arc<CacheMetrics>,
}

pub fn harness(rates: StubRates, fill_strategy: CacheFillStrategy) -> Harness {
    let metrics = Arc::new(CacheMetrics::new());
    let store = Arc::new(CountingStore::default());
    let cache = Arc::new(RecordingCache::new(metrics.clone()));
    let rates = Arc::new(rates);

    let service = TransactionService::new(
        store.clone(),
        cache.clone(),
        rates.clone(),
        metrics.clone(),
        CacheConfig {
            fill_strategy,
            ..CacheConfig::default()
        },
    );

    Harness {
        service,
        store,
        cache,
        rates,
        metrics,
    }
}
