//! Retrieval and enrichment of purchase transactions.
//!
//! Id lookups go through the view cache first; range lookups always hit the
//! store. Every returned view carries the exchange rate it was converted with.

use chrono::Utc;
use std::sync::Arc;

use crate::config::{CacheConfig, CacheFillStrategy};
use crate::domain::{cache_key, NewTransaction, Transaction, TransactionView};
use crate::error::AppError;
use crate::metrics::CacheMetrics;
use crate::ports::{ExchangeRateClient, TransactionStore, ViewCache};
use crate::utils::dates;

#[derive(Clone)]
pub struct TransactionService {
    store: Arc<dyn TransactionStore>,
    cache: Arc<dyn ViewCache>,
    rates: Arc<dyn ExchangeRateClient>,
    metrics: Arc<CacheMetrics>,
    cache_config: CacheConfig,
}

impl TransactionService {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        cache: Arc<dyn ViewCache>,
        rates: Arc<dyn ExchangeRateClient>,
        metrics: Arc<CacheMetrics>,
        cache_config: CacheConfig,
    ) -> Self {
        Self {
            store,
            cache,
            rates,
            metrics,
            cache_config,
        }
    }

    pub async fn insert_one(&self, new_tx: NewTransaction) -> Result<String, AppError> {
        let tx = normalize(new_tx)?;

        self.store
            .insert(&tx)
            .await
            .map_err(|e| AppError::Validation(e.to_string()))
    }

    /// Inserts every purchase or none. Ids come back in input order.
    pub async fn insert_many(&self, new_txs: Vec<NewTransaction>) -> Result<Vec<String>, AppError> {
        if new_txs.is_empty() {
            return Ok(Vec::new());
        }

        let txs = new_txs
            .into_iter()
            .map(normalize)
            .collect::<Result<Vec<_>, _>>()?;

        let ids = self.store.insert_batch(&txs).await?;
        tracing::debug!(count = ids.len(), "inserted transaction batch");
        Ok(ids)
    }

    pub async fn get_by_ids(
        &self,
        ids: &[String],
        currency: &str,
    ) -> Result<Vec<TransactionView>, AppError> {
        if ids.is_empty() {
            return Err(AppError::Input("at least one transaction id is required".to_string()));
        }

        let mut hits = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for id in ids {
            match self.cache.get(&cache_key(id, currency)).await {
                Some(view) => {
                    self.metrics.record_hit();
                    hits.push(view);
                }
                None => {
                    self.metrics.record_miss();
                    missing.push(id.clone());
                }
            }
        }

        if missing.is_empty() {
            tracing::debug!(count = hits.len(), currency, "served every id from cache");
            return Ok(hits);
        }

        tracing::debug!(
            hits = hits.len(),
            misses = missing.len(),
            currency,
            strategy = ?self.cache_config.fill_strategy,
            "cache incomplete, loading from store"
        );

        match self.cache_config.fill_strategy {
            CacheFillStrategy::RefetchAll => {
                let records = self.store.get_by_ids(ids).await?;
                self.enrich_and_populate(records, currency).await
            }
            CacheFillStrategy::MissingOnly => {
                let records = self.store.get_by_ids(&missing).await?;
                let fetched = self.enrich_and_populate(records, currency).await?;
                Ok(merge_in_request_order(ids, hits, fetched))
            }
        }
    }

    /// Uncached lookup over whole UTC days: `[start_date 00:00, end_date 00:00)`.
    pub async fn get_by_period(
        &self,
        start_date: &str,
        end_date: &str,
        currency: &str,
    ) -> Result<Vec<TransactionView>, AppError> {
        let start = parse_bound("startDate", start_date)?;
        let end = parse_bound("endDate", end_date)?;

        self.get_by_period_epoch(start, end, currency).await
    }

    pub async fn get_by_period_epoch(
        &self,
        start_epoch: i64,
        end_epoch: i64,
        currency: &str,
    ) -> Result<Vec<TransactionView>, AppError> {
        let records = self.store.get_by_date_range(start_epoch, end_epoch).await?;
        tracing::debug!(count = records.len(), start_epoch, end_epoch, "loaded transactions in range");

        let mut views = Vec::with_capacity(records.len());
        for tx in records {
            views.push(self.enrich(tx, currency).await?);
        }
        Ok(views)
    }

    async fn enrich(&self, tx: Transaction, currency: &str) -> Result<TransactionView, AppError> {
        let quote = self
            .rates
            .quote(currency, tx.purchase_date)
            .await
            .map_err(|e| {
                tracing::error!(currency, error = %e, "exchange rate lookup failed");
                AppError::from(e)
            })?
            .ok_or_else(|| AppError::RateUnavailable {
                currency: currency.to_string(),
                date: tx.purchase_date,
            })?;

        Ok(TransactionView::enrich(tx, &quote))
    }

    async fn enrich_and_populate(
        &self,
        records: Vec<Transaction>,
        currency: &str,
    ) -> Result<Vec<TransactionView>, AppError> {
        let mut views = Vec::with_capacity(records.len());
        for tx in records {
            let view = self.enrich(tx, currency).await?;
            self.populate(&view, currency).await;
            views.push(view);
        }
        Ok(views)
    }

    async fn populate(&self, view: &TransactionView, currency: &str) {
        let key = cache_key(&view.id, currency);
        if let Err(e) = self.cache.set(&key, view, self.cache_config.ttl).await {
            tracing::warn!(key = %key, error = %e, "failed to cache transaction view");
            self.metrics.record_write_failure();
        }
    }
}

fn normalize(new_tx: NewTransaction) -> Result<Transaction, AppError> {
    new_tx
        .normalize(Utc::now())
        .map_err(|e| AppError::Input(format!("purchase_date must be YYYY-MM-DD: {}", e)))
}

fn parse_bound(field: &str, raw: &str) -> Result<i64, AppError> {
    dates::parse_date(raw)
        .map(dates::midnight_epoch)
        .map_err(|e| AppError::Input(format!("{} must be YYYY-MM-DD: {}", field, e)))
}

/// Orders cached and freshly loaded views by their position in `ids`.
/// Loaded views whose id does not textually match a requested id go last.
fn merge_in_request_order(
    ids: &[String],
    hits: Vec<TransactionView>,
    fetched: Vec<TransactionView>,
) -> Vec<TransactionView> {
    let mut pool: Vec<TransactionView> = hits.into_iter().chain(fetched).collect();
    let mut merged = Vec::with_capacity(pool.len());

    for id in ids {
        if let Some(pos) = pool.iter().position(|view| &view.id == id) {
            merged.push(pool.remove(pos));
        }
    }
    merged.extend(pool);
    merged
}
