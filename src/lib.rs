pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod fiscal;
pub mod handlers;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod startup;
pub mod utils;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::adapters::{InMemoryTransactionStore, InMemoryViewCache};
use crate::config::CacheConfig;
use crate::handlers::ApiDoc;
use crate::health::HealthChecks;
use crate::metrics::CacheMetrics;
use crate::ports::ExchangeRateClient;
use crate::services::TransactionService;

#[derive(Clone)]
pub struct AppState {
    pub transactions: Arc<TransactionService>,
    pub metrics: Arc<CacheMetrics>,
    pub health: Arc<HealthChecks>,
    pub start_time: Instant,
}

impl AppState {
    /// State backed by the in-memory store and cache, with no health checks registered.
    pub fn in_memory(rates: Arc<dyn ExchangeRateClient>, cache_config: CacheConfig) -> Self {
        let metrics = Arc::new(CacheMetrics::new());
        let transactions = TransactionService::new(
            Arc::new(InMemoryTransactionStore::new()),
            Arc::new(InMemoryViewCache::new(metrics.clone())),
            rates,
            metrics.clone(),
            cache_config,
        );

        Self {
            transactions: Arc::new(transactions),
            metrics,
            health: Arc::new(HealthChecks::new()),
            start_time: Instant::now(),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(metrics::metrics_handler))
        .route(
            "/v1/transaction",
            post(handlers::transactions::insert_transactions)
                .get(handlers::transactions::get_transactions),
        )
        .route(
            "/v1/transaction/period",
            get(handlers::transactions::get_transactions_by_period),
        )
        .route(
            "/v1/transaction/epoch-period",
            get(handlers::transactions::get_transactions_by_period_epoch),
        )
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CatchPanicLayer::new())
        .layer(axum::middleware::from_fn(
            middleware::request_logger_middleware,
        ))
        .with_state(state)
}
