use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;

use crate::adapters::{PostgresTransactionStore, RedisViewCache};
use crate::config::Config;
use crate::fiscal::FiscalDataClient;
use crate::health::{FiscalDataChecker, HealthChecks, PostgresChecker, RedisChecker};
use crate::metrics::CacheMetrics;
use crate::services::TransactionService;
use crate::AppState;

pub struct ValidationReport {
    pub environment: bool,
    pub database: bool,
    pub redis: bool,
    pub fiscal_data: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.environment && self.database && self.redis && self.fiscal_data
    }

    pub fn print(&self) {
        println!("\n=== Startup Validation Report ===");
        println!("Environment Variables: {}", status(self.environment));
        println!("Database Connectivity: {}", status(self.database));
        println!("Redis Connectivity:    {}", status(self.redis));
        println!("Fiscal Data API:       {}", status(self.fiscal_data));

        if !self.errors.is_empty() {
            println!("\nErrors:");
            for error in &self.errors {
                println!("  ❌ {}", error);
            }
        }

        println!("\nOverall Status: {}", if self.is_valid() { "✅ PASS" } else { "❌ FAIL" });
        println!("=================================\n");
    }
}

fn status(ok: bool) -> &'static str {
    if ok { "✅ OK" } else { "❌ FAIL" }
}

/// Connectivity checks run once before the server starts listening.
pub async fn validate_environment(config: &Config, pool: &PgPool) -> Result<ValidationReport> {
    let mut report = ValidationReport {
        environment: true,
        database: true,
        redis: true,
        fiscal_data: true,
        errors: Vec::new(),
    };

    if let Err(e) = validate_config(config) {
        report.environment = false;
        report.errors.push(format!("Environment: {}", e));
    }

    if let Err(e) = validate_database(pool).await {
        report.database = false;
        report.errors.push(format!("Database: {}", e));
    }

    if let Err(e) = validate_redis(&config.redis_url).await {
        report.redis = false;
        report.errors.push(format!("Redis: {}", e));
    }

    if let Err(e) = validate_fiscal_data(config).await {
        report.fiscal_data = false;
        report.errors.push(format!("Fiscal Data: {}", e));
    }

    Ok(report)
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.database_url.is_empty() {
        anyhow::bail!("DATABASE_URL is empty");
    }
    if config.redis_url.is_empty() {
        anyhow::bail!("REDIS_URL is empty");
    }
    if config.fiscal_data.base_url.is_empty() {
        anyhow::bail!("FISCAL_DATA_URL is empty");
    }
    if config.server_port == 0 {
        anyhow::bail!("SERVER_PORT must be greater than 0");
    }
    if config.cache.ttl.as_secs() == 0 {
        anyhow::bail!("CACHE_TTL_SECS must be at least one second");
    }

    url::Url::parse(&config.database_url).context("DATABASE_URL is not a valid URL")?;
    url::Url::parse(&config.redis_url).context("REDIS_URL is not a valid URL")?;
    url::Url::parse(&config.fiscal_data.base_url).context("FISCAL_DATA_URL is not a valid URL")?;

    Ok(())
}

async fn validate_database(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Failed to connect to database")?;

    sqlx::query("SELECT 1 FROM transactions LIMIT 1")
        .fetch_optional(pool)
        .await
        .context("transactions table missing, run `db migrate`")?;

    Ok(())
}

async fn validate_redis(redis_url: &str) -> Result<()> {
    let client = redis::Client::open(redis_url).context("Invalid Redis URL")?;

    let mut conn = client
        .get_multiplexed_tokio_connection()
        .await
        .context("Failed to connect to Redis")?;

    redis::cmd("PING")
        .query_async::<_, String>(&mut conn)
        .await
        .context("Redis PING failed")?;

    Ok(())
}

async fn validate_fiscal_data(config: &Config) -> Result<()> {
    let client = FiscalDataClient::from_config(&config.fiscal_data);
    let response = reqwest::Client::new()
        .head(client.rates_url())
        .send()
        .await
        .context("Failed to reach Fiscal Data API")?;

    if response.status().is_server_error() {
        anyhow::bail!("Fiscal Data API returned status: {}", response.status());
    }

    Ok(())
}

/// Wires the Postgres store, Redis cache and Fiscal Data client into the app state.
pub async fn build_state(config: &Config, pool: PgPool) -> Result<AppState> {
    let metrics = Arc::new(CacheMetrics::new());
    let fiscal_client = FiscalDataClient::from_config(&config.fiscal_data);

    let store = Arc::new(PostgresTransactionStore::new(pool.clone()));
    let cache = Arc::new(
        RedisViewCache::connect(&config.redis_url, metrics.clone())
            .await
            .context("Failed to connect to Redis")?,
    );

    let transactions = TransactionService::new(
        store,
        cache,
        Arc::new(fiscal_client.clone()),
        metrics.clone(),
        config.cache,
    );

    let health = HealthChecks::new()
        .with_check("postgres", true, PostgresChecker::new(pool))
        .with_check("redis", false, RedisChecker::new(config.redis_url.clone()))
        .with_check("fiscal_data", false, FiscalDataChecker::new(fiscal_client));

    Ok(AppState {
        transactions: Arc::new(transactions),
        metrics,
        health: Arc::new(health),
        start_time: Instant::now(),
    })
}
