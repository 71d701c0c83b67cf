use anyhow::Context;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::CACHE_TTL;
use crate::fiscal::client::DEFAULT_TIMEOUT_SECS;

pub const DEFAULT_FISCAL_DATA_URL: &str =
    "https://api.fiscaldata.treasury.gov/services/api/fiscal_service";

#[derive(Debug, Clone)]
pub struct Config {
    pub env: String,
    pub server_port: u16,
    pub database_url: String,
    pub redis_url: String,
    pub fiscal_data: FiscalDataConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone)]
pub struct FiscalDataConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub fill_strategy: CacheFillStrategy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: CACHE_TTL,
            fill_strategy: CacheFillStrategy::RefetchAll,
        }
    }
}

/// What `get_by_ids` does when only some ids are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheFillStrategy {
    /// Drop the hits and reload every requested id from the store.
    #[default]
    RefetchAll,
    /// Load only the missing ids and merge them with the hits.
    MissingOnly,
}

impl FromStr for CacheFillStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "refetch_all" => Ok(CacheFillStrategy::RefetchAll),
            "missing_only" => Ok(CacheFillStrategy::MissingOnly),
            other => anyhow::bail!(
                "CACHE_FILL_STRATEGY must be 'refetch_all' or 'missing_only', got '{}'",
                other
            ),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_port = var("SERVER_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a port number")?;

        let timeout_secs = match var("FISCAL_DATA_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("FISCAL_DATA_TIMEOUT_SECS must be a number of seconds")?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let ttl = match var("CACHE_TTL_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .context("CACHE_TTL_SECS must be a number of seconds")?,
            ),
            None => CACHE_TTL,
        };
        // Redis rejects `SET ... EX 0`, so every cache write would fail.
        if ttl.as_secs() == 0 {
            anyhow::bail!("CACHE_TTL_SECS must be greater than 0");
        }

        let fill_strategy = match var("CACHE_FILL_STRATEGY") {
            Some(raw) => raw.parse()?,
            None => CacheFillStrategy::default(),
        };

        Ok(Config {
            env: var("APP_ENV").unwrap_or_else(|| "dev".to_string()),
            server_port,
            database_url: var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: var("REDIS_URL").context("REDIS_URL must be set")?,
            fiscal_data: FiscalDataConfig {
                base_url: var("FISCAL_DATA_URL")
                    .unwrap_or_else(|| DEFAULT_FISCAL_DATA_URL.to_string()),
                timeout_secs,
            },
            cache: CacheConfig { ttl, fill_strategy },
        })
    }

    pub fn is_production(&self) -> bool {
        self.env == "prod"
    }
}
