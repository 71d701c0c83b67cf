use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::fiscal::FiscalDataClient;
use crate::utils::dates;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);
/// Any published currency works; the probe only needs a 2xx with a decodable body.
const PROBE_CURRENCY: &str = "Canada-Dollar";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: HashMap<String, DependencyStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyStatus {
    Healthy { status: String, latency_ms: u64 },
    Unhealthy { status: String, error: String },
}

impl DependencyStatus {
    fn healthy(start: Instant) -> Self {
        DependencyStatus::Healthy {
            status: "healthy".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn unhealthy(error: impl ToString) -> Self {
        DependencyStatus::Unhealthy {
            status: "unhealthy".to_string(),
            error: error.to_string(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, DependencyStatus::Healthy { .. })
    }
}

#[async_trait]
pub trait DependencyChecker: Send + Sync {
    async fn check(&self) -> DependencyStatus;
}

pub struct PostgresChecker {
    pool: sqlx::PgPool,
}

impl PostgresChecker {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DependencyChecker for PostgresChecker {
    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => DependencyStatus::healthy(start),
            Err(e) => DependencyStatus::unhealthy(e),
        }
    }
}

pub struct RedisChecker {
    url: String,
}

impl RedisChecker {
    pub fn new(url: String) -> Self {
        Self { url }
    }

    async fn ping(&self) -> redis::RedisResult<String> {
        let client = redis::Client::open(self.url.as_str())?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await
    }
}

#[async_trait]
impl DependencyChecker for RedisChecker {
    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match self.ping().await {
            Ok(_) => DependencyStatus::healthy(start),
            Err(e) => DependencyStatus::unhealthy(e),
        }
    }
}

pub struct FiscalDataChecker {
    client: FiscalDataClient,
}

impl FiscalDataChecker {
    pub fn new(client: FiscalDataClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DependencyChecker for FiscalDataChecker {
    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        let today = dates::utc_date(Utc::now());
        match self.client.get_rates(PROBE_CURRENCY, today).await {
            Ok(_) => DependencyStatus::healthy(start),
            Err(e) => DependencyStatus::unhealthy(e),
        }
    }
}

struct RegisteredCheck {
    name: String,
    critical: bool,
    checker: Box<dyn DependencyChecker>,
}

/// Named dependency probes. A failing critical dependency makes the service
/// `unhealthy`; any other failure only makes it `degraded`.
#[derive(Default)]
pub struct HealthChecks {
    checks: Vec<RegisteredCheck>,
}

impl HealthChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check(
        mut self,
        name: impl Into<String>,
        critical: bool,
        checker: impl DependencyChecker + 'static,
    ) -> Self {
        self.checks.push(RegisteredCheck {
            name: name.into(),
            critical,
            checker: Box::new(checker),
        });
        self
    }
}

pub async fn check_health(checks: &HealthChecks, start_time: Instant) -> HealthResponse {
    let results = join_all(checks.checks.iter().map(|check| async move {
        let status = timeout(CHECK_TIMEOUT, check.checker.check())
            .await
            .unwrap_or_else(|_| DependencyStatus::unhealthy("timeout"));
        (check, status)
    }))
    .await;

    let mut has_critical_failure = false;
    let mut has_non_critical_failure = false;
    let mut dependencies = HashMap::new();

    for (check, status) in results {
        if !status.is_healthy() {
            if check.critical {
                has_critical_failure = true;
            } else {
                has_non_critical_failure = true;
            }
        }
        dependencies.insert(check.name.clone(), status);
    }

    let status = if has_critical_failure {
        "unhealthy"
    } else if has_non_critical_failure {
        "degraded"
    } else {
        "healthy"
    };

    HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
        dependencies,
    }
}
