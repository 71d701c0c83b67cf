use axum::extract::State;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::AppState;

/// Counters for the view cache. Read faults never reach callers, so this is
/// the only place they show up besides the log.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    read_failures: AtomicU64,
    write_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub read_failures: u64,
    pub write_failures: u64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read_failure(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }

    /// Prometheus text exposition format.
    pub fn render(&self) -> String {
        let snap = self.snapshot();
        let mut out = String::new();
        for (name, help, value) in [
            ("view_cache_hits_total", "Cache probes that returned a view.", snap.hits),
            ("view_cache_misses_total", "Cache probes that returned nothing.", snap.misses),
            (
                "view_cache_read_failures_total",
                "Cache reads that failed and were treated as misses.",
                snap.read_failures,
            ),
            (
                "view_cache_write_failures_total",
                "Cache writes that failed after enrichment.",
                snap.write_failures,
            ),
        ] {
            out.push_str(&format!("# HELP {} {}\n# TYPE {} counter\n{} {}\n", name, help, name, name, value));
        }
        out
    }
}

pub async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render()
}
