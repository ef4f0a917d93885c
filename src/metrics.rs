//! Service metrics for the dashboard server.
//!
//! Only request-level counters live here; dataset contents are never kept.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

const TIMING_WINDOW: usize = 10_000;

/// Counters shared by all request handlers
pub struct ServiceMetrics {
    /// HTML dashboards rendered successfully
    pub dashboards_rendered: AtomicU64,
    /// API scoring calls answered successfully
    pub api_calls: AtomicU64,
    /// Rows scored across all requests
    pub rows_scored: AtomicU64,
    /// Rows labelled Fraud across all requests
    pub rows_flagged: AtomicU64,
    /// Failed requests by error kind
    rejections: RwLock<HashMap<String, u64>>,
    /// Pipeline run times in microseconds (most recent window)
    processing_times: RwLock<Vec<u64>>,
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            dashboards_rendered: AtomicU64::new(0),
            api_calls: AtomicU64::new(0),
            rows_scored: AtomicU64::new(0),
            rows_flagged: AtomicU64::new(0),
            rejections: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record one successful pipeline run
    pub fn record_run(&self, processing_time: Duration, rows: usize, flagged: usize, api: bool) {
        if api {
            self.api_calls.fetch_add(1, Ordering::Relaxed);
        } else {
            self.dashboards_rendered.fetch_add(1, Ordering::Relaxed);
        }
        self.rows_scored.fetch_add(rows as u64, Ordering::Relaxed);
        self.rows_flagged.fetch_add(flagged as u64, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            if times.len() > TIMING_WINDOW {
                times.drain(0..TIMING_WINDOW / 2);
            }
        }
    }

    /// Record a request that stopped with an error
    pub fn record_rejection(&self, kind: &str) {
        if let Ok(mut by_kind) = self.rejections.write() {
            *by_kind.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    pub fn get_processing_stats(&self) -> ProcessingStats {
        let sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => {
                let mut sorted = times.clone();
                sorted.sort_unstable();
                sorted
            }
            _ => return ProcessingStats::default(),
        };

        let count = sorted.len();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: at(0.50),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    pub fn get_rejections(&self) -> HashMap<String, u64> {
        self.rejections
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Share of scored rows that were flagged, in percent
    pub fn flagged_rate(&self) -> f64 {
        let scored = self.rows_scored.load(Ordering::Relaxed);
        if scored == 0 {
            return 0.0;
        }
        self.rows_flagged.load(Ordering::Relaxed) as f64 / scored as f64 * 100.0
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            dashboards_rendered: self.dashboards_rendered.load(Ordering::Relaxed),
            api_calls: self.api_calls.load(Ordering::Relaxed),
            rows_scored: self.rows_scored.load(Ordering::Relaxed),
            rows_flagged: self.rows_flagged.load(Ordering::Relaxed),
            flagged_rate_pct: self.flagged_rate(),
            rejections: self.get_rejections(),
            processing: self.get_processing_stats(),
        }
    }

    /// Log a summary block
    pub fn print_summary(&self) {
        let snap = self.snapshot();

        info!("==================== DASHBOARD SERVICE METRICS ====================");
        info!(
            "Dashboards rendered: {:>8}  |  API calls: {:>8}  |  Uptime: {}s",
            snap.dashboards_rendered, snap.api_calls, snap.uptime_secs
        );
        info!(
            "Rows scored: {:>10}  |  Rows flagged: {:>8} ({:.2}%)",
            snap.rows_scored, snap.rows_flagged, snap.flagged_rate_pct
        );
        info!(
            "Pipeline time (us): mean={} p50={} p95={} p99={} max={}",
            snap.processing.mean_us,
            snap.processing.p50_us,
            snap.processing.p95_us,
            snap.processing.p99_us,
            snap.processing.max_us
        );
        if !snap.rejections.is_empty() {
            for (kind, count) in &snap.rejections {
                info!("Rejected ({kind}): {count}");
            }
        }
        info!("===================================================================");
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline timing statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Point-in-time view served at `/metrics`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub dashboards_rendered: u64,
    pub api_calls: u64,
    pub rows_scored: u64,
    pub rows_flagged: u64,
    pub flagged_rate_pct: f64,
    pub rejections: HashMap<String, u64>,
    pub processing: ProcessingStats,
}

/// Logs a summary on a fixed interval
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_run(Duration::from_micros(100), 500, 20, false);
        metrics.record_run(Duration::from_micros(300), 100, 4, true);

        let snap = metrics.snapshot();
        assert_eq!(snap.dashboards_rendered, 1);
        assert_eq!(snap.api_calls, 1);
        assert_eq!(snap.rows_scored, 600);
        assert_eq!(snap.rows_flagged, 24);
        assert!((snap.flagged_rate_pct - 4.0).abs() < 1e-9);
        assert_eq!(snap.processing.count, 2);
        assert_eq!(snap.processing.mean_us, 200);
        assert_eq!(snap.processing.max_us, 300);
    }

    #[test]
    fn test_rejections_by_kind() {
        let metrics = ServiceMetrics::new();
        metrics.record_rejection("missing_file");
        metrics.record_rejection("missing_file");
        metrics.record_rejection("missing_columns");

        let rejections = metrics.get_rejections();
        assert_eq!(rejections.get("missing_file"), Some(&2));
        assert_eq!(rejections.get("missing_columns"), Some(&1));
    }

    #[test]
    fn test_empty_stats() {
        let metrics = ServiceMetrics::new();
        assert_eq!(metrics.get_processing_stats().count, 0);
        assert_eq!(metrics.flagged_rate(), 0.0);
    }
}
