//! Upstream request metrics for the fetch gateway
//!
//! Tracks a rolling latency window and lifetime success counts for calls to
//! the remote data source.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for latency percentiles
const MAX_SAMPLES: usize = 100;

/// Summary of upstream behavior
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamMetrics {
    /// Name of the remote data source
    pub source_name: String,
    /// 50th percentile latency of successful calls in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency of successful calls in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    pub total_requests: u64,
    pub failed_requests: u64,
    /// Outcome of the most recent call, if any
    pub last_success: Option<bool>,
    pub last_request_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct MetricsState {
    latencies_ms: VecDeque<f64>,
    total_requests: u64,
    failed_requests: u64,
    last_success: Option<bool>,
    last_request_at: Option<DateTime<Utc>>,
}

/// Collects upstream call outcomes
pub struct MetricsCollector {
    source_name: String,
    state: RwLock<MetricsState>,
}

impl MetricsCollector {
    pub fn new(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            state: RwLock::new(MetricsState::default()),
        }
    }

    /// Records an upstream call with its duration and outcome
    pub async fn record_request(&self, duration: Duration, success: bool) {
        let mut state = self.state.write().await;
        state.total_requests += 1;
        if success {
            if state.latencies_ms.len() >= MAX_SAMPLES {
                state.latencies_ms.pop_front();
            }
            state.latencies_ms.push_back(duration.as_secs_f64() * 1000.0);
        } else {
            state.failed_requests += 1;
        }
        state.last_success = Some(success);
        state.last_request_at = Some(Utc::now());
    }

    /// Computes current metrics from collected samples
    pub async fn snapshot(&self) -> UpstreamMetrics {
        let state = self.state.read().await;

        let mut latencies: Vec<f64> = state.latencies_ms.iter().copied().collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let success_rate = if state.total_requests > 0 {
            (state.total_requests - state.failed_requests) as f64 / state.total_requests as f64
        } else {
            1.0
        };

        UpstreamMetrics {
            source_name: self.source_name.clone(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            total_requests: state.total_requests,
            failed_requests: state.failed_requests,
            last_success: state.last_success,
            last_request_at: state.last_request_at,
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_collector() {
        let collector = MetricsCollector::new("test");

        collector.record_request(Duration::from_millis(100), true).await;
        collector.record_request(Duration::from_millis(200), true).await;
        collector.record_request(Duration::from_millis(150), false).await;

        let metrics = collector.snapshot().await;

        assert_eq!(metrics.source_name, "test");
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.last_success, Some(false));
        assert!(metrics.success_rate > 0.6 && metrics.success_rate < 0.7);
        assert!(metrics.latency_p99_ms >= 199.0);
    }

    #[tokio::test]
    async fn test_empty_collector_reports_full_success() {
        let metrics = MetricsCollector::new("idle").snapshot().await;
        assert_eq!(metrics.total_requests, 0);
        assert_eq!(metrics.success_rate, 1.0);
        assert_eq!(metrics.last_success, None);
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        assert_eq!(percentile(&values, 50.0), 5.0);
        assert_eq!(percentile(&values, 99.0), 9.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }
}
