//! Server-side fetch gateway
//!
//! Proxies the remote data source behind a stable local contract. Upstream
//! faults never cross this boundary: they are logged and turned into an
//! error envelope with an empty batch.

use crate::{
    client::AssetFeed,
    config::GatewayConfig,
    constants::FETCH_FAILED_MESSAGE,
    error::FetchError,
    metrics::{MetricsCollector, UpstreamMetrics},
    provider::MarketDataSource,
    types::{AssetEnvelope, AssetRecord, ComponentHealth, HealthStatus},
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Last successful upstream result
struct CachedBatch {
    records: Vec<AssetRecord>,
    fetched_at: Instant,
}

/// Fetch gateway
///
/// Holds a revalidation cache: a successful upstream result is reused until
/// it is older than `GatewayConfig::revalidate`. Failures are never cached.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use crypto_price_tracker::{FetchGateway, providers::CoinGeckoSource};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = FetchGateway::new(Arc::new(CoinGeckoSource::new()?));
/// let envelope = gateway.fetch_assets().await;
/// match envelope.error {
///     Some(message) => eprintln!("{}", message),
///     None => println!("{} assets", envelope.data.len()),
/// }
/// # Ok(())
/// # }
/// ```
pub struct FetchGateway {
    source: Arc<dyn MarketDataSource>,
    config: GatewayConfig,
    cache: RwLock<Option<CachedBatch>>,
    metrics: MetricsCollector,
}

impl FetchGateway {
    /// Creates a gateway with the default asset list and revalidation window
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self::with_config(source, GatewayConfig::default())
    }

    pub fn with_config(source: Arc<dyn MarketDataSource>, config: GatewayConfig) -> Self {
        let metrics = MetricsCollector::new(source.source_name());
        Self {
            source,
            config,
            cache: RwLock::new(None),
            metrics,
        }
    }

    /// Fetches the configured assets
    ///
    /// Always returns an envelope; on failure `data` is empty and `error`
    /// carries a displayable message.
    pub async fn fetch_assets(&self) -> AssetEnvelope {
        if let Some(records) = self.fresh_cached().await {
            tracing::debug!(count = records.len(), "Serving assets from revalidation cache");
            return AssetEnvelope::ok(records);
        }

        let start = Instant::now();
        match self.source.fetch_markets(&self.config.asset_ids).await {
            Ok(records) => {
                tracing::debug!(
                    count = records.len(),
                    source = self.source.source_name(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Fetched assets from upstream"
                );
                self.metrics.record_request(start.elapsed(), true).await;
                *self.cache.write().await = Some(CachedBatch {
                    records: records.clone(),
                    fetched_at: Instant::now(),
                });
                AssetEnvelope::ok(records)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    source = self.source.source_name(),
                    "Error fetching market data"
                );
                self.metrics.record_request(start.elapsed(), false).await;
                AssetEnvelope::failed(FETCH_FAILED_MESSAGE)
            }
        }
    }

    async fn fresh_cached(&self) -> Option<Vec<AssetRecord>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|batch| batch.fetched_at.elapsed() < self.config.revalidate)
            .map(|batch| batch.records.clone())
    }

    /// Returns the name of the remote data source
    pub fn source_name(&self) -> &'static str {
        self.source.source_name()
    }

    /// Gets upstream metrics including latency percentiles and success rate
    pub async fn metrics(&self) -> UpstreamMetrics {
        self.metrics.snapshot().await
    }

    /// Perform a health check on the gateway
    ///
    /// Healthy when the revalidation cache is fresh, degraded when only a
    /// stale batch exists or the last upstream call failed, unhealthy when
    /// nothing has ever been fetched successfully.
    pub async fn health_check(&self) -> ComponentHealth {
        let mut details = std::collections::HashMap::new();
        let metrics = self.metrics().await;

        let (cached_count, cache_age_secs, cache_fresh) = {
            let cache = self.cache.read().await;
            match cache.as_ref() {
                Some(batch) => {
                    let age = batch.fetched_at.elapsed();
                    (
                        Some(batch.records.len()),
                        Some(age.as_secs()),
                        age < self.config.revalidate,
                    )
                }
                None => (None, None, false),
            }
        };

        details.insert("source_name".to_string(), serde_json::json!(self.source_name()));
        details.insert("cached_assets".to_string(), serde_json::json!(cached_count));
        details.insert("cache_age_secs".to_string(), serde_json::json!(cache_age_secs));
        details.insert(
            "success_rate".to_string(),
            serde_json::json!(metrics.success_rate),
        );
        details.insert(
            "latency_p50_ms".to_string(),
            serde_json::json!(metrics.latency_p50_ms),
        );

        let status = match (cached_count, cache_fresh) {
            (None, _) => HealthStatus::Unhealthy,
            (Some(_), true) => HealthStatus::Healthy,
            (Some(_), false) => HealthStatus::Degraded,
        };

        let message = match status {
            HealthStatus::Healthy => "Fetch gateway is serving fresh data".to_string(),
            HealthStatus::Degraded => match metrics.last_success {
                Some(false) => "Last upstream fetch failed".to_string(),
                _ => "Cached data is past its revalidation window".to_string(),
            },
            HealthStatus::Unhealthy => "No market data has been fetched yet".to_string(),
        };

        ComponentHealth {
            name: "fetch_gateway".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: chrono::Utc::now(),
        }
    }
}

#[async_trait]
impl AssetFeed for FetchGateway {
    async fn fetch(&self) -> Result<AssetEnvelope, FetchError> {
        Ok(self.fetch_assets().await)
    }
}
