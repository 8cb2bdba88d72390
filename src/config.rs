//! Runtime knobs derived from the compile-time constants

use crate::constants::{
    COINGECKO_API_URL, DEFAULT_ASSET_IDS, MIN_REFRESH_BUSY_MS, POLL_INTERVAL_SECS,
    REVALIDATE_SECS, SEARCH_DEBOUNCE_MS,
};
use std::time::Duration;

/// What the query cache shows after a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleDataPolicy {
    /// Replace the batch with an empty set
    #[default]
    Discard,
    /// Keep the previous batch visible next to the error
    Retain,
}

/// Timings and policies for the client-side session
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
    pub search_debounce: Duration,
    pub min_refresh_busy: Duration,
    pub stale_data: StaleDataPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            search_debounce: Duration::from_millis(SEARCH_DEBOUNCE_MS),
            min_refresh_busy: Duration::from_millis(MIN_REFRESH_BUSY_MS),
            stale_data: StaleDataPolicy::default(),
        }
    }
}

/// Settings for the server-side fetch gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Asset identifiers requested upstream
    pub asset_ids: Vec<String>,
    /// How long a successful upstream result is reused
    pub revalidate: Duration,
    /// Base URL of the remote data source
    pub upstream_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            asset_ids: DEFAULT_ASSET_IDS.iter().map(|id| id.to_string()).collect(),
            revalidate: Duration::from_secs(REVALIDATE_SECS),
            upstream_url: COINGECKO_API_URL.to_string(),
        }
    }
}
