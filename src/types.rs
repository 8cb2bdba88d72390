//! Types for the crypto price tracker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Market data for a single asset, as listed by the remote data source
///
/// Field names match the CoinGecko `/coins/markets` payload and the local
/// endpoint's wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Identifier, unique within a fetch batch (e.g. "bitcoin")
    pub id: String,

    /// Display name (e.g. "Bitcoin")
    pub name: String,

    /// Ticker symbol (e.g. "btc")
    pub symbol: String,

    /// Icon URL
    pub image: String,

    /// Price in USD
    pub current_price: f64,

    /// 24h price change percentage
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,

    /// Market capitalization in USD
    pub market_cap: f64,

    /// 24h trading volume in USD
    pub total_volume: f64,
}

impl AssetRecord {
    /// Returns true if the name or symbol contains `needle`
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.symbol.to_lowercase().contains(needle)
    }
}

/// Body of the local assets endpoint
///
/// Failures are carried in `error` with an empty `data` list; the HTTP
/// status is 200 either way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetEnvelope {
    pub data: Vec<AssetRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssetEnvelope {
    /// Creates a successful envelope
    pub fn ok(data: Vec<AssetRecord>) -> Self {
        Self { data, error: None }
    }

    /// Creates a failure envelope with no data
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            data: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Snapshot of the client-side query cache
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    /// Latest batch; `None` until the first fetch resolves
    pub data: Option<Arc<[AssetRecord]>>,

    /// Message of the last failed fetch
    pub error: Option<String>,

    /// True only while a fetch is in flight
    pub is_loading: bool,

    /// When the last fetch resolved
    pub fetched_at: Option<DateTime<Utc>>,

    /// Bumped on every resolved fetch, successful or not
    pub version: u64,
}

impl QueryState {
    /// Returns the current batch, or an empty slice before the first fetch
    pub fn records(&self) -> &[AssetRecord] {
        self.data.as_deref().unwrap_or(&[])
    }
}

/// Overall component health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Component is healthy and serving fresh data
    Healthy,
    /// Component is degraded but still functional
    Degraded,
    /// Component is unhealthy and requires attention
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::AssetRecord;

    pub fn record(id: &str, name: &str, symbol: &str, price: f64) -> AssetRecord {
        AssetRecord {
            id: id.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            image: format!("https://assets.example/{id}.png"),
            current_price: price,
            price_change_percentage_24h: Some(1.5),
            market_cap: price * 1_000_000.0,
            total_volume: price * 10_000.0,
        }
    }

    pub fn bitcoin() -> AssetRecord {
        record("bitcoin", "Bitcoin", "btc", 67_000.0)
    }

    pub fn ethereum() -> AssetRecord {
        record("ethereum", "Ethereum", "eth", 3_200.0)
    }

    pub fn solana() -> AssetRecord {
        record("solana", "Solana", "sol", 150.0)
    }
}
