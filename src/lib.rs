//! # Crypto Price Tracker
//!
//! Near-real-time market data for a fixed set of cryptocurrencies, pulled
//! from CoinGecko through a local gateway endpoint and kept fresh on the
//! client by a polling query cache.
//!
//! ## Architecture
//!
//! ```text
//! CoinGecko /coins/markets
//!     ↓
//! FetchGateway (60s revalidation, errors become envelopes)
//!     ↓
//! GET /api/cryptos (warp, always 200)
//!     ↓
//! QueryCache (polls every 60s, one fetch in flight at a time)
//!     ↓
//! FilterProjector ← SearchSynchronizer (300ms debounce, ?search= in URL)
//!     ↓
//! ViewState (Loading / Failed / Empty / Ready)
//! ```
//!
//! `RefreshController` sits beside the cache: manual refreshes go through
//! `QueryCache::refetch`, are ignored while one is running, and keep the
//! busy flag up for at least 300ms.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use crypto_price_tracker::{HttpAssetFeed, MarketSession, TrackerConfig, ViewState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let feed = Arc::new(HttpAssetFeed::new("http://127.0.0.1:3000")?);
//! let session = MarketSession::open(
//!     feed,
//!     "http://127.0.0.1:3000/?search=eth".parse()?,
//!     &TrackerConfig::default(),
//! );
//!
//! session.input_search("bit");
//! session.refresh().await;
//!
//! match session.view() {
//!     ViewState::Loading => println!("Refreshing..."),
//!     ViewState::Failed { message } => println!("{} (try again)", message),
//!     ViewState::Empty => println!("No cryptocurrencies found."),
//!     ViewState::Ready(assets) => {
//!         for asset in assets.iter() {
//!             println!("{}: ${:.2}", asset.symbol.to_uppercase(), asset.current_price);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! All settings are compile-time constants in the `constants` module;
//! `TrackerConfig` and `GatewayConfig` default to them.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod metrics;
pub mod provider;
pub mod providers;
pub mod query;
pub mod refresh;
pub mod search;
pub mod server;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use client::{AssetFeed, HttpAssetFeed};
pub use config::{GatewayConfig, StaleDataPolicy, TrackerConfig};
pub use error::{FetchError, ProviderError};
pub use filter::{filter_assets, FilterProjector};
pub use gateway::FetchGateway;
pub use metrics::UpstreamMetrics;
pub use provider::MarketDataSource;
pub use query::QueryCache;
pub use refresh::{RefreshController, RefreshOutcome};
pub use search::{SearchPhase, SearchSnapshot, SearchSynchronizer};
pub use session::{MarketSession, ViewState};
pub use types::{AssetEnvelope, AssetRecord, ComponentHealth, HealthStatus, QueryState};
