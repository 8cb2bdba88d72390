//! Constants for the crypto price tracker
//!
//! All configuration is centralized here. The gateway and the client
//! components read their defaults from these compile-time constants;
//! `TrackerConfig` and `GatewayConfig` only exist so tests can shorten
//! the timings.

/// How often the query cache re-fetches the asset list (in seconds)
pub const POLL_INTERVAL_SECS: u64 = 60;

/// How long a successful upstream result may be reused by the gateway (in seconds)
pub const REVALIDATE_SECS: u64 = 60;

/// Quiet period before a search input is committed (in milliseconds)
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Minimum time the refresh busy flag stays set (in milliseconds)
pub const MIN_REFRESH_BUSY_MS: u64 = 300;

/// HTTP request timeout for upstream and local fetches (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Asset identifiers requested from the remote data source
pub const DEFAULT_ASSET_IDS: &[&str] = &["bitcoin", "ethereum", "ripple", "cardano", "solana"];

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API endpoint for market listings
pub const COINGECKO_MARKETS_ENDPOINT: &str = "/coins/markets";

/// Path of the local gateway endpoint
pub const ASSETS_ENDPOINT: &str = "/api/cryptos";

/// URL query parameter holding the committed search term
pub const SEARCH_PARAM: &str = "search";

/// Message carried in the envelope when the upstream fetch fails
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch cryptocurrency data";

/// Default bind address of the gateway binary
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "crypto-price-tracker/0.1.0";
