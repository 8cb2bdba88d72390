//! CoinGecko market listing source

use crate::{
    constants::{COINGECKO_API_URL, COINGECKO_MARKETS_ENDPOINT, REQUEST_TIMEOUT_SECS, USER_AGENT},
    error::ProviderError,
    provider::MarketDataSource,
    types::AssetRecord,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// CoinGecko `/coins/markets` source
pub struct CoinGeckoSource {
    client: Client,
    base_url: String,
}

impl CoinGeckoSource {
    /// Creates a new CoinGecko source against the public API
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(COINGECKO_API_URL)
    }

    /// Creates a CoinGecko source against a custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::NetworkError)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Builds the CoinGecko API URL for the market listing
    fn build_url(&self, ids: &[String]) -> String {
        format!(
            "{}{}?vs_currency=usd&ids={}&order=market_cap_desc&per_page=100&page=1&sparkline=false",
            self.base_url,
            COINGECKO_MARKETS_ENDPOINT,
            ids.join(",")
        )
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoSource {
    async fn fetch_markets(&self, ids: &[String]) -> Result<Vec<AssetRecord>, ProviderError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.build_url(ids);
        tracing::debug!(%url, "Fetching markets from CoinGecko");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ProviderError::NetworkError)?;

        if response.status().as_u16() == 429 {
            return Err(ProviderError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let response_text = response.text().await.map_err(ProviderError::NetworkError)?;

        let records: Vec<AssetRecord> = serde_json::from_str(&response_text).map_err(|e| {
            ProviderError::InvalidResponse(format!(
                "Failed to parse CoinGecko response: {}. Response: {}",
                e, response_text
            ))
        })?;

        tracing::debug!(count = records.len(), "Fetched markets from CoinGecko");

        Ok(records)
    }

    fn source_name(&self) -> &'static str {
        "coingecko"
    }
}
