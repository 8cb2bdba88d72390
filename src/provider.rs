//! Remote data source abstraction for fetching market listings

use crate::{error::ProviderError, types::AssetRecord};
use async_trait::async_trait;

/// Trait for remote market data sources
///
/// Implementations fetch the market listing for a set of asset identifiers
/// from an external API (CoinGecko, CoinMarketCap, etc.)
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetches market records for the given asset identifiers
    ///
    /// # Arguments
    /// * `ids` - Source-specific asset identifiers (e.g. "bitcoin")
    ///
    /// # Returns
    /// The records in the order the source returned them, or an error if
    /// the request failed or the response could not be parsed
    async fn fetch_markets(&self, ids: &[String]) -> Result<Vec<AssetRecord>, ProviderError>;

    /// Returns the name of this source
    fn source_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock source for testing
    #[derive(Default)]
    pub struct MockSource {
        records: Mutex<Vec<AssetRecord>>,
        fail_with: Mutex<Option<String>>,
        call_count: AtomicUsize,
    }

    impl MockSource {
        pub fn with_records(records: Vec<AssetRecord>) -> Self {
            let source = Self::default();
            source.set_records(records);
            source
        }

        pub fn set_records(&self, records: Vec<AssetRecord>) {
            *self.records.lock().unwrap() = records;
        }

        /// Makes every following call fail with an API error
        pub fn set_error(&self, message: &str) {
            *self.fail_with.lock().unwrap() = Some(message.to_string());
        }

        pub fn clear_error(&self) {
            *self.fail_with.lock().unwrap() = None;
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataSource for MockSource {
        async fn fetch_markets(&self, ids: &[String]) -> Result<Vec<AssetRecord>, ProviderError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = self.fail_with.lock().unwrap().clone() {
                return Err(ProviderError::ApiError(message));
            }
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .filter(|r| ids.is_empty() || ids.contains(&r.id))
                .cloned()
                .collect())
        }

        fn source_name(&self) -> &'static str {
            "mock"
        }
    }
}
