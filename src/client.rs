//! Client-side access to the local assets endpoint

use crate::{
    constants::{ASSETS_ENDPOINT, REQUEST_TIMEOUT_SECS, USER_AGENT},
    error::FetchError,
    types::AssetEnvelope,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Source of asset envelopes for the query cache
///
/// `Err` means the endpoint itself could not be used; an upstream failure
/// arrives as `Ok` with the envelope's `error` set.
#[async_trait]
pub trait AssetFeed: Send + Sync {
    async fn fetch(&self) -> Result<AssetEnvelope, FetchError>;
}

/// Fetches envelopes from a running gateway over HTTP
pub struct HttpAssetFeed {
    client: Client,
    url: String,
}

impl HttpAssetFeed {
    /// Creates a feed for the gateway at `base_url` (e.g. "http://127.0.0.1:3000")
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::network(e.to_string()))?;

        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), ASSETS_ENDPOINT),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AssetFeed for HttpAssetFeed {
    async fn fetch(&self) -> Result<AssetEnvelope, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let envelope = response.json::<AssetEnvelope>().await?;
        Ok(envelope)
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::types::AssetRecord;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock feed for testing
    ///
    /// Returns scripted results in order, then repeats the fallback. Each
    /// call sleeps for `latency` first so overlap can be exercised under
    /// paused time.
    pub struct MockFeed {
        scripted: Mutex<VecDeque<Result<AssetEnvelope, FetchError>>>,
        fallback: Mutex<Result<AssetEnvelope, FetchError>>,
        latency: Duration,
        call_count: AtomicUsize,
    }

    impl MockFeed {
        pub fn new(records: Vec<AssetRecord>, latency: Duration) -> Self {
            Self {
                scripted: Mutex::new(VecDeque::new()),
                fallback: Mutex::new(Ok(AssetEnvelope::ok(records))),
                latency,
                call_count: AtomicUsize::new(0),
            }
        }

        /// Queues a one-off result ahead of the fallback
        pub fn push(&self, result: Result<AssetEnvelope, FetchError>) {
            self.scripted.lock().unwrap().push_back(result);
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AssetFeed for MockFeed {
        async fn fetch(&self) -> Result<AssetEnvelope, FetchError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            let next = self.scripted.lock().unwrap().pop_front();
            next.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FETCH_FAILED_MESSAGE;
    use crate::gateway::FetchGateway;
    use crate::provider::mock::MockSource;
    use crate::providers::CoinGeckoSource;
    use crate::server;
    use crate::types::fixtures::{bitcoin, ethereum};
    use std::sync::Arc;
    use warp::http::StatusCode;
    use warp::Filter;

    /// Serves a misbehaving assets endpoint under one prefix per behaviour
    fn stub_endpoint() -> String {
        let broken = warp::path!("broken" / "api" / "cryptos")
            .map(|| warp::reply::with_status("oops", StatusCode::INTERNAL_SERVER_ERROR));
        let garbled = warp::path!("garbled" / "api" / "cryptos").map(|| "<html>not json</html>");

        let (addr, server) =
            warp::serve(broken.or(garbled)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{}", addr)
    }

    fn serve_gateway(gateway: FetchGateway) -> String {
        let (addr, server) =
            warp::serve(server::routes(Arc::new(gateway))).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{}", addr)
    }

    #[test]
    fn test_url_targets_assets_endpoint() {
        let feed = HttpAssetFeed::new("http://127.0.0.1:3000/").unwrap();
        assert_eq!(feed.url(), "http://127.0.0.1:3000/api/cryptos");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let feed = HttpAssetFeed::new("http://127.0.0.1:1").unwrap();
        assert!(matches!(feed.fetch().await, Err(FetchError::Network(_))));
    }

    #[tokio::test]
    async fn test_non_success_status_is_status_error() {
        let base = stub_endpoint();
        let feed = HttpAssetFeed::new(&format!("{}/broken", base)).unwrap();
        assert_eq!(feed.fetch().await, Err(FetchError::Status(500)));
    }

    #[tokio::test]
    async fn test_invalid_body_is_decode_error() {
        let base = stub_endpoint();
        let feed = HttpAssetFeed::new(&format!("{}/garbled", base)).unwrap();
        assert!(matches!(feed.fetch().await, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_fetches_envelope_from_served_gateway() {
        let source = Arc::new(MockSource::with_records(vec![bitcoin(), ethereum()]));
        let base = serve_gateway(FetchGateway::new(source));
        let feed = HttpAssetFeed::new(&base).unwrap();

        let envelope = feed.fetch().await.unwrap();
        assert_eq!(envelope.data, vec![bitcoin(), ethereum()]);
        assert!(!envelope.is_error());
    }

    #[tokio::test]
    async fn test_upstream_failure_arrives_as_error_envelope() {
        let upstream = warp::path!("coins" / "markets")
            .map(|| warp::reply::with_status("", StatusCode::INTERNAL_SERVER_ERROR));
        let (upstream_addr, upstream_server) =
            warp::serve(upstream).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(upstream_server);

        let source =
            Arc::new(CoinGeckoSource::with_base_url(format!("http://{}", upstream_addr)).unwrap());
        let base = serve_gateway(FetchGateway::new(source));
        let feed = HttpAssetFeed::new(&base).unwrap();

        let envelope = feed.fetch().await.unwrap();
        assert!(envelope.data.is_empty());
        assert_eq!(envelope.error.as_deref(), Some(FETCH_FAILED_MESSAGE));
    }
}
