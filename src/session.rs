//! Per-session wiring of the client-side components
//!
//! A `MarketSession` owns one query cache, search synchronizer, refresh
//! controller and filter projector. It is created when a view opens and
//! torn down with `close()` or by dropping it; nothing is shared between
//! sessions.

use crate::{
    client::AssetFeed,
    config::TrackerConfig,
    filter::FilterProjector,
    query::QueryCache,
    refresh::{RefreshController, RefreshOutcome},
    search::{SearchSnapshot, SearchSynchronizer},
    types::{AssetRecord, QueryState},
};
use reqwest::Url;
use std::sync::{Arc, Mutex};

/// What the presentation layer should render
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// A fetch or manual refresh is in progress
    Loading,
    /// The last fetch failed; offer `MarketSession::retry`
    Failed { message: String },
    /// Data is available but nothing matches the search term
    Empty,
    /// Records to display
    Ready(Arc<[AssetRecord]>),
}

/// Market session
pub struct MarketSession {
    cache: QueryCache,
    search: SearchSynchronizer,
    refresh: RefreshController,
    projector: Mutex<FilterProjector>,
}

impl MarketSession {
    /// Opens a session: mounts the query cache (initial fetch plus polling)
    /// and seeds the search term from `url`
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(feed: Arc<dyn AssetFeed>, url: Url, config: &TrackerConfig) -> Self {
        let cache = QueryCache::mount(feed, config);
        let search = SearchSynchronizer::new(url, config.search_debounce);
        let refresh = RefreshController::new(cache.clone(), config.min_refresh_busy);

        tracing::info!(
            search = %search.committed(),
            "Opened market session"
        );

        Self {
            cache,
            search,
            refresh,
            projector: Mutex::new(FilterProjector::new()),
        }
    }

    pub fn input_search(&self, raw: impl Into<String>) {
        self.search.input(raw);
    }

    pub fn clear_search(&self) {
        self.search.clear();
    }

    /// Manual refresh; a no-op while one is already running
    pub async fn refresh(&self) -> RefreshOutcome {
        self.refresh.trigger_refresh().await
    }

    /// Retry after a failure, attaching to any fetch already in flight
    pub async fn retry(&self) -> QueryState {
        self.cache.refetch().await
    }

    /// Combined loading signal for the input and refresh controls
    pub fn is_busy(&self) -> bool {
        self.refresh.is_busy()
    }

    pub fn query_state(&self) -> QueryState {
        self.cache.snapshot()
    }

    pub fn search_state(&self) -> SearchSnapshot {
        self.search.snapshot()
    }

    /// Shareable URL carrying the committed search term
    pub fn url(&self) -> Url {
        self.search.url()
    }

    /// Records matching the committed search term
    pub fn visible_assets(&self) -> Arc<[AssetRecord]> {
        let state = self.cache.snapshot();
        let term = self.search.committed();
        match self.projector.lock() {
            Ok(mut projector) => projector.project(&state, &term),
            Err(poisoned) => poisoned.into_inner().project(&state, &term),
        }
    }

    /// Derives the render state
    ///
    /// Loading wins over an error, and an error wins over an empty list.
    pub fn view(&self) -> ViewState {
        if self.is_busy() {
            return ViewState::Loading;
        }

        if let Some(message) = self.cache.snapshot().error {
            return ViewState::Failed { message };
        }

        let visible = self.visible_assets();
        if visible.is_empty() {
            ViewState::Empty
        } else {
            ViewState::Ready(visible)
        }
    }

    /// Cancels polling and the debounce timer
    pub fn close(&self) {
        self.cache.shutdown();
        self.search.close();
        tracing::info!("Closed market session");
    }
}

impl Drop for MarketSession {
    fn drop(&mut self) {
        self.cache.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockFeed;
    use crate::error::FetchError;
    use crate::types::fixtures::{bitcoin, ethereum};
    use std::time::Duration;

    fn open(feed: Arc<MockFeed>, url: &str) -> MarketSession {
        MarketSession::open(feed, url.parse().unwrap(), &TrackerConfig::default())
    }

    fn feed() -> Arc<MockFeed> {
        Arc::new(MockFeed::new(
            vec![bitcoin(), ethereum()],
            Duration::from_millis(50),
        ))
    }

    async fn pause(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_then_ready() {
        let session = open(feed(), "http://localhost:3000/");
        pause(10).await;
        assert_eq!(session.view(), ViewState::Loading);

        pause(100).await;
        match session.view() {
            ViewState::Ready(records) => assert_eq!(records.len(), 2),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_from_url_filters_initial_view() {
        let session = open(feed(), "http://localhost:3000/?search=eth");
        pause(100).await;
        assert_eq!(&*session.visible_assets(), &[ethereum()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_search_updates_view_and_url() {
        let session = open(feed(), "http://localhost:3000/");
        pause(100).await;

        session.input_search("Bit");
        pause(100).await;
        assert_eq!(session.visible_assets().len(), 2);

        pause(300).await;
        assert_eq!(&*session.visible_assets(), &[bitcoin()]);
        assert_eq!(session.url().as_str(), "http://localhost:3000/?search=Bit");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_match_is_empty_state() {
        let session = open(feed(), "http://localhost:3000/?search=doge");
        pause(100).await;
        assert_eq!(session.view(), ViewState::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_then_retry() {
        let feed = feed();
        feed.push(Err(FetchError::Status(500)));
        let session = open(feed.clone(), "http://localhost:3000/");
        pause(100).await;

        assert!(matches!(session.view(), ViewState::Failed { .. }));
        let state = session.retry().await;
        assert_eq!(state.error, None);
        assert!(matches!(session.view(), ViewState::Ready(_)));
        assert_eq!(feed.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_shows_loading_for_minimum_duration() {
        let session = open(feed(), "http://localhost:3000/");
        pause(100).await;

        let session = Arc::new(session);
        let pending = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.refresh().await }
        });
        pause(200).await;
        assert_eq!(session.view(), ViewState::Loading);

        assert_eq!(pending.await.unwrap(), RefreshOutcome::Completed);
        assert!(matches!(session.view(), ViewState::Ready(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_stops_polling() {
        let feed = feed();
        let session = open(feed.clone(), "http://localhost:3000/");
        pause(100).await;
        session.close();

        pause(180_000).await;
        assert_eq!(feed.call_count(), 1);
    }
}
