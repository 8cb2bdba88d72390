//! Client-side query cache
//!
//! Holds the last fetched batch together with its loading and error state,
//! polls the asset feed on a fixed interval, and de-duplicates overlapping
//! fetches: while one fetch is in flight, every `refetch()` attaches to it.

use crate::{
    client::AssetFeed,
    config::{StaleDataPolicy, TrackerConfig},
    error::FetchError,
    types::{AssetEnvelope, AssetRecord, QueryState},
};
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

type InFlight = Shared<BoxFuture<'static, QueryState>>;

struct Inner {
    feed: Arc<dyn AssetFeed>,
    stale_data: StaleDataPolicy,
    state: watch::Sender<QueryState>,
    in_flight: Mutex<Option<InFlight>>,
    poller: std::sync::Mutex<Option<JoinHandle<()>>>,
}

/// Query cache
///
/// Cheap to clone; all clones share one state. The poll task only holds a
/// weak reference, so dropping the last clone stops polling.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use crypto_price_tracker::{HttpAssetFeed, QueryCache, TrackerConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let feed = Arc::new(HttpAssetFeed::new("http://127.0.0.1:3000")?);
/// let cache = QueryCache::mount(feed, &TrackerConfig::default());
/// let state = cache.refetch().await;
/// println!("{} assets, error: {:?}", state.records().len(), state.error);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    /// Creates a cache without starting the poll schedule
    pub fn new(feed: Arc<dyn AssetFeed>, stale_data: StaleDataPolicy) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            inner: Arc::new(Inner {
                feed,
                stale_data,
                state,
                in_flight: Mutex::new(None),
                poller: std::sync::Mutex::new(None),
            }),
        }
    }

    /// Creates a cache, issues the initial fetch and starts polling
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(feed: Arc<dyn AssetFeed>, config: &TrackerConfig) -> Self {
        let cache = Self::new(feed, config.stale_data);
        cache.start_polling(config.poll_interval);
        cache
    }

    /// Starts the background poll task
    ///
    /// The first tick fires immediately, giving the initial fetch. Ticks go
    /// through `refetch()`, so a poll landing on a manual refresh attaches
    /// to it instead of issuing a second request.
    pub fn start_polling(&self, interval: Duration) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            tracing::info!(
                poll_interval_secs = interval.as_secs(),
                "Starting query cache poll task"
            );

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let state = QueryCache { inner }.refetch().await;
                if let Some(error) = state.error {
                    tracing::warn!(%error, "Scheduled fetch failed");
                }
            }
        });

        let previous = match self.inner.poller.lock() {
            Ok(mut slot) => slot.replace(handle),
            Err(poisoned) => poisoned.into_inner().replace(handle),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Stops the poll task
    ///
    /// An in-flight fetch still completes and updates the state.
    pub fn shutdown(&self) {
        self.inner.stop_polling();
    }

    /// Returns a copy of the current state
    pub fn snapshot(&self) -> QueryState {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state changes
    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.inner.state.subscribe()
    }

    /// True while a fetch is in flight
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    /// Fetches fresh data, or attaches to the fetch already in flight
    ///
    /// Resolves to the state produced by that fetch. The fetch runs on its
    /// own task and completes even if every caller stops waiting.
    pub async fn refetch(&self) -> QueryState {
        let pending = {
            let mut slot = self.inner.in_flight.lock().await;
            match slot.as_ref() {
                Some(pending) => {
                    tracing::debug!("Attaching to in-flight fetch");
                    pending.clone()
                }
                None => {
                    self.inner.state.send_modify(|state| state.is_loading = true);

                    let inner = Arc::clone(&self.inner);
                    let task = tokio::spawn(async move { inner.run_fetch().await });
                    let weak = Arc::downgrade(&self.inner);
                    let pending = async move {
                        match task.await {
                            Ok(state) => state,
                            Err(e) => {
                                let error = FetchError::Aborted(e.to_string());
                                match weak.upgrade() {
                                    Some(inner) => inner.settle(Err(error)).await,
                                    None => resolve(
                                        &QueryState::default(),
                                        Err(error),
                                        StaleDataPolicy::Discard,
                                    ),
                                }
                            }
                        }
                    }
                    .boxed()
                    .shared();

                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }
}

impl Inner {
    async fn run_fetch(&self) -> QueryState {
        let result = self.feed.fetch().await;
        self.settle(result).await
    }

    /// Publishes the outcome of the in-flight fetch and frees the slot
    async fn settle(&self, result: Result<AssetEnvelope, FetchError>) -> QueryState {
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Asset fetch failed");
        }

        let mut resolved = QueryState::default();
        self.state.send_modify(|state| {
            *state = resolve(state, result, self.stale_data);
            resolved = state.clone();
        });

        *self.in_flight.lock().await = None;
        tracing::debug!(
            version = resolved.version,
            count = resolved.records().len(),
            "Query state updated"
        );
        resolved
    }

    fn stop_polling(&self) {
        let handle = match self.poller.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

/// Folds a fetch outcome into the previous state
fn resolve(
    previous: &QueryState,
    result: Result<AssetEnvelope, FetchError>,
    stale_data: StaleDataPolicy,
) -> QueryState {
    let (data, error) = match result {
        Ok(AssetEnvelope { data, error: None }) => (data.into(), None),
        Ok(AssetEnvelope {
            data,
            error: Some(message),
        }) => (fallback_data(previous, data, stale_data), Some(message)),
        Err(e) => (
            fallback_data(previous, Vec::new(), stale_data),
            Some(e.to_string()),
        ),
    };

    QueryState {
        data: Some(data),
        error,
        is_loading: false,
        fetched_at: Some(Utc::now()),
        version: previous.version + 1,
    }
}

fn fallback_data(
    previous: &QueryState,
    failed: Vec<AssetRecord>,
    stale_data: StaleDataPolicy,
) -> Arc<[AssetRecord]> {
    match (stale_data, &previous.data) {
        (StaleDataPolicy::Retain, Some(data)) => Arc::clone(data),
        _ => failed.into(),
    }
}
