//! Manual refresh coordination
//!
//! A refresh sets the busy flag, re-fetches through the query cache and
//! keeps the flag set for at least the minimum busy duration, so a fast
//! round trip still produces visible feedback. Invocations while busy are
//! dropped.

use crate::query::QueryCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Result of a refresh request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The refresh ran to completion
    Completed,
    /// A refresh was already running; nothing was done
    Skipped,
}

/// Refresh controller
#[derive(Clone)]
pub struct RefreshController {
    cache: QueryCache,
    busy: Arc<watch::Sender<bool>>,
    min_busy: Duration,
}

/// Clears the busy flag when the refresh ends or its future is dropped
struct BusyGuard {
    busy: Arc<watch::Sender<bool>>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.send_replace(false);
    }
}

impl RefreshController {
    /// Creates a controller refreshing `cache` with a `min_busy` floor
    pub fn new(cache: QueryCache, min_busy: Duration) -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            cache,
            busy: Arc::new(busy),
            min_busy,
        }
    }

    /// Refreshes the query cache unless a refresh is already running
    pub async fn trigger_refresh(&self) -> RefreshOutcome {
        let acquired = self.busy.send_if_modified(|busy| {
            if *busy {
                return false;
            }
            *busy = true;
            true
        });
        if !acquired {
            tracing::debug!("Refresh already in progress, ignoring request");
            return RefreshOutcome::Skipped;
        }

        let _guard = BusyGuard {
            busy: Arc::clone(&self.busy),
        };
        let started = Instant::now();

        let state = self.cache.refetch().await;
        if let Some(error) = &state.error {
            tracing::warn!(%error, "Manual refresh failed");
        }

        tokio::time::sleep_until(started + self.min_busy).await;
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Manual refresh finished"
        );
        RefreshOutcome::Completed
    }

    /// True while a manual refresh holds the busy flag
    pub fn is_refreshing(&self) -> bool {
        *self.busy.borrow()
    }

    /// Combined busy signal: refreshing or any fetch in flight
    pub fn is_busy(&self) -> bool {
        self.is_refreshing() || self.cache.is_loading()
    }

    /// Subscribes to the refresh flag
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }
}
