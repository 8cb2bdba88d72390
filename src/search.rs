//! Debounced search term synchronized with the view URL
//!
//! Keystrokes update the raw value immediately. A background task owns the
//! debounce timer: every change cancels and re-arms it, and only a value
//! that survives a full quiet period is committed and written to the URL's
//! `search` parameter.

use crate::constants::SEARCH_PARAM;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Where the synchronizer is in its input cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// Nothing entered, committed term is empty
    Idle,
    /// Raw value changed, not yet seen by the debounce task
    Typing,
    /// Debounce timer armed for the latest raw value
    Debouncing,
    /// Latest value committed to the URL
    Committed,
}

/// Observable search state
#[derive(Debug, Clone)]
pub struct SearchSnapshot {
    /// Value echoed in the input field
    pub raw: String,
    /// Value authoritative for filtering and the URL
    pub committed: String,
    pub phase: SearchPhase,
    /// Shareable view URL carrying the committed term
    pub url: Url,
    /// Number of commits so far, clears included
    pub commits: u64,
}

enum Command {
    Input(String),
    Clear,
}

/// Search synchronizer
///
/// # Example
/// ```no_run
/// use crypto_price_tracker::SearchSynchronizer;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let url = "http://localhost:3000/".parse()?;
/// let search = SearchSynchronizer::new(url, Duration::from_millis(300));
/// search.input("eth");
/// tokio::time::sleep(Duration::from_millis(350)).await;
/// assert_eq!(search.url().as_str(), "http://localhost:3000/?search=eth");
/// # Ok(())
/// # }
/// ```
pub struct SearchSynchronizer {
    state: Arc<watch::Sender<SearchSnapshot>>,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl SearchSynchronizer {
    /// Creates a synchronizer seeded from the URL's `search` parameter
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(url: Url, debounce: Duration) -> Self {
        let initial = search_param(&url).unwrap_or_default();
        let phase = if initial.is_empty() {
            SearchPhase::Idle
        } else {
            SearchPhase::Committed
        };

        let (state, _) = watch::channel(SearchSnapshot {
            raw: initial.clone(),
            committed: initial,
            phase,
            url,
            commits: 0,
        });
        let state = Arc::new(state);
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(debounce_loop(Arc::clone(&state), rx, debounce));

        Self {
            state,
            commands,
            task,
        }
    }

    /// Records a keystroke
    pub fn input(&self, raw: impl Into<String>) {
        let raw = raw.into();
        self.state.send_modify(|s| {
            s.raw = raw.clone();
            s.phase = SearchPhase::Typing;
        });
        if self.commands.send(Command::Input(raw)).is_err() {
            tracing::warn!("Search debounce task is gone, input dropped");
        }
    }

    /// Clears the input and commits the empty term without waiting
    pub fn clear(&self) {
        self.state.send_modify(|s| {
            s.raw.clear();
            s.committed.clear();
            s.phase = SearchPhase::Idle;
            set_search_param(&mut s.url, "");
            s.commits += 1;
        });
        if self.commands.send(Command::Clear).is_err() {
            tracing::warn!("Search debounce task is gone, clear not forwarded");
        }
    }

    /// Returns a copy of the current search state
    pub fn snapshot(&self) -> SearchSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribes to search state changes
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.state.subscribe()
    }

    /// Value currently shown in the input field
    pub fn raw(&self) -> String {
        self.state.borrow().raw.clone()
    }

    /// Debounced term used for filtering
    pub fn committed(&self) -> String {
        self.state.borrow().committed.clone()
    }

    /// Current state machine phase
    pub fn phase(&self) -> SearchPhase {
        self.state.borrow().phase
    }

    /// Shareable view URL carrying the committed term
    pub fn url(&self) -> Url {
        self.state.borrow().url.clone()
    }

    /// Cancels the pending debounce timer, if any
    pub fn close(&self) {
        self.task.abort();
    }
}

impl Drop for SearchSynchronizer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn debounce_loop(
    state: Arc<watch::Sender<SearchSnapshot>>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    debounce: Duration,
) {
    let mut pending: Option<String> = None;

    loop {
        let command = match pending.take() {
            None => match commands.recv().await {
                Some(command) => command,
                None => break,
            },
            Some(value) => {
                tokio::select! {
                    biased;
                    next = commands.recv() => match next {
                        Some(command) => command,
                        None => break,
                    },
                    _ = tokio::time::sleep(debounce) => {
                        commit(&state, value);
                        continue;
                    }
                }
            }
        };

        match command {
            Command::Input(value) => {
                state.send_if_modified(|s| {
                    // A clear may have overtaken this input.
                    if s.raw != value {
                        return false;
                    }
                    s.phase = SearchPhase::Debouncing;
                    true
                });
                pending = Some(value);
            }
            Command::Clear => pending = None,
        }
    }
}

/// Commits `value` unless the raw input has moved on since the timer fired
fn commit(state: &watch::Sender<SearchSnapshot>, value: String) -> bool {
    let committed = state.send_if_modified(|s| {
        // A clear or newer keystroke landed between expiry and this write.
        if s.raw != value {
            return false;
        }
        set_search_param(&mut s.url, &value);
        s.phase = if value.is_empty() {
            SearchPhase::Idle
        } else {
            SearchPhase::Committed
        };
        s.committed = value.clone();
        s.commits += 1;
        true
    });

    if committed {
        tracing::debug!(term = %value, "Committed search term");
    } else {
        tracing::debug!(term = %value, "Dropped superseded search term");
    }
    committed
}

/// Reads the `search` query parameter
pub fn search_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == SEARCH_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// Sets the `search` query parameter, or removes it for an empty term
///
/// Other parameters keep their order.
pub fn set_search_param(url: &mut Url, term: &str) {
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != SEARCH_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if retained.is_empty() && term.is_empty() {
        url.set_query(None);
        return;
    }

    let mut pairs = url.query_pairs_mut();
    pairs.clear();
    for (key, value) in &retained {
        pairs.append_pair(key, value);
    }
    if !term.is_empty() {
        pairs.append_pair(SEARCH_PARAM, term);
    }
}
