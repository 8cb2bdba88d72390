//! Search filtering over the cached batch

use crate::types::{AssetRecord, QueryState};
use std::sync::Arc;

/// Returns the records whose name or symbol contains `term`, ignoring case
///
/// An empty term keeps every record. Relative order is preserved.
pub fn filter_assets(records: &[AssetRecord], term: &str) -> Vec<AssetRecord> {
    if term.is_empty() {
        return records.to_vec();
    }

    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|record| record.matches(&needle))
        .cloned()
        .collect()
}

/// Memoized projection of the visible records
///
/// Recomputes only when the batch (by identity) or the term changes. An
/// empty term hands back the cached batch itself.
pub struct FilterProjector {
    empty: Arc<[AssetRecord]>,
    last: Option<Projection>,
}

struct Projection {
    batch: Arc<[AssetRecord]>,
    term: String,
    visible: Arc<[AssetRecord]>,
}

impl Default for FilterProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterProjector {
    pub fn new() -> Self {
        Self {
            empty: Arc::from(Vec::new()),
            last: None,
        }
    }

    /// Projects the state's batch through `term`
    ///
    /// Returns a shared empty sequence while no batch is available.
    pub fn project(&mut self, state: &QueryState, term: &str) -> Arc<[AssetRecord]> {
        let Some(batch) = state.data.as_ref() else {
            return Arc::clone(&self.empty);
        };

        if let Some(last) = &self.last {
            if Arc::ptr_eq(&last.batch, batch) && last.term == term {
                return Arc::clone(&last.visible);
            }
        }

        let visible: Arc<[AssetRecord]> = if term.is_empty() {
            Arc::clone(batch)
        } else {
            filter_assets(batch, term).into()
        };

        tracing::trace!(
            term,
            total = batch.len(),
            visible = visible.len(),
            "Recomputed visible assets"
        );

        self.last = Some(Projection {
            batch: Arc::clone(batch),
            term: term.to_string(),
            visible: Arc::clone(&visible),
        });
        visible
    }
}
