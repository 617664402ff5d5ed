//! Best-effort list of recent evaluations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::domain::HistoryItem;
use tracing::{debug, warn};

use crate::api::EvaluationApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// First load of a screen; drives the blocking spinner.
    Initial,
    /// User-initiated reload; drives the pull-to-refresh indicator.
    PullToRefresh,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub items: Vec<HistoryItem>,
    pub loading: bool,
    pub refreshing: bool,
    pub loaded_once: bool,
    /// Last fetch failure, informational only. Items are kept on failure.
    pub last_error: Option<String>,
}

/// Owns the history list. Cheap to clone; clones share the same list.
#[derive(Clone)]
pub struct HistoryController {
    api: Arc<dyn EvaluationApi>,
    state: Arc<Mutex<HistorySnapshot>>,
}

/// Holds the loading/refreshing flag for the duration of one fetch.
struct LoadFlag {
    state: Arc<Mutex<HistorySnapshot>>,
}

impl LoadFlag {
    fn raise(state: &Arc<Mutex<HistorySnapshot>>, kind: LoadKind) -> Self {
        {
            let mut guard = lock(state);
            guard.loading = kind == LoadKind::Initial;
            guard.refreshing = kind == LoadKind::PullToRefresh;
            guard.last_error = None;
        }
        Self {
            state: Arc::clone(state),
        }
    }
}

impl Drop for LoadFlag {
    fn drop(&mut self) {
        let mut guard = lock(&self.state);
        guard.loading = false;
        guard.refreshing = false;
    }
}

fn lock(state: &Mutex<HistorySnapshot>) -> MutexGuard<'_, HistorySnapshot> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl HistoryController {
    pub fn new(api: Arc<dyn EvaluationApi>) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(HistorySnapshot::default())),
        }
    }

    pub async fn refresh(&self, limit: usize) {
        self.load(limit, LoadKind::Initial).await;
    }

    pub async fn pull_to_refresh(&self, limit: usize) {
        self.load(limit, LoadKind::PullToRefresh).await;
    }

    /// Replaces the list on success and leaves it untouched on failure.
    /// Returns whether the fetch succeeded.
    pub async fn load(&self, limit: usize, kind: LoadKind) -> bool {
        let _flag = LoadFlag::raise(&self.state, kind);

        match self.api.list_history(limit).await {
            Ok(items) => {
                debug!(limit, count = items.len(), ?kind, "history loaded");
                let mut guard = lock(&self.state);
                guard.items = items;
                guard.loaded_once = true;
                true
            }
            Err(err) => {
                warn!(limit, ?kind, error = %err, "failed to load history");
                let mut guard = lock(&self.state);
                guard.last_error = Some(err.user_message());
                guard.loaded_once = true;
                false
            }
        }
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        lock(&self.state).clone()
    }

    pub fn items(&self) -> Vec<HistoryItem> {
        lock(&self.state).items.clone()
    }

    pub fn is_busy(&self) -> bool {
        let guard = lock(&self.state);
        guard.loading || guard.refreshing
    }
}

#[cfg(test)]
#[path = "tests/history_tests.rs"]
mod tests;
