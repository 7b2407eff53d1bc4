//! Incremental history pagination with deduplication.
//!
//! The pager keeps an ordered, deduplicated cache of prediction records
//! fetched page by page from a listing endpoint. The server's reported
//! `total_count` and `has_more` are authoritative and overwritten on every
//! successful fetch; the local record count is only compared against
//! `total_count` to decide that everything is already loaded.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::types::PredictionRecord;
use crate::api::ApiError;

pub const DEFAULT_PAGE_SIZE: usize = 6;

/// One fetched page of the listing.
#[derive(Clone, Debug)]
pub struct HistoryPage {
    pub records: Vec<PredictionRecord>,
    pub total_count: usize,
    pub has_more: bool,
}

/// The fetch contract the pager consumes: skip/limit pagination over a
/// listing ordered by the server.
pub trait HistorySource {
    fn list_recent(
        &self,
        skip: usize,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<HistoryPage, ApiError>>;
}

/// How the renderer should apply a batch of records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Discard the visible list and render `records` fresh.
    Replace,
    /// Add `records` to the end of the visible list.
    Append,
}

/// A batch of records for the renderer, with the mode to apply them in.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub records: Vec<PredictionRecord>,
    pub mode: RenderMode,
}

impl ViewState {
    pub fn replace(records: Vec<PredictionRecord>) -> Self {
        Self {
            records,
            mode: RenderMode::Replace,
        }
    }

    pub fn append(records: Vec<PredictionRecord>) -> Self {
        Self {
            records,
            mode: RenderMode::Append,
        }
    }

    // A no-op for the renderer: appending nothing leaves the visible list
    // exactly as it was.
    fn unchanged() -> Self {
        Self::append(Vec::new())
    }
}

/// Load-more button state. Present only while the button should be shown,
/// i.e. something is loaded and the server holds more.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadMoreButton {
    pub loaded: usize,
    pub total_count: usize,
}

impl LoadMoreButton {
    pub fn label(&self) -> String {
        format!("SEE MORE PREDICTIONS ({} OF {})", self.loaded, self.total_count)
    }
}

/// Cloned view of the pager's state for rendering and aggregation.
#[derive(Clone, Debug)]
pub struct HistorySnapshot {
    pub records: Vec<PredictionRecord>,
    pub total_count: usize,
    pub has_more: bool,
}

#[derive(Debug)]
struct PagerState {
    loaded: Vec<PredictionRecord>,
    seen_ids: HashSet<String>,
    total_count: usize,
    has_more: bool,
}

impl Default for PagerState {
    fn default() -> Self {
        Self {
            loaded: Vec::new(),
            seen_ids: HashSet::new(),
            total_count: 0,
            has_more: true,
        }
    }
}

impl PagerState {
    // Appends records whose id has not been seen, in arrival order, and
    // returns the appended subset. `seen_ids` stays 1:1 with `loaded`.
    fn append_unique(&mut self, records: Vec<PredictionRecord>) -> Vec<PredictionRecord> {
        let mut appended = Vec::with_capacity(records.len());
        for record in records {
            if self.seen_ids.insert(record.id.clone()) {
                self.loaded.push(record.clone());
                appended.push(record);
            }
        }
        appended
    }

    fn all_loaded(&self) -> bool {
        self.total_count > 0 && self.loaded.len() >= self.total_count
    }
}

// Clears the in-flight flag on drop, so every exit path (success, failure,
// short-circuit) releases it.
struct FetchGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FetchGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(Self { flag })
    }

    fn seize(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self { flag }
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Owns the loaded history for one view. Methods take `&self` so a shared
/// pager can back an interactive session; the state lock is never held
/// across an await.
pub struct HistoryPager<S> {
    source: S,
    page_size: usize,
    in_flight: AtomicBool,
    // serializes concurrent resets; load_next never takes it
    reset_serial: tokio::sync::Mutex<()>,
    state: Mutex<PagerState>,
}

impl<S: HistorySource> HistoryPager<S> {
    pub fn new(source: S) -> Self {
        Self::with_page_size(source, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(source: S, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            in_flight: AtomicBool::new(false),
            reset_serial: tokio::sync::Mutex::new(()),
            state: Mutex::new(PagerState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, PagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn loaded_count(&self) -> usize {
        self.state().loaded.len()
    }

    pub fn total_count(&self) -> usize {
        self.state().total_count
    }

    pub fn has_more(&self) -> bool {
        self.state().has_more
    }

    /// Clears the cache and fetches the first page again. Concurrent
    /// resets run one after the other.
    ///
    /// On failure the cache stays empty and the counters keep their
    /// pre-call values; the error is the caller's to surface. Must not be
    /// called while a `load_next` is still in flight.
    pub async fn reset(&self) -> Result<ViewState, ApiError> {
        let _serial = self.reset_serial.lock().await;
        let _fetch = FetchGuard::seize(&self.in_flight);
        {
            let mut state = self.state();
            state.loaded.clear();
            state.seen_ids.clear();
        }

        let page = self.source.list_recent(0, self.page_size).await?;

        let mut state = self.state();
        state.total_count = page.total_count;
        state.has_more = page.has_more;
        state.append_unique(page.records);
        Ok(ViewState::replace(state.loaded.clone()))
    }

    /// Fetches the next page at `skip = |loaded|` and appends the records
    /// not already cached.
    ///
    /// A call while a fetch is in flight, or once everything the server
    /// reported is loaded, resolves to an unchanged view without touching
    /// the network. On failure the state is exactly as before the call.
    pub async fn load_next(&self) -> Result<ViewState, ApiError> {
        let Some(_fetch) = FetchGuard::acquire(&self.in_flight) else {
            return Ok(ViewState::unchanged());
        };

        let skip = {
            let state = self.state();
            if state.all_loaded() {
                return Ok(ViewState::unchanged());
            }
            state.loaded.len()
        };

        let page = self.source.list_recent(skip, self.page_size).await?;

        let mut state = self.state();
        state.total_count = page.total_count;
        state.has_more = page.has_more;
        let appended = state.append_unique(page.records);
        Ok(ViewState::append(appended))
    }

    /// Truncates the cache back to the first page. Purely local.
    pub fn collapse(&self) -> ViewState {
        let mut state = self.state();
        state.loaded.truncate(self.page_size);
        state.seen_ids = state.loaded.iter().map(|r| r.id.clone()).collect();
        state.has_more = state.total_count > self.page_size;
        ViewState::replace(state.loaded.clone())
    }

    /// Derived button state: a pure projection of the counters. Never
    /// fetches, never mutates.
    pub fn load_more(&self) -> Option<LoadMoreButton> {
        let state = self.state();
        let loaded = state.loaded.len();
        (loaded > 0 && loaded < state.total_count).then_some(LoadMoreButton {
            loaded,
            total_count: state.total_count,
        })
    }

    #[cfg(test)]
    pub(crate) fn source_for_tests(&self) -> &S {
        &self.source
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        let state = self.state();
        HistorySnapshot {
            records: state.loaded.clone(),
            total_count: state.total_count,
            has_more: state.has_more,
        }
    }
}
