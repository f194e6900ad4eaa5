//! Scroll-driven history pagination.
//!
//! The [`Paginator`] watches the renderer's scroll position and asks the
//! engine for the next older page when the user approaches the loaded
//! tail. Requests are single-flight: no second fetch is issued until the
//! first one's completion (success or failure) has been processed, no
//! matter how many scroll signals arrive in between.
//!
//! An empty (or fully duplicate) page latches the *exhausted* flag,
//! which suppresses further fetches until an explicit refresh - the
//! engine has no more history to give and re-asking would spin. Fetch
//! results are stamped with a generation so completions that outlive a
//! refresh or teardown are discarded instead of mutating a stale store.

use tracing::debug;

use crate::action::FetchRequest;

/// Fetch state: at most one request in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchState {
    /// No request in flight.
    Idle,
    /// Waiting for one request's completion.
    LoadingMore,
}

/// Scroll-position driven pagination controller.
#[derive(Debug)]
pub struct Paginator {
    state: FetchState,
    /// Latched when a load delivered nothing new; cleared by refresh.
    exhausted: bool,
    /// Stamp for discarding completions issued against an older window.
    generation: u64,
    page_size: usize,
    /// Remaining-rows threshold below which the next page is requested.
    threshold: usize,
}

impl Paginator {
    /// Create an idle paginator.
    pub fn new(page_size: usize, threshold: usize) -> Self {
        Self { state: FetchState::Idle, exhausted: false, generation: 0, page_size, threshold }
    }

    /// Current generation stamp.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True if a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.state == FetchState::LoadingMore
    }

    /// True if the engine reported end of history.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Request the first page of a (re)loaded conversation.
    pub fn request_first_page(&mut self) -> FetchRequest {
        self.state = FetchState::LoadingMore;
        FetchRequest { generation: self.generation, start: 0, end: self.page_size }
    }

    /// Process a scroll signal; returns the fetch to issue, if any.
    ///
    /// Transitions to loading when the distance from the last visible
    /// row to the loaded tail drops below the threshold, unless a fetch
    /// is already in flight or history is exhausted.
    pub fn on_scroll(&mut self, last_visible: usize, total_loaded: usize) -> Option<FetchRequest> {
        if self.state == FetchState::LoadingMore || self.exhausted {
            return None;
        }
        if total_loaded.saturating_sub(last_visible) >= self.threshold {
            return None;
        }

        self.state = FetchState::LoadingMore;
        Some(FetchRequest {
            generation: self.generation,
            start: total_loaded,
            end: total_loaded + self.page_size,
        })
    }

    /// Process a fetch completion.
    ///
    /// Returns true if the completion belongs to the current generation
    /// and its page should be applied; stale completions return false
    /// and must be discarded by the caller. `added` is the number of
    /// entries the store actually accepted.
    pub fn complete(&mut self, request: &FetchRequest, added: usize) -> bool {
        if request.generation != self.generation {
            debug!(
                stale = request.generation,
                current = self.generation,
                "discarding stale fetch completion"
            );
            return false;
        }
        self.state = FetchState::Idle;
        if added == 0 {
            self.exhausted = true;
        }
        true
    }

    /// Process a fetch failure: back to idle, no store mutation, no
    /// automatic retry. The next qualifying scroll signal may try again.
    pub fn fail(&mut self, request: &FetchRequest) {
        if request.generation == self.generation {
            self.state = FetchState::Idle;
        }
    }

    /// Invalidate in-flight requests and clear the exhausted latch,
    /// for a full reload or teardown.
    pub fn refresh(&mut self) {
        self.generation += 1;
        self.state = FetchState::Idle;
        self.exhausted = false;
    }
}
