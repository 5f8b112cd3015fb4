//! Sequence-numbered, debounced search requests.
//!
//! Every keystroke issues a [`SearchTicket`] with a higher sequence number. Results
//! are only delivered for the newest ticket, so a slow response to an older query
//! can never overwrite the results of a newer one. [`SearchSequencer::run_debounced`]
//! also skips the request entirely when a newer query arrives during the debounce
//! window.

use crate::{config::settings::Settings, errors::Result};
use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

/// Identifies one issued search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub sequence: u64,
    pub query: String,
}

/// Hands out search tickets and filters out stale results.
#[derive(Debug)]
pub struct SearchSequencer {
    issued: AtomicU64,
    applied: AtomicU64,
    window: Duration,
}

impl Default for SearchSequencer {
    fn default() -> Self {
        Self::new(Settings::default().search_debounce())
    }
}

impl SearchSequencer {
    /// Creates a sequencer that waits `window` of inactivity before searching.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            issued: AtomicU64::new(0),
            applied: AtomicU64::new(0),
            window,
        }
    }

    /// Uses the debounce window configured in `settings`.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.search_debounce())
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Registers a new query; every earlier ticket becomes stale.
    pub fn issue(&self, query: impl Into<String>) -> SearchTicket {
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        SearchTicket {
            sequence,
            query: query.into(),
        }
    }

    /// Whether no newer query has been issued since `ticket`.
    #[must_use]
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.sequence
    }

    /// Sequence number of the last ticket whose results were delivered, 0 if none.
    #[must_use]
    pub fn last_applied(&self) -> u64 {
        self.applied.load(Ordering::SeqCst)
    }

    /// Returns the results if `ticket` is still the newest query, otherwise drops them.
    pub fn accept<T>(&self, ticket: &SearchTicket, results: T) -> Option<T> {
        if !self.is_current(ticket) {
            tracing::debug!(
                sequence = ticket.sequence,
                query = %ticket.query,
                "Discarding stale search results"
            );
            return None;
        }
        self.applied.fetch_max(ticket.sequence, Ordering::SeqCst);
        Some(results)
    }

    /// Waits out the debounce window, then runs `fetch` if `ticket` is still the
    /// newest query and delivers its results if it still is afterwards.
    ///
    /// Returns `Ok(None)` when the query was superseded before or during the fetch.
    ///
    /// # Errors
    /// Propagates the error of `fetch`.
    pub async fn run_debounced<T, F, Fut>(&self, ticket: &SearchTicket, fetch: F) -> Result<Option<T>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        tokio::time::sleep(self.window).await;
        if !self.is_current(ticket) {
            tracing::trace!(sequence = ticket.sequence, "Search superseded while debouncing");
            return Ok(None);
        }

        let results = fetch(ticket.query.clone()).await?;
        Ok(self.accept(ticket, results))
    }
}
