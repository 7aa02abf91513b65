//! Interactive search box state.

use super::matcher::SearchResults;
use std::time::{Duration, Instant};

/// Ticket identifying one search request.
///
/// Results are only applied when their ticket is still the latest one, so
/// an older request finishing late never overwrites a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
}

/// Search box state: input buffer, debounce timer and the latest results.
#[derive(Debug, Default)]
pub struct SearchSession {
    is_active: bool,
    buffer: String,
    generation: u64,
    pending_since: Option<Instant>,
    retry_at: Option<(Instant, SearchTicket)>,
    results: Option<SearchResults>,
    building: bool,
}

impl SearchSession {
    /// Create an inactive search box.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the search box has focus.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Focus the search box, keeping the previous text.
    pub fn start(&mut self) {
        self.is_active = true;
    }

    /// Add a character and restart the debounce timer.
    pub fn input(&mut self, c: char) {
        self.buffer.push(c);
        self.pending_since = Some(Instant::now());
    }

    /// Remove the last character and restart the debounce timer.
    pub fn backspace(&mut self) {
        self.buffer.pop();
        self.pending_since = Some(Instant::now());
    }

    /// Replace the whole query (headless use).
    pub fn set_query(&mut self, query: &str) {
        self.buffer = query.to_string();
        self.pending_since = Some(Instant::now());
    }

    /// Close the dropdown and drop focus.
    pub fn cancel(&mut self) {
        self.is_active = false;
        self.results = None;
        self.building = false;
        self.pending_since = None;
        self.retry_at = None;
        self.generation += 1;
    }

    /// Get the search buffer.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// True once the input has been quiet for `debounce`.
    pub fn debounce_elapsed(&self, debounce: Duration, now: Instant) -> bool {
        self.pending_since
            .is_some_and(|since| now.duration_since(since) >= debounce)
    }

    /// Start a new search generation; any older ticket becomes stale.
    pub fn begin(&mut self) -> SearchTicket {
        self.pending_since = None;
        self.retry_at = None;
        self.generation += 1;
        SearchTicket {
            generation: self.generation,
        }
    }

    /// True when `ticket` is the latest request.
    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Apply results if the ticket is still current. Returns whether they
    /// were applied.
    pub fn accept(&mut self, ticket: SearchTicket, results: Option<SearchResults>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.building = false;
        self.results = results;
        true
    }

    /// Mark `ticket` as waiting for the index; it is retried after `delay`.
    pub fn defer(&mut self, ticket: SearchTicket, delay: Duration, now: Instant) {
        if self.is_current(ticket) {
            self.building = true;
            self.retry_at = Some((now + delay, ticket));
        }
    }

    /// The deferred ticket whose retry time has come.
    pub fn due_retry(&mut self, now: Instant) -> Option<SearchTicket> {
        match self.retry_at {
            Some((at, ticket)) if now >= at => {
                self.retry_at = None;
                self.is_current(ticket).then_some(ticket)
            },
            _ => None,
        }
    }

    /// True while a search waits for the index.
    pub fn is_building(&self) -> bool {
        self.building
    }

    /// Latest applied results.
    pub fn results(&self) -> Option<&SearchResults> {
        self.results.as_ref()
    }

    /// Latest applied results, mutably (highlight, show more).
    pub fn results_mut(&mut self) -> Option<&mut SearchResults> {
        self.results.as_mut()
    }
}
