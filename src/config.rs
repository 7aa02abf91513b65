//! Viewer configuration.
//!
//! Defaults mirror what the web viewer hard-codes; the command line can
//! override some of them.

use std::time::Duration;

/// Search behaviour.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Queries shorter than this (in characters, after trimming) show nothing.
    pub min_query_chars: usize,
    /// Results shown per category before "show more".
    pub default_limit: usize,
    /// Quiet period after the last keystroke before a search runs.
    pub debounce: Duration,
    /// Delay before a search issued against an unready index is retried.
    pub retry_delay: Duration,
    /// Maximum length of the metadata line under a result.
    pub meta_truncate: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_chars: 2,
            default_limit: 5,
            debounce: Duration::from_millis(200),
            retry_delay: Duration::from_millis(300),
            meta_truncate: 60,
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Combined configuration for a viewer session.
#[derive(Debug, Clone, Default)]
pub struct ViewerConfig {
    /// Search settings.
    pub search: SearchConfig,
    /// HTTP settings.
    pub http: HttpConfig,
}

impl ViewerConfig {
    /// Override the per-category result limit.
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search.default_limit = limit.max(1);
        self
    }
}
