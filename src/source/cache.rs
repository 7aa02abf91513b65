use crate::data::Row;
use std::collections::HashMap;
use std::sync::Arc;

/// Query results memoised by query name.
///
/// Valid for the lifetime of one loaded manifest: entries are never
/// evicted or refreshed, a new session starts with an empty cache.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<String, Arc<Vec<Row>>>,
}

impl QueryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached rows of a query.
    pub fn get(&self, query: &str) -> Option<Arc<Vec<Row>>> {
        self.entries.get(query).cloned()
    }

    /// True when the query has been fetched.
    pub fn contains(&self, query: &str) -> bool {
        self.entries.contains_key(query)
    }

    /// Store rows, keeping an existing entry if one raced in first.
    pub fn insert(&mut self, query: &str, rows: Vec<Row>) -> Arc<Vec<Row>> {
        self.entries
            .entry(query.to_string())
            .or_insert_with(|| Arc::new(rows))
            .clone()
    }

    /// Number of cached queries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
