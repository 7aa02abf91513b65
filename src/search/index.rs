use super::category::SearchCategory;
use crate::data::{display_value, is_truthy, Row};
use std::collections::HashMap;

/// A row with its precomputed lowercase search text.
#[derive(Debug, Clone)]
pub struct IndexedRow {
    /// The source row.
    pub row: Row,
    /// Search fields joined by spaces, lowercased.
    pub text: String,
}

impl IndexedRow {
    /// Index a row over the given fields. Falsy values contribute nothing.
    pub fn new(row: Row, fields: &[String]) -> Self {
        let text = fields
            .iter()
            .map(|f| field_text(&row, f))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Self { row, text }
    }

    /// True when every term occurs in the search text.
    pub fn matches(&self, terms: &[String]) -> bool {
        terms.iter().all(|term| self.text.contains(term.as_str()))
    }
}

/// Text of a row key, empty for missing or falsy values.
pub(crate) fn field_text(row: &Row, key: &str) -> String {
    row.get(key)
        .filter(|v| is_truthy(v))
        .map(display_value)
        .unwrap_or_default()
}

/// Search rows per category key.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    categories: HashMap<String, Vec<IndexedRow>>,
}

impl SearchIndex {
    /// Index a category's rows, replacing anything indexed before under its key.
    pub fn insert(&mut self, category: &SearchCategory, rows: &[Row]) {
        let indexed = rows
            .iter()
            .map(|row| IndexedRow::new(row.clone(), &category.fields))
            .collect();
        self.categories.insert(category.key.clone(), indexed);
    }

    /// Record a category whose rows could not be fetched.
    pub fn insert_empty(&mut self, category: &SearchCategory) {
        self.categories.insert(category.key.clone(), Vec::new());
    }

    /// Indexed rows of a category.
    pub fn rows(&self, key: &str) -> &[IndexedRow] {
        self.categories.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of indexed rows.
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// True when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lifecycle of the session's search index.
#[derive(Debug, Default)]
pub enum IndexState {
    /// Not requested yet.
    #[default]
    Empty,
    /// Category queries are in flight.
    Building,
    /// Built; never rebuilt for the rest of the session.
    Ready(SearchIndex),
}

impl IndexState {
    /// The index, once ready.
    pub fn ready(&self) -> Option<&SearchIndex> {
        match self {
            Self::Ready(index) => Some(index),
            _ => None,
        }
    }
}
