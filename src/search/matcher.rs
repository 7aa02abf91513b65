use super::category::SearchCategory;
use super::index::{field_text, IndexState, IndexedRow};
use crate::config::SearchConfig;
use crate::data::{EntityId, Row};
use crate::format::LinkTarget;
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

/// Split a query into lowercase whitespace-separated terms.
pub fn query_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// One search hit.
#[derive(Debug, Clone)]
pub struct SearchEntry {
    /// Index of the category in the result's category list.
    pub category: usize,
    /// The matching row.
    pub row: Row,
}

/// Hits of one category.
#[derive(Debug, Clone)]
pub struct ResultGroup {
    /// The category.
    pub category: SearchCategory,
    /// Total number of hits.
    pub total: usize,
    /// Entry indices currently shown, in display order.
    pub shown: Vec<usize>,
    /// Hits not shown yet.
    hidden: Vec<Row>,
}

impl ResultGroup {
    /// Hits behind the "+N more" line.
    pub fn more(&self) -> usize {
        self.hidden.len()
    }
}

/// Search results with a highlighted entry.
///
/// Entry indices are stable: expanding a category appends its remaining
/// hits at the end of [`SearchResults::entries`] without moving the ones
/// already shown.
#[derive(Debug, Clone)]
pub struct SearchResults {
    /// Lowercase query terms.
    pub terms: Vec<String>,
    /// All shown hits, by stable index.
    pub entries: Vec<SearchEntry>,
    /// Non-empty categories in manifest order.
    pub groups: Vec<ResultGroup>,
    highlight: Option<usize>,
}

/// Outcome of a search request.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// Query too short; the result list is hidden.
    Hidden,
    /// Index still building; ask again after the retry delay.
    NotReady,
    /// Results (possibly none).
    Results(SearchResults),
}

fn display_of(row: &Row, category: &SearchCategory) -> String {
    field_text(row, &category.display_field)
}

/// Run a query against the index.
///
/// Every term must occur in a row's search text. Within a category, rows
/// whose display field starts with the first term come first, then the rest,
/// each alphabetically.
pub fn perform_search(
    query: &str,
    categories: &[SearchCategory],
    index: &IndexState,
    config: &SearchConfig,
) -> SearchOutcome {
    let query = query.trim();
    if query.chars().count() < config.min_query_chars {
        return SearchOutcome::Hidden;
    }
    let Some(index) = index.ready() else {
        return SearchOutcome::NotReady;
    };

    let terms = query_terms(query);
    let mut results = SearchResults {
        terms,
        entries: Vec::new(),
        groups: Vec::new(),
        highlight: None,
    };

    for category in categories {
        let matches: Vec<&IndexedRow> = index
            .rows(&category.key)
            .iter()
            .filter(|row| row.matches(&results.terms))
            .collect();
        if matches.is_empty() {
            continue;
        }

        let first = results.terms.first().map(String::as_str).unwrap_or_default();
        let mut keyed: Vec<(bool, String, &IndexedRow)> = matches
            .into_iter()
            .map(|row| {
                let name = display_of(&row.row, category).to_lowercase();
                (!name.starts_with(first), name, row)
            })
            .collect();
        keyed.sort_by(|a, b| match a.0.cmp(&b.0) {
            Ordering::Equal => a.1.cmp(&b.1),
            other => other,
        });

        let group_index = results.groups.len();
        let total = keyed.len();
        let limit = category.default_limit;
        let mut shown = Vec::new();
        let mut hidden = Vec::new();
        for (i, (_, _, row)) in keyed.into_iter().enumerate() {
            if i < limit {
                shown.push(results.entries.len());
                results.entries.push(SearchEntry {
                    category: group_index,
                    row: row.row.clone(),
                });
            } else {
                hidden.push(row.row.clone());
            }
        }
        results.groups.push(ResultGroup {
            category: category.clone(),
            total,
            shown,
            hidden,
        });
    }

    SearchOutcome::Results(results)
}

impl SearchResults {
    /// True when nothing matched.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total hits across categories, shown or not.
    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.total).sum()
    }

    /// Show the rest of a category's hits.
    pub fn show_more(&mut self, group: usize) {
        let Some(g) = self.groups.get_mut(group) else {
            return;
        };
        for row in g.hidden.drain(..) {
            g.shown.push(self.entries.len());
            self.entries.push(SearchEntry {
                category: group,
                row,
            });
        }
    }

    /// Entry indices in display order.
    pub fn display_order(&self) -> Vec<usize> {
        self.groups.iter().flat_map(|g| g.shown.iter().copied()).collect()
    }

    /// The highlighted entry.
    pub fn highlight(&self) -> Option<usize> {
        self.highlight
    }

    /// Move the highlight by `delta` in display order, wrapping around.
    pub fn move_highlight(&mut self, delta: isize) {
        let order = self.display_order();
        if order.is_empty() {
            return;
        }
        let len = order.len() as isize;
        let next = match self.highlight.and_then(|h| order.iter().position(|&e| e == h)) {
            Some(pos) => (pos as isize + delta).rem_euclid(len),
            None if delta < 0 => len - 1,
            None => 0,
        };
        self.highlight = Some(order[next as usize]);
    }

    /// Clear the highlight.
    pub fn clear_highlight(&mut self) {
        self.highlight = None;
    }

    /// Category of an entry.
    pub fn category_of(&self, entry: usize) -> Option<&SearchCategory> {
        let e = self.entries.get(entry)?;
        self.groups.get(e.category).map(|g| &g.category)
    }

    /// Display text of an entry.
    pub fn display_text(&self, entry: usize) -> String {
        match (self.entries.get(entry), self.category_of(entry)) {
            (Some(e), Some(cat)) => display_of(&e.row, cat),
            _ => String::new(),
        }
    }

    /// Metadata line of an entry: non-empty meta fields joined by `", "`,
    /// truncated to `max_chars` with `"..."`.
    pub fn meta_text(&self, entry: usize, max_chars: usize) -> String {
        let (Some(e), Some(cat)) = (self.entries.get(entry), self.category_of(entry)) else {
            return String::new();
        };
        let joined = cat
            .meta_fields
            .iter()
            .map(|f| field_text(&e.row, f))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        truncate(&joined, max_chars)
    }

    /// Detail target of an entry, when its category has a detail view.
    pub fn target(&self, entry: usize) -> Option<LinkTarget> {
        let e = self.entries.get(entry)?;
        let cat = self.category_of(entry)?;
        let view = cat.detail_view.as_deref()?;
        let id = e.row.get(&cat.id_key).and_then(EntityId::from_value)?;
        LinkTarget::new(view, id)
    }

    /// Split `text` into `(piece, matched)` runs for the query terms.
    pub fn highlight_spans(&self, text: &str) -> Vec<(String, bool)> {
        highlight_spans(text, &self.terms)
    }
}

/// Shorten to `max_chars` characters, appending `"..."` when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

fn terms_regex(terms: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = terms
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| regex::escape(t))
        .collect();
    if alternatives.is_empty() {
        return None;
    }
    RegexBuilder::new(&alternatives.join("|"))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Split `text` into `(piece, matched)` runs, case-insensitively.
pub fn highlight_spans(text: &str, terms: &[String]) -> Vec<(String, bool)> {
    let Some(re) = terms_regex(terms) else {
        return vec![(text.to_string(), false)];
    };
    let mut spans = Vec::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            spans.push((text[last..m.start()].to_string(), false));
        }
        spans.push((m.as_str().to_string(), true));
        last = m.end();
    }
    if last < text.len() || spans.is_empty() {
        spans.push((text[last..].to_string(), false));
    }
    spans
}
