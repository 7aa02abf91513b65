//! Global search across the manifest's table views.
//!
//! Categories are derived once from the manifest. The index is built once
//! per session from the cached category queries and never rebuilt.

mod category;
mod index;
mod matcher;
mod session;

pub use category::{build_search_categories, SearchCategory};
pub use index::{IndexState, IndexedRow, SearchIndex};
pub use matcher::{
    highlight_spans, perform_search, query_terms, truncate, ResultGroup, SearchEntry,
    SearchOutcome, SearchResults,
};
pub use session::{SearchSession, SearchTicket};
