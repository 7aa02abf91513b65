//! Data rows and value helpers.
//!
//! Rows come back from the query API as opaque JSON objects. Everything that
//! reads them goes through the helpers here so that missing keys, nulls and
//! odd types degrade to empty values instead of errors.

mod path;
mod value;

pub use path::{check_condition, resolve_data_path, resolve_row_path};
pub use value::{as_number, compare_values, display_value, is_blank, is_truthy, EntityId};

/// A single row as returned by a query: column key to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;
