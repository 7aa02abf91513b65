//! Data sources: where manifests, query rows, detail records and
//! annotations come from.
//!
//! [`QuerySource`] is the seam between the interpreter and the outside
//! world. [`ApiClient`] talks to a running query API over HTTP;
//! [`PackageDir`] serves the same endpoints from an unpacked data package.

mod annotation;
mod cache;
mod http;
mod package;

pub use annotation::{Annotation, AnnotationList, AnnotationType, NewAnnotation};
pub use cache::QueryCache;
pub use http::ApiClient;
pub use package::PackageDir;

use crate::config::HttpConfig;
use crate::data::{EntityId, Row};
use crate::error::{Result, StrataError};
use crate::manifest::ManifestResponse;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Everything the viewer needs from a backend.
#[async_trait]
pub trait QuerySource: Send + Sync + fmt::Debug {
    /// Human-readable location, for the status bar.
    fn describe(&self) -> String;

    /// The manifest and package info.
    async fn manifest(&self) -> Result<ManifestResponse>;

    /// Execute a named query with optional `(name, value)` parameters.
    async fn execute(&self, query: &str, params: &[(String, String)]) -> Result<Vec<Row>>;

    /// Fetch a JSON document by API path (detail sources).
    async fn fetch_json(&self, path: &str) -> Result<Value>;

    /// Annotations of one entity.
    async fn annotations(&self, entity_type: &str, entity_id: &EntityId) -> Result<Vec<Annotation>>;

    /// Store a new annotation.
    async fn create_annotation(&self, annotation: &NewAnnotation) -> Result<Annotation>;

    /// Delete an annotation by id.
    async fn delete_annotation(&self, id: i64) -> Result<()>;
}

/// Open a source: `http(s)://` locations are API servers, anything else a
/// package directory.
pub fn open_source(location: &str, config: &HttpConfig) -> Result<Arc<dyn QuerySource>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Arc::new(ApiClient::new(location, config)?))
    } else {
        Ok(Arc::new(PackageDir::open(Path::new(location))?))
    }
}

/// API path of a detail record: the view's `source` with `{id}` filled in,
/// or the composite endpoint of the view.
pub fn detail_path(view_key: &str, source: Option<&str>, id: &EntityId) -> String {
    match source.filter(|s| !s.is_empty()) {
        Some(source) => source.replacen("{id}", id.as_str(), 1),
        None => format!("/api/composite/{view_key}?id={id}"),
    }
}

/// API path of the generic record dump for `table`.
pub fn auto_detail_path(table: &str, id: &EntityId) -> String {
    format!("/api/auto/detail/{table}?id={id}")
}

/// Rows of a query response: `{"rows": [...]}` or a bare array. Non-object
/// entries are skipped.
pub(crate) fn rows_from_value(value: Value, context: &str) -> Result<Vec<Row>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("rows") {
            Some(Value::Array(items)) => items,
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                return Err(StrataError::InvalidResponse(format!(
                    "{context}: 'rows' is not an array"
                )))
            },
        },
        _ => {
            return Err(StrataError::InvalidResponse(format!(
                "{context}: expected rows"
            )))
        },
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(row) => Some(row),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detail_paths_substitute_ids() {
        let id = EntityId::from(9);
        assert_eq!(detail_path("genus_detail", Some("/api/genus/{id}"), &id), "/api/genus/9");
        assert_eq!(
            detail_path("genus_detail", None, &id),
            "/api/composite/genus_detail?id=9"
        );
        assert_eq!(auto_detail_path("formation", &id), "/api/auto/detail/formation?id=9");
    }

    #[test]
    fn rows_accept_wrapped_and_bare_arrays() {
        let wrapped = rows_from_value(json!({"rows": [{"id": 1}, 7]}), "q").unwrap();
        assert_eq!(wrapped.len(), 1);
        let bare = rows_from_value(json!([{"id": 1}, {"id": 2}]), "q").unwrap();
        assert_eq!(bare.len(), 2);
        assert!(rows_from_value(json!({}), "q").unwrap().is_empty());
        assert!(rows_from_value(json!("nope"), "q").is_err());
    }
}
