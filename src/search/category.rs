use crate::manifest::{Manifest, ViewKind};

/// A searchable category derived from one table view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCategory {
    /// View key.
    pub key: String,
    /// Heading shown above the category's results.
    pub label: String,
    /// Icon name.
    pub icon: String,
    /// Query supplying the rows.
    pub query: String,
    /// Row keys concatenated into the search text.
    pub fields: Vec<String>,
    /// Row key shown as the result line.
    pub display_field: String,
    /// Show the result line in italics.
    pub display_italic: bool,
    /// Row keys shown under the result line.
    pub meta_fields: Vec<String>,
    /// Detail view opened by a result.
    pub detail_view: Option<String>,
    /// Row key holding the id passed to the detail view.
    pub id_key: String,
    /// Results shown before "show more".
    pub default_limit: usize,
}

/// One category per table view that has a source query and columns, in
/// manifest order.
pub fn build_search_categories(manifest: &Manifest, default_limit: usize) -> Vec<SearchCategory> {
    manifest
        .views
        .iter()
        .filter(|view| matches!(view.kind, ViewKind::Table))
        .filter_map(|view| {
            let query = view.source_query.clone()?;
            let first = view.columns.first()?;
            Some(SearchCategory {
                key: view.key.clone(),
                label: view.title.clone(),
                icon: view.icon.clone().unwrap_or_else(|| "bi-square".to_string()),
                query,
                fields: view.columns.iter().map(|c| c.key.clone()).collect(),
                display_field: first.key.clone(),
                display_italic: first.italic,
                meta_fields: view.columns.iter().skip(1).take(2).map(|c| c.key.clone()).collect(),
                detail_view: view.on_row_click.as_ref().and_then(|c| c.detail_view.clone()),
                id_key: view
                    .on_row_click
                    .as_ref()
                    .map_or_else(|| "id".to_string(), |c| c.id_key.clone()),
                default_limit,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn categories_come_from_table_views_with_columns() {
        let manifest = Manifest::from_value(json!({
            "views": {
                "tree": {"type": "hierarchy", "source_query": "taxa", "columns": [{"key": "name"}]},
                "genera": {
                    "type": "table",
                    "title": "Genera",
                    "source_query": "genera_list",
                    "columns": [
                        {"key": "name", "italic": true},
                        {"key": "author"},
                        {"key": "year"},
                        {"key": "family"}
                    ],
                    "on_row_click": {"detail_view": "genus_detail"}
                },
                "empty": {"type": "table", "source_query": "nothing", "columns": []},
                "unsourced": {"type": "table", "columns": [{"key": "name"}]}
            }
        }))
        .unwrap();

        let categories = build_search_categories(&manifest, 5);
        assert_eq!(categories.len(), 1);
        let genera = &categories[0];
        assert_eq!(genera.display_field, "name");
        assert!(genera.display_italic);
        assert_eq!(genera.meta_fields, ["author", "year"]);
        assert_eq!(genera.fields.len(), 4);
        assert_eq!(genera.detail_view.as_deref(), Some("genus_detail"));
        assert_eq!(genera.id_key, "id");
        assert_eq!(genera.icon, "bi-square");
    }
}
