//! Render-ready view models.
//!
//! Each tab view of the manifest becomes one of these: a collapsible
//! [`TreeBrowser`], a sortable [`TableView`] or a merged-cell [`ChartView`].
//! They hold rows and cursor state but never fetch anything; the session
//! feeds them.

mod chart;
mod table;
mod tree;

pub use chart::{ChartCell, ChartView};
pub use table::TableView;
pub use tree::{ItemList, ItemState, LeafSelection, TreeBrowser, TreeItem};

use crate::data::{display_value, is_truthy, EntityId, Row};
use crate::format::{Fragment, FormattedValue, LinkTarget};
use crate::manifest::{ClickTarget, ColumnDef, ColumnType};
use crate::search::truncate;
use serde_json::Value;

/// Format one table cell. Missing and null values render empty, except in
/// boolean columns where they read "No".
pub fn format_cell(column: &ColumnDef, row: &Row) -> FormattedValue {
    if column.column_type == ColumnType::Boolean {
        let yes = row.get(&column.key).is_some_and(is_truthy);
        return FormattedValue::text(if yes { "Yes" } else { "No" });
    }
    let value = match row.get(&column.key) {
        None | Some(Value::Null) => return FormattedValue::empty(),
        Some(value) => value,
    };
    let text = match column.column_type {
        ColumnType::Color => return FormattedValue::one(Fragment::ColorChip(display_value(value))),
        _ => display_value(value),
    };
    let text = match column.truncate {
        Some(max) => truncate(&text, max),
        None => text,
    };
    if column.italic {
        FormattedValue::one(Fragment::Italic(text))
    } else {
        FormattedValue::text(text)
    }
}

/// Resolve a click definition against a row.
pub fn click_target(click: Option<&ClickTarget>, row: &Row) -> Option<LinkTarget> {
    let click = click?;
    let view = click.detail_view.as_deref()?;
    let id = row.get(&click.id_key).and_then(EntityId::from_value)?;
    LinkTarget::new(view, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn column(key: &str, column_type: ColumnType) -> ColumnDef {
        ColumnDef {
            key: key.to_string(),
            column_type,
            ..ColumnDef::default()
        }
    }

    #[test]
    fn cells_follow_column_type() {
        let r = row(json!({"valid": 0, "color": "#aabbcc", "n": 3.0, "gone": null}));
        assert_eq!(format_cell(&column("valid", ColumnType::Boolean), &r).plain_text(), "No");
        assert_eq!(
            format_cell(&column("color", ColumnType::Color), &r).0,
            vec![Fragment::ColorChip("#aabbcc".to_string())]
        );
        assert_eq!(format_cell(&column("n", ColumnType::Number), &r).plain_text(), "3");
        assert_eq!(format_cell(&column("gone", ColumnType::Boolean), &r).plain_text(), "No");
        assert!(format_cell(&column("gone", ColumnType::Text), &r).is_empty());
        assert!(format_cell(&column("missing", ColumnType::Text), &r).is_empty());
    }

    #[test]
    fn long_cells_are_truncated() {
        let r = row(json!({"author": "Walcott and Resser and others"}));
        let col = ColumnDef {
            key: "author".to_string(),
            truncate: Some(7),
            italic: true,
            ..ColumnDef::default()
        };
        assert_eq!(
            format_cell(&col, &r).0,
            vec![Fragment::Italic("Walcott...".to_string())]
        );
    }

    #[test]
    fn click_targets_need_view_and_id() {
        let r = row(json!({"id": 7, "taxon_id": null}));
        let click = ClickTarget {
            detail_view: Some("genus_detail".to_string()),
            id_key: "id".to_string(),
        };
        let target = click_target(Some(&click), &r).unwrap();
        assert_eq!(target.id, EntityId::from(7));

        let no_id = ClickTarget {
            id_key: "taxon_id".to_string(),
            ..click.clone()
        };
        assert!(click_target(Some(&no_id), &r).is_none());
        assert!(click_target(None, &r).is_none());
    }
}
