//! Raw manifest JSON and its normalisation into [`ViewDef`].
//!
//! Older packages describe hierarchies as `type: "tree"` with `tree_options`
//! or `type: "chart"` with `chart_options`. Both are folded into the unified
//! `hierarchy` view here, so nothing downstream sees the legacy shapes.

use super::section::SectionDef;
use super::view::{
    ClickTarget, ColumnDef, DetailDef, HierarchyOptions, NestedTableDisplay, RankColumn, SortBy,
    SortSpec, TitleTemplate, TreeDisplay, ValueColumn, ViewDef, ViewKind,
};
use crate::error::{Result, StrataError};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHierarchy {
    id_key: Option<String>,
    parent_key: Option<String>,
    label_key: Option<String>,
    rank_key: Option<String>,
    sort_by: Option<String>,
    order_key: Option<String>,
    skip_ranks: Vec<String>,
}

impl RawHierarchy {
    fn into_options(self) -> HierarchyOptions {
        let defaults = HierarchyOptions::default();
        let sort_by = match self.sort_by.as_deref() {
            Some("order_key") => SortBy::OrderKey,
            _ => SortBy::Label,
        };
        HierarchyOptions {
            id_key: self.id_key.unwrap_or(defaults.id_key),
            parent_key: self.parent_key.unwrap_or(defaults.parent_key),
            label_key: self.label_key.unwrap_or(defaults.label_key),
            rank_key: self.rank_key.unwrap_or(defaults.rank_key),
            sort_by,
            order_key: self.order_key.unwrap_or(defaults.order_key),
            skip_ranks: self.skip_ranks.into_iter().collect::<HashSet<_>>(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNestedTable {
    color_key: Option<String>,
    rank_columns: Option<Vec<RankColumn>>,
    value_column: Option<ValueColumn>,
    cell_click: Option<ClickTarget>,
}

impl RawNestedTable {
    fn into_display(self) -> NestedTableDisplay {
        let defaults = NestedTableDisplay::default();
        NestedTableDisplay {
            color_key: self.color_key.unwrap_or(defaults.color_key),
            rank_columns: self
                .rank_columns
                .filter(|cols| !cols.is_empty())
                .unwrap_or(defaults.rank_columns),
            value_column: self.value_column.unwrap_or(defaults.value_column),
            cell_click: self.cell_click,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawView {
    #[serde(rename = "type")]
    view_type: String,
    display: Option<String>,
    title: Option<String>,
    description: Option<String>,
    icon: Option<String>,
    source_query: Option<String>,
    source: Option<String>,
    columns: Vec<ColumnDef>,
    default_sort: Option<SortSpec>,
    searchable: bool,
    on_row_click: Option<ClickTarget>,
    hierarchy_options: Option<RawHierarchy>,
    tree_display: Option<TreeDisplay>,
    nested_table_display: Option<RawNestedTable>,
    tree_options: Option<Value>,
    chart_options: Option<Value>,
    title_template: Option<TitleTemplate>,
    sections: Vec<SectionDef>,
}

fn decode<T: for<'de> Deserialize<'de>>(value: Value, context: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| StrataError::json(context, e))
}

/// Parse and normalise one view. Unknown types or displays are rejected.
pub(super) fn parse_view(key: &str, value: Value) -> Result<ViewDef> {
    let context = format!("view '{key}'");
    let mut raw: RawView = decode(value, &context)?;

    let kind = match raw.view_type.as_str() {
        "tree" if raw.tree_options.is_some() => {
            let options = raw.tree_options.take().unwrap_or_default();
            let mut hierarchy = decode::<RawHierarchy>(options.clone(), &context)?.into_options();
            hierarchy.sort_by = SortBy::Label;
            hierarchy.order_key = hierarchy.id_key.clone();
            hierarchy.skip_ranks.clear();
            ViewKind::Tree {
                hierarchy,
                display: decode(options, &context)?,
            }
        },
        "chart" if raw.chart_options.is_some() => {
            let options = raw.chart_options.take().unwrap_or_default();
            let mut hierarchy = decode::<RawHierarchy>(options.clone(), &context)?.into_options();
            hierarchy.sort_by = SortBy::OrderKey;
            ViewKind::NestedTable {
                hierarchy,
                display: decode::<RawNestedTable>(options, &context)?.into_display(),
            }
        },
        "hierarchy" => {
            let hierarchy = raw.hierarchy_options.take().unwrap_or_default().into_options();
            match raw.display.as_deref().unwrap_or("tree") {
                "tree" => ViewKind::Tree {
                    hierarchy,
                    display: raw.tree_display.take().unwrap_or_default(),
                },
                "nested_table" => ViewKind::NestedTable {
                    hierarchy,
                    display: raw
                        .nested_table_display
                        .take()
                        .unwrap_or_default()
                        .into_display(),
                },
                other => {
                    return Err(StrataError::InvalidManifest(format!(
                        "view '{key}' has unknown hierarchy display '{other}'"
                    )))
                },
            }
        },
        "table" => ViewKind::Table,
        "detail" => ViewKind::Detail(DetailDef {
            source: raw.source.take(),
            title_template: raw.title_template.take(),
            sections: std::mem::take(&mut raw.sections),
        }),
        other => {
            return Err(StrataError::InvalidManifest(format!(
                "view '{key}' has unknown type '{other}'"
            )))
        },
    };

    Ok(ViewDef {
        key: key.to_string(),
        title: raw.title.unwrap_or_else(|| key.to_string()),
        description: raw.description,
        icon: raw.icon,
        source_query: raw.source_query.filter(|q| !q.is_empty()),
        columns: raw.columns,
        default_sort: raw.default_sort,
        searchable: raw.searchable,
        on_row_click: raw.on_row_click,
        kind,
    })
}
