//! Typed view definitions.

use super::section::SectionDef;
use serde::Deserialize;
use std::collections::HashSet;

fn default_id_key() -> String {
    "id".to_string()
}

/// Click behaviour: open `detail_view` with the id found under `id_key`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClickTarget {
    /// Target detail view; without one the click does nothing.
    #[serde(default)]
    pub detail_view: Option<String>,
    /// Row key holding the id.
    #[serde(default = "default_id_key")]
    pub id_key: String,
}

/// Column type in table views.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum ColumnType {
    /// Plain text.
    #[default]
    Text,
    /// Numeric value.
    Number,
    /// Yes/No.
    Boolean,
    /// Colour swatch.
    Color,
}

impl From<String> for ColumnType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "color" => Self::Color,
            _ => Self::Text,
        }
    }
}

/// Column of a table view or of a tree's item list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColumnDef {
    /// Row key.
    pub key: String,
    /// Header label.
    pub label: String,
    /// Column can be sorted.
    pub sortable: bool,
    /// Column participates in the table filter.
    pub searchable: bool,
    /// Cell rendered in italics.
    pub italic: bool,
    /// Cell type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Truncate cell text to this many characters.
    pub truncate: Option<usize>,
}

impl ColumnDef {
    /// Header label, falling back to the key.
    pub fn header(&self) -> &str {
        if self.label.is_empty() {
            &self.key
        } else {
            &self.label
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum SortDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl From<String> for SortDirection {
    fn from(tag: String) -> Self {
        if tag.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

impl SortDirection {
    /// The other direction.
    pub fn flip(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Sort column and direction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SortSpec {
    /// Column key.
    pub key: String,
    /// Direction.
    #[serde(default)]
    pub direction: SortDirection,
}

/// Sibling ordering in a hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Case-insensitive label order.
    #[default]
    Label,
    /// Ascending numeric order key.
    OrderKey,
}

/// How flat rows become a tree.
#[derive(Debug, Clone)]
pub struct HierarchyOptions {
    /// Row key of the node id.
    pub id_key: String,
    /// Row key of the parent id.
    pub parent_key: String,
    /// Row key of the display label.
    pub label_key: String,
    /// Row key of the rank.
    pub rank_key: String,
    /// Sibling ordering.
    pub sort_by: SortBy,
    /// Row key used for [`SortBy::OrderKey`].
    pub order_key: String,
    /// Ranks removed from the tree; their children are promoted.
    pub skip_ranks: HashSet<String>,
}

impl Default for HierarchyOptions {
    fn default() -> Self {
        Self {
            id_key: "id".to_string(),
            parent_key: "parent_id".to_string(),
            label_key: "name".to_string(),
            rank_key: "rank".to_string(),
            sort_by: SortBy::Label,
            order_key: "id".to_string(),
            skip_ranks: HashSet::new(),
        }
    }
}

/// Valid-only filter for a tree's item list.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidFilter {
    /// Item key holding the validity flag.
    pub key: String,
    /// Checkbox label.
    #[serde(default)]
    pub label: Option<String>,
    /// Initial state of the filter.
    #[serde(default = "default_true")]
    pub default: bool,
}

fn default_true() -> bool {
    true
}

/// Tree rendering options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TreeDisplay {
    /// Rank whose nodes are selectable leaves.
    pub leaf_rank: Option<String>,
    /// Row key of the item count shown on leaves.
    pub count_key: Option<String>,
    /// Detail link on every node.
    pub on_node_info: Option<ClickTarget>,
    /// Query listing the items of a selected leaf.
    pub item_query: Option<String>,
    /// Parameter name carrying the leaf id.
    pub item_param: Option<String>,
    /// Columns of the item list.
    pub item_columns: Vec<ColumnDef>,
    /// Click target for items.
    pub on_item_click: Option<ClickTarget>,
    /// Valid-only filter.
    pub item_valid_filter: Option<ValidFilter>,
}

impl TreeDisplay {
    /// Item columns, defaulting to name + id.
    pub fn columns(&self) -> Vec<ColumnDef> {
        if !self.item_columns.is_empty() {
            return self.item_columns.clone();
        }
        vec![
            ColumnDef {
                key: "name".to_string(),
                label: "Name".to_string(),
                ..ColumnDef::default()
            },
            ColumnDef {
                key: "id".to_string(),
                label: "ID".to_string(),
                ..ColumnDef::default()
            },
        ]
    }
}

/// One rank column of a nested table.
#[derive(Debug, Clone, Deserialize)]
pub struct RankColumn {
    /// Rank value mapped to this column.
    pub rank: String,
    /// Header label.
    #[serde(default)]
    pub label: Option<String>,
}

impl RankColumn {
    fn new(rank: &str, label: &str) -> Self {
        Self {
            rank: rank.to_string(),
            label: Some(label.to_string()),
        }
    }

    /// Header label, falling back to the rank.
    pub fn header(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.rank)
    }
}

/// Trailing value column of a nested table.
#[derive(Debug, Clone, Deserialize)]
pub struct ValueColumn {
    /// Row key read from each leaf.
    pub key: String,
    /// Header label.
    #[serde(default)]
    pub label: String,
}

impl Default for ValueColumn {
    fn default() -> Self {
        Self {
            key: "start_mya".to_string(),
            label: "Age (Ma)".to_string(),
        }
    }
}

/// Nested-table rendering options.
#[derive(Debug, Clone)]
pub struct NestedTableDisplay {
    /// Row key of the cell background colour.
    pub color_key: String,
    /// Rank columns, left to right.
    pub rank_columns: Vec<RankColumn>,
    /// Value column after the rank columns.
    pub value_column: ValueColumn,
    /// Detail link for cells.
    pub cell_click: Option<ClickTarget>,
}

impl Default for NestedTableDisplay {
    fn default() -> Self {
        Self {
            color_key: "color".to_string(),
            rank_columns: vec![
                RankColumn::new("Eon", "Eon"),
                RankColumn::new("Era", "Era"),
                RankColumn::new("Period", "System / Period"),
                RankColumn::new("Sub-Period", "Sub-Period"),
                RankColumn::new("Epoch", "Series / Epoch"),
                RankColumn::new("Age", "Stage / Age"),
            ],
            value_column: ValueColumn::default(),
            cell_click: None,
        }
    }
}

/// Detail modal title template.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TitleTemplate {
    /// Format with `{icon}` and `{field}` placeholders.
    pub format: Option<String>,
    /// Icon name substituted for `{icon}`.
    pub icon: Option<String>,
}

/// Detail view definition.
#[derive(Debug, Clone, Default)]
pub struct DetailDef {
    /// Source path with an `{id}` placeholder.
    pub source: Option<String>,
    /// Title template.
    pub title_template: Option<TitleTemplate>,
    /// Sections in display order.
    pub sections: Vec<SectionDef>,
}

/// The renderer a view selects.
#[derive(Debug, Clone)]
pub enum ViewKind {
    /// Hierarchy displayed as a collapsible tree.
    Tree {
        /// Tree building options.
        hierarchy: HierarchyOptions,
        /// Tree display options.
        display: TreeDisplay,
    },
    /// Hierarchy displayed as a merged-cell chart.
    NestedTable {
        /// Tree building options.
        hierarchy: HierarchyOptions,
        /// Chart display options.
        display: NestedTableDisplay,
    },
    /// Flat sortable table.
    Table,
    /// Detail modal.
    Detail(DetailDef),
}

/// A named view from the manifest.
#[derive(Debug, Clone)]
pub struct ViewDef {
    /// Manifest key.
    pub key: String,
    /// Tab or modal title.
    pub title: String,
    /// Subtitle.
    pub description: Option<String>,
    /// Icon name.
    pub icon: Option<String>,
    /// Named query supplying the rows.
    pub source_query: Option<String>,
    /// Table columns.
    pub columns: Vec<ColumnDef>,
    /// Initial table sort.
    pub default_sort: Option<SortSpec>,
    /// Table offers a filter box.
    pub searchable: bool,
    /// Row click target.
    pub on_row_click: Option<ClickTarget>,
    /// Renderer selection.
    pub kind: ViewKind,
}

impl ViewDef {
    /// The manifest `type` this view normalised to.
    pub fn view_type(&self) -> &'static str {
        match self.kind {
            ViewKind::Tree { .. } | ViewKind::NestedTable { .. } => "hierarchy",
            ViewKind::Table => "table",
            ViewKind::Detail(_) => "detail",
        }
    }

    /// The hierarchy `display`, if any.
    pub fn display(&self) -> Option<&'static str> {
        match self.kind {
            ViewKind::Tree { .. } => Some("tree"),
            ViewKind::NestedTable { .. } => Some("nested_table"),
            _ => None,
        }
    }

    /// True for detail views, which never appear as tabs.
    pub fn is_detail(&self) -> bool {
        matches!(self.kind, ViewKind::Detail(_))
    }

    /// Detail definition, for detail views.
    pub fn detail(&self) -> Option<&DetailDef> {
        match &self.kind {
            ViewKind::Detail(def) => Some(def),
            _ => None,
        }
    }
}
