use super::builder::TreeNode;
use crate::data::display_value;
use crate::manifest::NestedTableDisplay;
use serde_json::Value;
use std::collections::HashMap;

/// Mapping from rank to column index in a nested table.
#[derive(Debug, Clone)]
pub struct RankColumns {
    index: HashMap<String, usize>,
    width: usize,
}

impl RankColumns {
    /// Columns in the given rank order. A repeated rank keeps its first
    /// column but still counts toward the width.
    pub fn new<I, S>(ranks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = HashMap::new();
        let mut width = 0;
        for rank in ranks {
            index.entry(rank.into()).or_insert(width);
            width += 1;
        }
        Self { index, width }
    }

    /// Columns of a nested-table display.
    pub fn from_display(display: &NestedTableDisplay) -> Self {
        Self::new(display.rank_columns.iter().map(|c| c.rank.clone()))
    }

    /// Number of rank columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Mapped column of a rank.
    pub fn mapped(&self, rank: Option<&str>) -> Option<usize> {
        rank.and_then(|r| self.index.get(r).copied())
    }

    /// Column of a rank; unmapped ranks land in the last column.
    pub fn column_of(&self, rank: Option<&str>) -> usize {
        self.mapped(rank).unwrap_or(self.last())
    }

    fn last(&self) -> usize {
        self.width.saturating_sub(1)
    }
}

/// Placement of one node's cell in the chart grid.
#[derive(Debug, Clone, Copy)]
pub struct LeafPathEntry<'a> {
    /// The node drawn in this cell.
    pub node: &'a TreeNode,
    /// First column.
    pub col: usize,
    /// Columns covered.
    pub colspan: usize,
    /// Rows covered (the node's leaf count).
    pub rowspan: usize,
}

impl LeafPathEntry<'_> {
    /// One past the last column covered.
    pub fn end_col(&self) -> usize {
        self.col + self.colspan
    }
}

/// Flatten a forest into chart rows, one per leaf.
///
/// Each row lists the cells that start on it: the leaf itself plus every
/// ancestor whose first leaf this is. Drawing each cell with its
/// `rowspan`/`colspan` yields a merged-cell grid where every child sits
/// directly right of its parent and every leaf reaches the last column.
pub fn collect_leaf_rows<'a>(
    roots: &'a [TreeNode],
    columns: &RankColumns,
    rank_key: &str,
) -> Vec<Vec<LeafPathEntry<'a>>> {
    let mut rows = Vec::new();
    if columns.width() == 0 {
        return rows;
    }
    for root in roots {
        collect(root, Vec::new(), &mut rows, 0, columns, rank_key);
    }
    rows
}

fn rank_of<'n>(node: &'n TreeNode, rank_key: &str) -> Option<&'n str> {
    match node.get(rank_key) {
        Some(Value::String(rank)) => Some(rank),
        _ => None,
    }
}

fn collect<'a>(
    node: &'a TreeNode,
    mut path: Vec<LeafPathEntry<'a>>,
    rows: &mut Vec<Vec<LeafPathEntry<'a>>>,
    parent_end: usize,
    columns: &RankColumns,
    rank_key: &str,
) {
    let max_col = columns.last();
    let mut col = columns.column_of(rank_of(node, rank_key));

    // Bridge rank gaps between this node and its shallowest child.
    let mut colspan = 1;
    let child_cols: Vec<usize> = node
        .children
        .iter()
        .filter_map(|c| columns.mapped(rank_of(c, rank_key)))
        .collect();
    if !child_cols.is_empty() && !child_cols.contains(&(col + 1)) {
        if let Some(&min_child) = child_cols.iter().min() {
            if min_child > col + 1 {
                colspan = min_child - col;
            }
        }
    }

    // Pull back next to the parent when the natural column leaves a gap.
    if col > parent_end {
        let end = col + colspan;
        col = parent_end;
        colspan = end - col;
    }

    if node.is_leaf() && col + colspan - 1 < max_col {
        colspan = max_col - col + 1;
    }

    let entry = LeafPathEntry {
        node,
        col,
        colspan,
        rowspan: node.leaf_count,
    };
    path.push(entry);

    if node.is_leaf() {
        rows.push(path);
        return;
    }
    let end = entry.end_col();
    let mut inherited = Some(path);
    for child in &node.children {
        let child_path = inherited.take().unwrap_or_default();
        collect(child, child_path, rows, end, columns, rank_key);
    }
}

/// A covered grid cell: which entry occupies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    /// Leaf row where the entry was emitted.
    pub row: usize,
    /// Position of the entry within that row.
    pub entry: usize,
}

/// Cell coverage of a set of chart rows.
#[derive(Debug, Clone, Default)]
pub struct SpanGrid {
    /// `cells[row][col]`: the entry covering the cell, if any.
    pub cells: Vec<Vec<Option<GridCell>>>,
    /// Number of cells claimed by more than one entry.
    pub overlaps: usize,
}

impl SpanGrid {
    /// Cells no entry covers.
    pub fn gaps(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.is_none())
            .count()
    }
}

/// Expand rowspans and colspans into a `rows x width` coverage grid.
pub fn span_grid(rows: &[Vec<LeafPathEntry<'_>>], width: usize) -> SpanGrid {
    let mut grid = SpanGrid {
        cells: vec![vec![None; width]; rows.len()],
        overlaps: 0,
    };
    for (r, row) in rows.iter().enumerate() {
        for (e, entry) in row.iter().enumerate() {
            for rr in r..(r + entry.rowspan).min(rows.len()) {
                for cc in entry.col..entry.end_col().min(width) {
                    let cell = &mut grid.cells[rr][cc];
                    if cell.is_some() {
                        grid.overlaps += 1;
                    }
                    *cell = Some(GridCell { row: r, entry: e });
                }
            }
        }
    }
    grid
}

/// Whether a `#rgb` / `#rrggbb` colour is light enough for dark text.
/// Missing or unparseable colours count as light.
pub fn is_light_color(hex: Option<&str>) -> bool {
    let Some(hex) = hex.map(|h| h.trim_start_matches('#')).filter(|h| !h.is_empty()) else {
        return true;
    };
    let expanded: String = if hex.len() == 3 {
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_string()
    };
    let channel = |i: usize| {
        expanded
            .get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(f64::from)
    };
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => (0.299 * r + 0.587 * g + 0.114 * b) / 255.0 > 0.5,
        _ => true,
    }
}

/// Hover text of a chart cell: `"name (start–end Ma)"`, or just the name
/// when the node has no value.
pub fn cell_tooltip(node: &TreeNode, label_key: &str, value_key: &str) -> String {
    let name = node.text(label_key);
    match node.get(value_key).filter(|v| !v.is_null()) {
        Some(start) => {
            let end = node
                .get("end_mya")
                .filter(|v| !v.is_null())
                .map(display_value)
                .unwrap_or_else(|| "0".to_string());
            format!("{} ({}–{} Ma)", name, display_value(start), end)
        },
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;
    use crate::hierarchy::build_hierarchy;
    use crate::manifest::{HierarchyOptions, SortBy};
    use proptest::prelude::*;
    use serde_json::json;

    fn options() -> HierarchyOptions {
        HierarchyOptions {
            sort_by: SortBy::OrderKey,
            order_key: "id".to_string(),
            ..HierarchyOptions::default()
        }
    }

    fn to_rows(value: Value) -> Vec<Row> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect()
    }

    fn ics() -> RankColumns {
        RankColumns::new(["Eon", "Era", "Period", "Sub-Period", "Epoch", "Age"])
    }

    fn spans(rows: &[Vec<LeafPathEntry<'_>>]) -> Vec<Vec<(String, usize, usize, usize)>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|e| (e.node.text("name"), e.col, e.colspan, e.rowspan))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn repeated_rank_keeps_first_column_and_widens() {
        let columns = RankColumns::new(["Era", "Period", "Era"]);
        assert_eq!(columns.width(), 3);
        assert_eq!(columns.mapped(Some("Era")), Some(0));
        assert_eq!(columns.mapped(Some("Period")), Some(1));
    }

    #[test]
    fn age_directly_under_period_bridges_and_leaf_extends() {
        let data = to_rows(json!([
            {"id": 1, "name": "Phanerozoic", "rank": "Eon"},
            {"id": 2, "name": "Paleozoic", "rank": "Era", "parent_id": 1},
            {"id": 3, "name": "Silurian", "rank": "Period", "parent_id": 2},
            {"id": 4, "name": "Pridoli", "rank": "Age", "parent_id": 3},
            {"id": 5, "name": "Ludlow", "rank": "Epoch", "parent_id": 3},
            {"id": 6, "name": "Ludfordian", "rank": "Age", "parent_id": 5}
        ]));
        let forest = build_hierarchy(&data, &options());
        let rows = collect_leaf_rows(&forest, &ics(), "rank");

        assert_eq!(
            spans(&rows),
            vec![
                vec![
                    ("Phanerozoic".to_string(), 0, 1, 2),
                    ("Paleozoic".to_string(), 1, 1, 2),
                    ("Silurian".to_string(), 2, 2, 2),
                    ("Pridoli".to_string(), 4, 2, 1),
                ],
                vec![
                    ("Ludlow".to_string(), 4, 1, 1),
                    ("Ludfordian".to_string(), 5, 1, 1),
                ],
            ]
        );
        let grid = span_grid(&rows, 6);
        assert_eq!((grid.gaps(), grid.overlaps), (0, 0));
    }

    #[test]
    fn unmapped_root_is_pulled_back_to_first_column() {
        let data = to_rows(json!([{"id": 1, "name": "Lonely", "rank": "Zone"}]));
        let forest = build_hierarchy(&data, &options());
        let rows = collect_leaf_rows(&forest, &ics(), "rank");
        assert_eq!(spans(&rows), vec![vec![("Lonely".to_string(), 0, 6, 1)]]);
    }

    #[test]
    fn no_columns_means_no_rows() {
        let data = to_rows(json!([{"id": 1, "name": "x", "rank": "Eon"}]));
        let forest = build_hierarchy(&data, &options());
        assert!(collect_leaf_rows(&forest, &RankColumns::new(Vec::<String>::new()), "rank").is_empty());
    }

    #[test]
    fn colour_luminance() {
        assert!(is_light_color(None));
        assert!(is_light_color(Some("#FFF")));
        assert!(!is_light_color(Some("#000000")));
        assert!(is_light_color(Some("#9AD9DD")));
        assert!(!is_light_color(Some("#333")));
        assert!(is_light_color(Some("not-a-colour")));
    }

    #[test]
    fn tooltip_shows_age_range() {
        let data = to_rows(json!([{"id": 1, "name": "Cambrian", "start_mya": 538.8, "end_mya": 486.85}]));
        let forest = build_hierarchy(&data, &options());
        assert_eq!(
            cell_tooltip(&forest[0], "name", "start_mya"),
            "Cambrian (538.8–486.85 Ma)"
        );
        let data = to_rows(json!([{"id": 1, "name": "Undated"}]));
        let forest = build_hierarchy(&data, &options());
        assert_eq!(cell_tooltip(&forest[0], "name", "start_mya"), "Undated");
    }

    /// Random forests where every child's column lies right of its parent's.
    fn charts() -> impl Strategy<Value = (Vec<Row>, usize)> {
        (2usize..7).prop_flat_map(|width| {
            let node = (any::<prop::sample::Index>(), any::<bool>(), any::<prop::sample::Index>());
            (prop::collection::vec(node, 1..30), Just(width))
        })
        .prop_map(|(specs, width)| {
            let mut cols: Vec<usize> = Vec::new();
            let mut rows = Vec::new();
            for (i, (parent, has_parent, offset)) in specs.into_iter().enumerate() {
                let candidates: Vec<usize> = (0..i).filter(|&p| cols[p] + 1 < width).collect();
                let parent = (has_parent && !candidates.is_empty())
                    .then(|| candidates[parent.index(candidates.len())]);
                let lowest = parent.map_or(0, |p| cols[p] + 1);
                let col = lowest + offset.index(width - lowest);
                cols.push(col);
                let parent_id = parent.map_or(Value::Null, |p| json!(p + 1));
                rows.push(
                    json!({"id": i + 1, "name": format!("n{i}"), "rank": format!("R{col}"), "parent_id": parent_id})
                        .as_object()
                        .cloned()
                        .unwrap(),
                );
            }
            (rows, width)
        })
    }

    proptest! {
        #[test]
        fn chart_rows_tile_the_grid((data, width) in charts()) {
            let forest = build_hierarchy(&data, &options());
            let columns = RankColumns::new((0..width).map(|c| format!("R{c}")));
            let rows = collect_leaf_rows(&forest, &columns, "rank");

            let leaves: usize = forest.iter().map(|r| r.leaf_count).sum();
            prop_assert_eq!(rows.len(), leaves);

            let grid = span_grid(&rows, width);
            prop_assert_eq!(grid.overlaps, 0);
            prop_assert_eq!(grid.gaps(), 0);

            for row in &rows {
                for pair in row.windows(2) {
                    prop_assert_eq!(pair[0].end_col(), pair[1].col);
                }
                prop_assert_eq!(row.last().map(|e| e.end_col()), Some(width));
            }
        }
    }
}
