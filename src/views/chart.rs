//! Nested-table chart: a hierarchy drawn as merged cells, one row per leaf.

use crate::data::{display_value, EntityId, Row};
use crate::format::LinkTarget;
use crate::hierarchy::{
    build_hierarchy, cell_tooltip, collect_leaf_rows, is_light_color, span_grid, GridCell,
    LeafPathEntry, RankColumns,
};
use crate::manifest::{HierarchyOptions, NestedTableDisplay};

/// One merged cell, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartCell {
    /// Node label.
    pub label: String,
    /// First column.
    pub col: usize,
    /// Columns covered.
    pub colspan: usize,
    /// Leaf rows covered.
    pub rowspan: usize,
    /// Background colour, as given by the data.
    pub color: Option<String>,
    /// Whether the background is light (dark text) or dark (light text).
    pub light: bool,
    /// Hover text.
    pub tooltip: String,
    /// Detail link of the cell.
    pub target: Option<LinkTarget>,
}

/// A laid-out chart with a cell cursor.
#[derive(Debug, Clone)]
pub struct ChartView {
    headers: Vec<String>,
    rows: Vec<Vec<ChartCell>>,
    values: Vec<String>,
    coverage: Vec<Vec<Option<GridCell>>>,
    width: usize,
    cursor: (usize, usize),
}

impl ChartView {
    /// Build the chart of a nested-table view from its query rows.
    pub fn new(rows: &[Row], hierarchy: &HierarchyOptions, display: &NestedTableDisplay) -> Self {
        let forest = build_hierarchy(rows, hierarchy);
        let columns = RankColumns::from_display(display);
        let leaf_rows = collect_leaf_rows(&forest, &columns, &hierarchy.rank_key);
        let grid = span_grid(&leaf_rows, columns.width());

        let cell = |entry: &LeafPathEntry<'_>| {
            let node = entry.node;
            let color = node
                .get(&display.color_key)
                .map(display_value)
                .filter(|c| !c.is_empty());
            let target = display.cell_click.as_ref().and_then(|click| {
                let view = click.detail_view.as_deref()?;
                let id: EntityId = node.id(&click.id_key).or_else(|| node.id(&hierarchy.id_key))?;
                LinkTarget::new(view, id)
            });
            ChartCell {
                label: node.text(&hierarchy.label_key),
                col: entry.col,
                colspan: entry.colspan,
                rowspan: entry.rowspan,
                light: is_light_color(color.as_deref()),
                color,
                tooltip: cell_tooltip(node, &hierarchy.label_key, &display.value_column.key),
                target,
            }
        };

        let values = leaf_rows
            .iter()
            .map(|row| {
                row.last()
                    .and_then(|leaf| leaf.node.get(&display.value_column.key))
                    .map(display_value)
                    .unwrap_or_default()
            })
            .collect();

        let mut headers: Vec<String> = display
            .rank_columns
            .iter()
            .map(|c| c.header().to_string())
            .collect();
        headers.push(display.value_column.label.clone());

        Self {
            headers,
            rows: leaf_rows.iter().map(|row| row.iter().map(&cell).collect()).collect(),
            values,
            coverage: grid.cells,
            width: columns.width(),
            cursor: (0, 0),
        }
    }

    /// Column headers: rank columns then the value column.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Cells starting on each leaf row.
    pub fn rows(&self) -> &[Vec<ChartCell>] {
        &self.rows
    }

    /// Value column text of a leaf row.
    pub fn value(&self, row: usize) -> &str {
        self.values.get(row).map_or("", String::as_str)
    }

    /// Number of rank columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of leaf rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the chart has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The cell covering grid position `(row, col)`.
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&ChartCell> {
        let GridCell { row: r, entry } = (*self.coverage.get(row)?.get(col)?)?;
        self.rows.get(r)?.get(entry)
    }

    /// Cursor as `(row, col)`.
    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    /// Cell under the cursor.
    pub fn current_cell(&self) -> Option<&ChartCell> {
        self.cell_at(self.cursor.0, self.cursor.1)
    }

    /// Move down by `delta` leaf rows, skipping past the rest of a tall cell.
    pub fn move_rows(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let (row, col) = self.cursor;
        let max = self.rows.len() as isize - 1;
        let next = match (delta > 0, self.anchor(row, col)) {
            (true, Some((start, span))) => (start + span) as isize + delta - 1,
            (false, Some((start, _))) => start as isize + delta,
            _ => row as isize + delta,
        };
        self.cursor.0 = next.clamp(0, max) as usize;
    }

    /// Move across by `delta` cells.
    pub fn move_cols(&mut self, delta: isize) {
        if self.width == 0 {
            return;
        }
        let (row, col) = self.cursor;
        let span = self.current_cell().map(|c| (c.col, c.colspan));
        let next = match (delta > 0, span) {
            (true, Some((start, width))) => (start + width) as isize + delta - 1,
            (false, Some((start, _))) => start as isize + delta,
            _ => col as isize + delta,
        };
        let next = next.clamp(0, self.width as isize - 1) as usize;
        if self.cell_at(row, next).is_some() {
            self.cursor.1 = next;
        }
    }

    fn anchor(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        let GridCell { row: start, entry } = (*self.coverage.get(row)?.get(col)?)?;
        Some((start, self.rows.get(start)?.get(entry)?.rowspan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ClickTarget, SortBy};
    use serde_json::json;

    fn chart() -> ChartView {
        let rows: Vec<Row> = serde_json::from_value(json!([
            {"id": 1, "name": "Phanerozoic", "rank": "Eon", "parent_id": null, "color": "#9AD9DD", "start_mya": 538.8},
            {"id": 2, "name": "Paleozoic", "rank": "Era", "parent_id": 1, "color": "#99C08D", "start_mya": 538.8},
            {"id": 3, "name": "Silurian", "rank": "Period", "parent_id": 2, "color": "#B3E1B6", "start_mya": 443.8},
            {"id": 4, "name": "Pridoli", "rank": "Epoch", "parent_id": 3, "color": "#E6F5E1", "start_mya": 423.0, "end_mya": 419.2},
            {"id": 5, "name": "Ludlow", "rank": "Epoch", "parent_id": 3, "color": "#BFE6CF", "start_mya": 427.4},
            {"id": 6, "name": "Ludfordian", "rank": "Age", "parent_id": 5, "color": "#D9F0DF", "start_mya": 425.6}
        ]))
        .unwrap();
        let hierarchy = HierarchyOptions {
            sort_by: SortBy::OrderKey,
            order_key: "id".to_string(),
            ..HierarchyOptions::default()
        };
        let display = NestedTableDisplay {
            cell_click: Some(ClickTarget {
                detail_view: Some("chronostrat_detail".to_string()),
                id_key: "id".to_string(),
            }),
            ..NestedTableDisplay::default()
        };
        ChartView::new(&rows, &hierarchy, &display)
    }

    #[test]
    fn headers_end_with_the_value_column() {
        let chart = chart();
        assert_eq!(chart.headers().len(), 7);
        assert_eq!(chart.headers()[2], "System / Period");
        assert_eq!(chart.headers()[6], "Age (Ma)");
    }

    #[test]
    fn leaves_reach_the_last_column_and_carry_values() {
        let chart = chart();
        assert_eq!(chart.len(), 2);
        let pridoli = chart.rows()[0].last().unwrap();
        assert_eq!(pridoli.label, "Pridoli");
        assert_eq!((pridoli.col, pridoli.colspan), (4, 2));
        assert_eq!(pridoli.tooltip, "Pridoli (423–419.2 Ma)");
        assert_eq!(chart.value(0), "423");
        assert_eq!(chart.value(1), "425.6");

        let silurian = chart.cell_at(1, 2).unwrap();
        assert_eq!(silurian.label, "Silurian");
        assert_eq!(silurian.rowspan, 2);
        assert!(silurian.light);
        assert_eq!(
            silurian.target.as_ref().map(|t| t.id.clone()),
            Some(EntityId::from(3))
        );
    }

    #[test]
    fn cursor_moves_over_merged_cells() {
        let mut chart = chart();
        assert_eq!(chart.current_cell().unwrap().label, "Phanerozoic");
        chart.move_cols(1);
        assert_eq!(chart.current_cell().unwrap().label, "Paleozoic");
        chart.move_cols(1);
        assert_eq!(chart.current_cell().unwrap().label, "Silurian");
        chart.move_cols(1);
        assert_eq!(chart.current_cell().unwrap().label, "Pridoli");
        chart.move_cols(1);
        assert_eq!(chart.current_cell().unwrap().label, "Pridoli");
        chart.move_rows(1);
        assert_eq!(chart.current_cell().unwrap().label, "Ludfordian");
        chart.move_cols(-1);
        assert_eq!(chart.current_cell().unwrap().label, "Ludlow");
        chart.move_rows(-1);
        assert_eq!(chart.current_cell().unwrap().label, "Pridoli");
    }
}
