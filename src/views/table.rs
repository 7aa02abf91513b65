//! Sortable, filterable table view.

use super::{click_target, format_cell};
use crate::data::{compare_values, display_value, is_truthy, Row};
use crate::format::{FormattedValue, LinkTarget};
use crate::manifest::{ColumnDef, SortDirection, SortSpec, ViewDef};
use std::sync::Arc;

/// Rows of a table view with the current filter, sort and cursor.
///
/// The rows themselves are shared with the query cache; only the order of
/// visible indices changes when sorting or filtering.
#[derive(Debug, Clone)]
pub struct TableView {
    columns: Vec<ColumnDef>,
    searchable: bool,
    on_row_click: Option<crate::manifest::ClickTarget>,
    rows: Arc<Vec<Row>>,
    sort: Option<SortSpec>,
    filter: String,
    visible: Vec<usize>,
    cursor: usize,
    sort_column: usize,
}

impl TableView {
    /// Build the table of a view over its query rows, applying the default sort.
    pub fn new(view: &ViewDef, rows: Arc<Vec<Row>>) -> Self {
        let mut table = Self {
            columns: view.columns.clone(),
            searchable: view.searchable,
            on_row_click: view.on_row_click.clone(),
            rows,
            sort: view.default_sort.clone(),
            filter: String::new(),
            visible: Vec::new(),
            cursor: 0,
            sort_column: 0,
        };
        if let Some(i) = table
            .sort
            .as_ref()
            .and_then(|s| table.columns.iter().position(|c| c.key == s.key))
        {
            table.sort_column = i;
        }
        table.refresh();
        table
    }

    fn refresh(&mut self) {
        let term = self.filter.to_lowercase();
        let searchable: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| c.searchable)
            .map(|c| c.key.as_str())
            .collect();
        let mut visible: Vec<usize> = (0..self.rows.len())
            .filter(|&i| {
                term.is_empty()
                    || searchable.iter().any(|key| {
                        self.rows[i].get(*key).is_some_and(|v| {
                            is_truthy(v) && display_value(v).to_lowercase().contains(&term)
                        })
                    })
            })
            .collect();
        if let Some(sort) = &self.sort {
            let rows = &self.rows;
            visible.sort_by(|&a, &b| {
                let ord = compare_values(rows[a].get(&sort.key), rows[b].get(&sort.key));
                match sort.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        self.visible = visible;
        self.cursor = self.cursor.min(self.visible.len().saturating_sub(1));
    }

    /// Column definitions.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Whether the view offers a filter box.
    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    /// Current filter text.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Replace the filter text.
    pub fn set_filter(&mut self, filter: &str) {
        if self.searchable {
            self.filter = filter.to_string();
            self.cursor = 0;
            self.refresh();
        }
    }

    /// Current sort.
    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// Sort by `key`: ascending on a new column, flipping on the current one.
    /// Columns that are not sortable are ignored.
    pub fn toggle_sort(&mut self, key: &str) {
        if !self.columns.iter().any(|c| c.key == key && c.sortable) {
            return;
        }
        self.sort = Some(match self.sort.take() {
            Some(current) if current.key == key => SortSpec {
                direction: current.direction.flip(),
                ..current
            },
            _ => SortSpec {
                key: key.to_string(),
                direction: SortDirection::Asc,
            },
        });
        self.refresh();
    }

    /// Column the sort keys act on.
    pub fn sort_column(&self) -> usize {
        self.sort_column
    }

    /// Move the sort column selection to the next sortable column.
    pub fn next_sort_column(&mut self, delta: isize) {
        let sortable: Vec<usize> = (0..self.columns.len())
            .filter(|&i| self.columns[i].sortable)
            .collect();
        if sortable.is_empty() {
            return;
        }
        let pos = sortable.iter().position(|&i| i == self.sort_column).unwrap_or(0) as isize;
        let len = sortable.len() as isize;
        self.sort_column = sortable[(pos + delta).rem_euclid(len) as usize];
    }

    /// Sort by the selected sort column.
    pub fn toggle_selected_sort(&mut self) {
        if let Some(key) = self.columns.get(self.sort_column).map(|c| c.key.clone()) {
            self.toggle_sort(&key);
        }
    }

    /// Header of a column with its sort arrow.
    pub fn header(&self, column: &ColumnDef) -> String {
        match &self.sort {
            Some(sort) if sort.key == column.key => {
                let arrow = match sort.direction {
                    SortDirection::Asc => "▲",
                    SortDirection::Desc => "▼",
                };
                format!("{} {}", column.header(), arrow)
            },
            _ => column.header().to_string(),
        }
    }

    /// Visible rows in display order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.visible.iter().map(|&i| &self.rows[i])
    }

    /// Number of visible rows.
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    /// True when no row passes the filter.
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Number of rows before filtering.
    pub fn total(&self) -> usize {
        self.rows.len()
    }

    /// `"N of M records"`.
    pub fn stats(&self) -> String {
        format!("{} of {} records", self.len(), self.total())
    }

    /// Message shown in place of an empty table.
    pub fn empty_message(&self) -> &'static str {
        "No matching records"
    }

    /// Formatted cells of a row.
    pub fn cells(&self, row: &Row) -> Vec<FormattedValue> {
        self.columns.iter().map(|col| format_cell(col, row)).collect()
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor by `delta`, clamped to the visible rows.
    pub fn move_cursor(&mut self, delta: isize) {
        let max = self.visible.len().saturating_sub(1) as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, max) as usize;
    }

    /// Go to the first row.
    pub fn goto_first(&mut self) {
        self.cursor = 0;
    }

    /// Go to the last row.
    pub fn goto_last(&mut self) {
        self.cursor = self.visible.len().saturating_sub(1);
    }

    /// Row under the cursor.
    pub fn current_row(&self) -> Option<&Row> {
        self.visible.get(self.cursor).map(|&i| &self.rows[i])
    }

    /// Detail link of the row under the cursor.
    pub fn current_target(&self) -> Option<LinkTarget> {
        click_target(self.on_row_click.as_ref(), self.current_row()?)
    }
}
