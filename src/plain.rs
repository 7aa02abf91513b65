//! Plain-text rendering for headless output and the clipboard.

use crate::format::{Fragment, FormattedValue, LinkedTable, RenderedSection};
use crate::hierarchy::TreeNode;
use crate::search::SearchResults;
use crate::session::{DetailState, DetailView, Session, ViewContent};
use crate::source::AnnotationList;
use crate::views::{ChartView, ItemState, TableView, TreeBrowser};
use unicode_width::UnicodeWidthStr;

/// Plain text of a formatted value. Colour chips keep their code, links
/// their label.
pub fn value_text(value: &FormattedValue) -> String {
    value
        .0
        .iter()
        .map(|fragment| match fragment {
            Fragment::Badge(text) => format!("[{text}]"),
            Fragment::ColorChip(code) => format!("■ {code}"),
            other => other.plain().to_string(),
        })
        .collect()
}

fn pad(text: &str, width: usize) -> String {
    let w = text.width();
    format!("{}{}", text, " ".repeat(width.saturating_sub(w)))
}

/// Columns aligned by display width, with a rule under the header.
pub fn aligned_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = headers
        .len()
        .max(rows.iter().map(Vec::len).max().unwrap_or(0));
    let mut widths = vec![0; columns];
    for row in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let line = |row: &[String]| {
        let cells: Vec<String> = (0..columns)
            .map(|i| pad(row.get(i).map_or("", String::as_str), widths[i]))
            .collect();
        format!("{}\n", cells.join("  ").trim_end())
    };

    let mut text = line(headers);
    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    text.push_str(&format!("{}\n", rule.join("  ")));
    for row in rows {
        text.push_str(&line(row));
    }
    text
}

/// Outline of a whole hierarchy, expanded or not.
pub fn tree_outline(tree: &TreeBrowser) -> String {
    fn walk(tree: &TreeBrowser, node: &TreeNode, prefix: &str, is_last: bool, out: &mut String) {
        let connector = if is_last { "└── " } else { "├── " };
        let rank = tree.node_rank(node);
        let label = tree.node_label(node);
        if rank.is_empty() {
            out.push_str(&format!("{prefix}{connector}{label}\n"));
        } else {
            out.push_str(&format!("{prefix}{connector}{label} [{rank}]\n"));
        }
        let child_prefix = format!("{}{}   ", prefix, if is_last { " " } else { "│" });
        for (i, child) in node.children.iter().enumerate() {
            walk(tree, child, &child_prefix, i + 1 == node.children.len(), out);
        }
    }

    let mut text = String::new();
    let roots = tree.roots();
    for (i, root) in roots.iter().enumerate() {
        walk(tree, root, "", i + 1 == roots.len(), &mut text);
    }
    text
}

/// Item list of the selected tree leaf.
pub fn item_list_text(tree: &TreeBrowser) -> String {
    let Some(list) = tree.item_list() else {
        return String::new();
    };
    let mut text = format!("{}\n", list.leaf.name);
    match &list.state {
        ItemState::Loading => text.push_str("Loading...\n"),
        ItemState::Failed(message) => text.push_str(&format!("{message}\n")),
        ItemState::Loaded(_) => {
            text.push_str(&format!("{}\n", tree.item_stats()));
            let shown = tree.shown_items();
            if !shown.is_empty() {
                let headers: Vec<String> = tree
                    .item_columns()
                    .iter()
                    .map(|c| c.header().to_string())
                    .collect();
                let rows: Vec<Vec<String>> = shown
                    .iter()
                    .map(|row| tree.item_cells(row).iter().map(value_text).collect())
                    .collect();
                text.push_str(&aligned_table(&headers, &rows));
            }
        },
    }
    text
}

/// A table view with its counter line.
pub fn table_text(table: &TableView) -> String {
    let mut text = format!("{}\n", table.stats());
    let headers: Vec<String> = table.columns().iter().map(|c| table.header(c)).collect();
    let rows: Vec<Vec<String>> = table
        .visible_rows()
        .map(|row| table.cells(row).iter().map(value_text).collect())
        .collect();
    text.push_str(&aligned_table(&headers, &rows));
    if table.is_empty() {
        text.push_str(&format!("{}\n", table.empty_message()));
    }
    text
}

/// A chart as a grid: each merged cell is labelled once, on its first row
/// and column.
pub fn chart_text(chart: &ChartView) -> String {
    let width = chart.width();
    let rows: Vec<Vec<String>> = chart
        .rows()
        .iter()
        .enumerate()
        .map(|(r, cells)| {
            let mut line = vec![String::new(); width + 1];
            for cell in cells {
                if let Some(slot) = line.get_mut(cell.col) {
                    *slot = cell.label.clone();
                }
            }
            line[width] = chart.value(r).to_string();
            line
        })
        .collect();
    aligned_table(chart.headers(), &rows)
}

/// The active view's content.
pub fn view_text(content: &ViewContent) -> String {
    match content {
        ViewContent::Tree(tree) => {
            let mut text = tree_outline(tree);
            let items = item_list_text(tree);
            if !items.is_empty() {
                text.push('\n');
                text.push_str(&items);
            }
            text
        },
        ViewContent::Table(table) => table_text(table),
        ViewContent::Chart(chart) => chart_text(chart),
        ViewContent::Error(message) => format!("{message}\n"),
    }
}

fn linked_table_text(table: &LinkedTable) -> String {
    if table.rows.is_empty() {
        return format!("{}\n", table.empty_message.as_deref().unwrap_or_default());
    }
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.cells.iter().map(value_text).collect())
        .collect();
    aligned_table(&table.headers, &rows)
}

fn annotations_text(list: Option<&AnnotationList>) -> String {
    match list {
        None | Some(AnnotationList::Loading) => "Loading...\n".to_string(),
        Some(AnnotationList::Failed(message)) => format!("{message}\n"),
        Some(AnnotationList::Loaded(items)) if items.is_empty() => "No notes yet.\n".to_string(),
        Some(AnnotationList::Loaded(items)) => items
            .iter()
            .map(|a| {
                let by = a.author.as_deref().map(|who| format!(" by {who}")).unwrap_or_default();
                let at = a.created_at.as_deref().map(|t| format!(" ({t})")).unwrap_or_default();
                format!("[{}] {}{}{}\n", a.annotation_type, a.content, by, at)
            })
            .collect(),
    }
}

/// One section of a shown detail.
pub fn section_text(section: &RenderedSection, detail: &DetailView) -> String {
    let mut text = String::new();
    if let Some(title) = section.title() {
        text.push_str(&format!("{title}\n{}\n", "-".repeat(title.width())));
    }
    match section {
        RenderedSection::FieldGrid { rows, .. } => {
            let width = rows.iter().map(|r| r.label.width()).max().unwrap_or(0);
            for row in rows {
                text.push_str(&format!("{}  {}\n", pad(&row.label, width), value_text(&row.value)));
            }
        },
        RenderedSection::LinkedTable(table) => text.push_str(&linked_table_text(table)),
        RenderedSection::TaggedList { items, .. } => {
            for item in items {
                text.push_str(&format!("[{}] {}\n", item.badge, item.text));
            }
        },
        RenderedSection::RawText { text: body, .. } => {
            text.push_str(body);
            text.push('\n');
        },
        RenderedSection::Annotations {
            entity_type,
            entity_id,
            ..
        } => text.push_str(&annotations_text(detail.annotations(entity_type, entity_id))),
    }
    text
}

/// A detail pane: title, rule, then each section separated by a blank line.
pub fn detail_text(state: &DetailState) -> String {
    match state {
        DetailState::Closed => String::new(),
        DetailState::Loading { .. } => "Loading...\n".to_string(),
        DetailState::Error(message) => format!("{message}\n"),
        DetailState::Shown(detail) => {
            let title = &detail.rendered.title;
            let mut text = format!("{title}\n{}\n", "=".repeat(title.width().max(1)));
            for section in &detail.rendered.sections {
                text.push('\n');
                text.push_str(&section_text(section, detail));
            }
            text
        },
    }
}

/// What the user is looking at: the open detail, else the active view.
/// Returns a short label for it with the text.
pub fn session_text(session: &Session) -> Option<(&'static str, String)> {
    if session.detail().is_open() {
        return Some(("Detail", detail_text(session.detail())));
    }
    session.view().content().map(|content| ("View", view_text(content)))
}

/// Search results grouped by category.
pub fn search_text(results: &SearchResults, meta_max: usize) -> String {
    if results.is_empty() {
        return "No results found\n".to_string();
    }
    let mut text = String::new();
    for group in &results.groups {
        text.push_str(&format!("{} ({})\n", group.category.label, group.total));
        for &entry in &group.shown {
            let meta = results.meta_text(entry, meta_max);
            let line = results.display_text(entry);
            if meta.is_empty() {
                text.push_str(&format!("  {line}\n"));
            } else {
                text.push_str(&format!("  {line}  {meta}\n"));
            }
        }
        if group.more() > 0 {
            text.push_str(&format!("  +{} more\n", group.more()));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::data::Row;
    use crate::hierarchy::build_hierarchy;
    use crate::manifest::{HierarchyOptions, Manifest, TreeDisplay};
    use crate::search::{build_search_categories, perform_search, IndexState, SearchIndex, SearchOutcome};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn tables_align_by_display_width() {
        let text = aligned_table(
            &["Name".to_string(), "Age".to_string()],
            &[
                vec!["Ordovician".to_string(), "485.4".to_string()],
                vec!["Gzhelian".to_string(), "303.7".to_string()],
            ],
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name        Age");
        assert_eq!(lines[2], "Ordovician  485.4");
        assert_eq!(lines[3], "Gzhelian    303.7");
    }

    #[test]
    fn tree_outline_draws_every_node() {
        let rows: Vec<Row> = serde_json::from_value(json!([
            {"id": 1, "name": "A", "rank": "Order", "parent_id": null},
            {"id": 2, "name": "B", "rank": "Family", "parent_id": 1},
            {"id": 3, "name": "C", "rank": "Family", "parent_id": 1}
        ]))
        .unwrap();
        let options = HierarchyOptions::default();
        let tree = TreeBrowser::new(build_hierarchy(&rows, &options), options, TreeDisplay::default());
        assert_eq!(
            tree_outline(&tree),
            "└── A [Order]\n    ├── B [Family]\n    └── C [Family]\n"
        );
    }

    #[test]
    fn table_text_reports_empty_filter() {
        let manifest = Manifest::from_value(json!({"views": {"t": {
            "type": "table", "source_query": "q", "searchable": true,
            "columns": [{"key": "name", "label": "Name", "searchable": true}]
        }}}))
        .unwrap();
        let rows: Vec<Row> = serde_json::from_value(json!([{"name": "Olenus"}])).unwrap();
        let mut table = TableView::new(manifest.view("t").unwrap(), Arc::new(rows));
        assert!(table_text(&table).starts_with("1 of 1 records\n"));
        table.set_filter("zzz");
        assert!(table_text(&table).ends_with("No matching records\n"));
    }

    #[test]
    fn search_text_lists_groups_and_more() {
        let manifest = Manifest::from_value(json!({"views": {"genera": {
            "type": "table", "title": "Genera", "source_query": "genera",
            "columns": [{"key": "name"}, {"key": "author"}]
        }}}))
        .unwrap();
        let categories = build_search_categories(&manifest, 1);
        let rows: Vec<Row> = serde_json::from_value(json!([
            {"name": "Apple", "author": "Smith"},
            {"name": "Application"}
        ]))
        .unwrap();
        let mut index = SearchIndex::default();
        index.insert(&categories[0], &rows);
        let SearchOutcome::Results(results) =
            perform_search("app", &categories, &IndexState::Ready(index), &SearchConfig::default())
        else {
            panic!("results expected");
        };
        assert_eq!(search_text(&results, 60), "Genera (2)\n  Apple  Smith\n  +1 more\n");
    }
}
