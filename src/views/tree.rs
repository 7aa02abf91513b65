//! Tree browser state.
//!
//! The tree keeps a flat list of visible items. When nodes are expanded or
//! collapsed the list is rebuilt from the forest and the expanded set, so
//! the cursor always indexes into what is on screen.

use super::{click_target, format_cell};
use crate::data::{as_number, is_truthy, EntityId, Row};
use crate::format::{FormattedValue, LinkTarget};
use crate::hierarchy::TreeNode;
use crate::manifest::{ColumnDef, HierarchyOptions, TreeDisplay};
use std::collections::HashSet;

/// A single visible row of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    /// Child indices from the root list down to the node.
    pub path: Vec<usize>,
    /// Nesting level.
    pub level: usize,
    /// Whether this node is expanded.
    pub expanded: bool,
    /// Whether this node has children.
    pub has_children: bool,
}

/// The leaf whose items should be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafSelection {
    /// Leaf id, passed as the item query parameter.
    pub id: EntityId,
    /// Leaf label, for the list header.
    pub name: String,
}

/// Loading state of the item list.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemState {
    /// Query in flight.
    Loading,
    /// Items of the leaf.
    Loaded(Vec<Row>),
    /// The query failed.
    Failed(String),
}

/// Items of the selected leaf.
#[derive(Debug, Clone)]
pub struct ItemList {
    /// The leaf the items belong to.
    pub leaf: LeafSelection,
    /// Loading state.
    pub state: ItemState,
    cursor: usize,
}

/// Tree navigation state plus the item list of the selected leaf.
#[derive(Debug)]
pub struct TreeBrowser {
    roots: Vec<TreeNode>,
    hierarchy: HierarchyOptions,
    display: TreeDisplay,
    columns: Vec<ColumnDef>,
    items: Vec<TreeItem>,
    cursor: usize,
    expanded: HashSet<Vec<usize>>,
    scroll_offset: usize,
    selected: Option<Vec<usize>>,
    item_list: Option<ItemList>,
    valid_only: bool,
}

impl TreeBrowser {
    /// Create a browser over a built forest. Root nodes start expanded.
    pub fn new(roots: Vec<TreeNode>, hierarchy: HierarchyOptions, display: TreeDisplay) -> Self {
        let expanded = (0..roots.len())
            .filter(|&i| !roots[i].children.is_empty())
            .map(|i| vec![i])
            .collect();
        let valid_only = display
            .item_valid_filter
            .as_ref()
            .map_or(true, |filter| filter.default);
        let columns = display.columns();
        let mut browser = Self {
            roots,
            hierarchy,
            display,
            columns,
            items: Vec::new(),
            cursor: 0,
            expanded,
            scroll_offset: 0,
            selected: None,
            item_list: None,
            valid_only,
        };
        browser.rebuild_visible_items();
        browser
    }

    /// The forest.
    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    /// Hierarchy options the forest was built with.
    pub fn hierarchy(&self) -> &HierarchyOptions {
        &self.hierarchy
    }

    /// Display options.
    pub fn display(&self) -> &TreeDisplay {
        &self.display
    }

    fn rebuild_visible_items(&mut self) {
        let mut items = Vec::new();
        for (i, root) in self.roots.iter().enumerate() {
            self.add_visible_recursive(root, vec![i], &mut items);
        }
        self.items = items;
        self.cursor = self.cursor.min(self.items.len().saturating_sub(1));
    }

    fn add_visible_recursive(&self, node: &TreeNode, path: Vec<usize>, out: &mut Vec<TreeItem>) {
        let expanded = self.expanded.contains(&path);
        out.push(TreeItem {
            level: path.len() - 1,
            path: path.clone(),
            expanded,
            has_children: !node.children.is_empty(),
        });
        if expanded {
            for (i, child) in node.children.iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(i);
                self.add_visible_recursive(child, child_path, out);
            }
        }
    }

    /// Node at a path.
    pub fn node(&self, path: &[usize]) -> Option<&TreeNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get(*first)?;
        for &i in rest {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    /// All currently visible items.
    pub fn visible_items(&self) -> &[TreeItem] {
        &self.items
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Node under the cursor.
    pub fn current_node(&self) -> Option<&TreeNode> {
        self.items.get(self.cursor).and_then(|item| self.node(&item.path))
    }

    /// Move the cursor up one position.
    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move the cursor down one position.
    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.items.len() {
            self.cursor += 1;
        }
    }

    /// Go to the first item.
    pub fn goto_first(&mut self) {
        self.cursor = 0;
    }

    /// Go to the last visible item.
    pub fn goto_last(&mut self) {
        self.cursor = self.items.len().saturating_sub(1);
    }

    /// Adjust scroll to keep the cursor visible.
    pub fn adjust_scroll(&mut self, viewport_height: usize) {
        if viewport_height == 0 {
            return;
        }
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        }
        if self.cursor >= self.scroll_offset + viewport_height {
            self.scroll_offset = self.cursor + 1 - viewport_height;
        }
    }

    /// Current scroll offset.
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Expand the node under the cursor.
    pub fn expand_current(&mut self) {
        if let Some(item) = self.items.get(self.cursor) {
            if item.has_children && !item.expanded {
                self.expanded.insert(item.path.clone());
                self.rebuild_visible_items();
            }
        }
    }

    /// Collapse the node under the cursor, or move to its parent when it is
    /// already collapsed.
    pub fn collapse_current(&mut self) {
        let Some(item) = self.items.get(self.cursor) else {
            return;
        };
        if item.expanded {
            self.expanded.remove(&item.path);
            self.rebuild_visible_items();
        } else if item.path.len() > 1 {
            let parent = item.path[..item.path.len() - 1].to_vec();
            if let Some(i) = self.items.iter().position(|it| it.path == parent) {
                self.cursor = i;
            }
        }
    }

    /// Toggle the node under the cursor.
    pub fn toggle_current(&mut self) {
        match self.items.get(self.cursor).map(|item| item.expanded) {
            Some(true) => self.collapse_current(),
            Some(false) => self.expand_current(),
            None => {},
        }
    }

    /// Expand every node with children.
    pub fn expand_all(&mut self) {
        fn collect(node: &TreeNode, path: Vec<usize>, out: &mut HashSet<Vec<usize>>) {
            if node.children.is_empty() {
                return;
            }
            for (i, child) in node.children.iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(i);
                collect(child, child_path, out);
            }
            out.insert(path);
        }
        for (i, root) in self.roots.iter().enumerate() {
            collect(root, vec![i], &mut self.expanded);
        }
        self.rebuild_visible_items();
    }

    /// Collapse everything down to the root list.
    pub fn collapse_all(&mut self) {
        let current = self.items.get(self.cursor).map(|item| item.path[0]);
        self.expanded.clear();
        self.rebuild_visible_items();
        self.cursor = current.unwrap_or(0);
    }

    /// Expand the ancestors of the node with `id` and put the cursor on it.
    /// Returns false when no node has that id.
    pub fn goto_node(&mut self, id: &EntityId) -> bool {
        let Some(path) = self.find_path(id) else {
            return false;
        };
        for depth in 1..path.len() {
            self.expanded.insert(path[..depth].to_vec());
        }
        self.rebuild_visible_items();
        if let Some(i) = self.items.iter().position(|item| item.path == path) {
            self.cursor = i;
        }
        true
    }

    fn find_path(&self, id: &EntityId) -> Option<Vec<usize>> {
        fn walk(node: &TreeNode, path: &mut Vec<usize>, id: &EntityId, key: &str) -> bool {
            if node.id(key).as_ref() == Some(id) {
                return true;
            }
            for (i, child) in node.children.iter().enumerate() {
                path.push(i);
                if walk(child, path, id, key) {
                    return true;
                }
                path.pop();
            }
            false
        }
        for (i, root) in self.roots.iter().enumerate() {
            let mut path = vec![i];
            if walk(root, &mut path, id, &self.hierarchy.id_key) {
                return Some(path);
            }
        }
        None
    }

    /// Whether a node is a selectable leaf: its rank is the leaf rank, or,
    /// without a leaf rank, it has no children.
    pub fn is_leaf(&self, node: &TreeNode) -> bool {
        match &self.display.leaf_rank {
            Some(rank) => node.text(&self.hierarchy.rank_key) == *rank,
            None => node.is_leaf(),
        }
    }

    /// Node label, with the item count on leaves that have one.
    pub fn node_label(&self, node: &TreeNode) -> String {
        let label = node.text(&self.hierarchy.label_key);
        let count = self
            .display
            .count_key
            .as_ref()
            .filter(|_| self.is_leaf(node))
            .and_then(|key| node.get(key))
            .and_then(as_number)
            .filter(|n| *n > 0.0);
        match count {
            Some(n) => format!("{label} ({n})"),
            None => label,
        }
    }

    /// Rank of a node, for display.
    pub fn node_rank(&self, node: &TreeNode) -> String {
        node.text(&self.hierarchy.rank_key)
    }

    /// Detail link of a node.
    pub fn node_info_target(&self, node: &TreeNode) -> Option<LinkTarget> {
        let info = self.display.on_node_info.as_ref()?;
        let view = info.detail_view.as_deref()?;
        let id = node
            .id(&info.id_key)
            .or_else(|| node.id(&self.hierarchy.id_key))?;
        LinkTarget::new(view, id)
    }

    /// Whether a path is the selected leaf.
    pub fn is_selected(&self, path: &[usize]) -> bool {
        self.selected.as_deref() == Some(path)
    }

    /// Select the leaf under the cursor. Returns the selection when an
    /// item list should be loaded for it.
    pub fn select_current(&mut self) -> Option<LeafSelection> {
        let item = self.items.get(self.cursor)?;
        let path = item.path.clone();
        let node = self.node(&path)?;
        if !self.is_leaf(node) {
            return None;
        }
        let leaf = LeafSelection {
            id: node.id(&self.hierarchy.id_key)?,
            name: node.text(&self.hierarchy.label_key),
        };
        self.selected = Some(path);
        self.item_list = Some(ItemList {
            leaf: leaf.clone(),
            state: ItemState::Loading,
            cursor: 0,
        });
        Some(leaf)
    }

    /// Store the items of a leaf. Ignored when another leaf was selected
    /// in the meantime.
    pub fn set_items(&mut self, leaf: &EntityId, state: ItemState) {
        if let Some(list) = self.item_list.as_mut().filter(|l| l.leaf.id == *leaf) {
            list.state = state;
            list.cursor = 0;
        }
    }

    /// Item list of the selected leaf.
    pub fn item_list(&self) -> Option<&ItemList> {
        self.item_list.as_ref()
    }

    /// Item columns.
    pub fn item_columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    fn loaded_items(&self) -> &[Row] {
        match self.item_list.as_ref().map(|l| &l.state) {
            Some(ItemState::Loaded(rows)) => rows,
            _ => &[],
        }
    }

    fn filter_key(&self) -> Option<&str> {
        let filter = self.display.item_valid_filter.as_ref()?;
        let key = filter.key.as_str();
        self.loaded_items()
            .iter()
            .any(|row| row.contains_key(key))
            .then_some(key)
    }

    /// True when the valid-only filter applies to the loaded items.
    pub fn has_valid_filter(&self) -> bool {
        self.filter_key().is_some()
    }

    /// Label of the valid-only toggle.
    pub fn valid_filter_label(&self) -> &str {
        self.display
            .item_valid_filter
            .as_ref()
            .and_then(|f| f.label.as_deref())
            .unwrap_or("Valid only")
    }

    /// State of the valid-only toggle.
    pub fn valid_only(&self) -> bool {
        self.valid_only
    }

    /// Flip the valid-only toggle.
    pub fn toggle_valid_only(&mut self) {
        self.valid_only = !self.valid_only;
        if let Some(list) = self.item_list.as_mut() {
            list.cursor = 0;
        }
    }

    /// Whether an item counts as valid.
    pub fn is_valid_item(&self, row: &Row) -> bool {
        match self.filter_key() {
            Some(key) => row.get(key).is_some_and(is_truthy),
            None => true,
        }
    }

    /// Items shown under the current filter.
    pub fn shown_items(&self) -> Vec<&Row> {
        let all = self.loaded_items();
        match self.filter_key() {
            Some(key) if self.valid_only => all
                .iter()
                .filter(|row| row.get(key).is_some_and(is_truthy))
                .collect(),
            _ => all.iter().collect(),
        }
    }

    /// Counter line above the item list, or the empty-state message.
    pub fn item_stats(&self) -> String {
        let all = self.loaded_items();
        let shown = self.shown_items().len();
        let Some(key) = self.filter_key() else {
            return if all.is_empty() {
                "No items found".to_string()
            } else {
                format!("{} items", all.len())
            };
        };
        let valid = all.iter().filter(|row| row.get(key).is_some_and(is_truthy)).count();
        let invalid = all.len() - valid;
        if shown == 0 {
            return if self.valid_only && !all.is_empty() {
                format!("No valid items ({invalid} invalid)")
            } else {
                "No items found".to_string()
            };
        }
        if self.valid_only {
            if invalid > 0 {
                format!("Showing {valid} valid ({invalid} invalid hidden)")
            } else {
                format!("Showing {valid} valid")
            }
        } else {
            format!("Showing all {} ({valid} valid, {invalid} invalid)", all.len())
        }
    }

    /// Formatted cells of an item row.
    pub fn item_cells(&self, row: &Row) -> Vec<FormattedValue> {
        self.columns.iter().map(|col| format_cell(col, row)).collect()
    }

    /// Cursor within the shown items.
    pub fn item_cursor(&self) -> usize {
        self.item_list.as_ref().map_or(0, |l| l.cursor)
    }

    /// Move the item cursor by `delta`, clamped to the shown items.
    pub fn move_item_cursor(&mut self, delta: isize) {
        let len = self.shown_items().len();
        if let Some(list) = self.item_list.as_mut() {
            let max = len.saturating_sub(1) as isize;
            list.cursor = (list.cursor as isize + delta).clamp(0, max) as usize;
        }
    }

    /// Detail link of the item under the item cursor.
    pub fn current_item_target(&self) -> Option<LinkTarget> {
        let items = self.shown_items();
        let row = items.get(self.item_cursor())?;
        let click = self.display.on_item_click.as_ref()?;
        click_target(Some(click), row).or_else(|| {
            let view = click.detail_view.as_deref()?;
            let id = row.get(&self.hierarchy.id_key).and_then(EntityId::from_value)?;
            LinkTarget::new(view, id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::build_hierarchy;
    use crate::manifest::{ClickTarget, ValidFilter};
    use serde_json::{json, Value};

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    fn browser(display: TreeDisplay) -> TreeBrowser {
        let data = rows(json!([
            {"id": 1, "name": "Trilobita", "rank": "Class", "parent_id": null},
            {"id": 2, "name": "Agnostida", "rank": "Order", "parent_id": 1},
            {"id": 3, "name": "Redlichiida", "rank": "Order", "parent_id": 1},
            {"id": 4, "name": "Agnostidae", "rank": "Family", "parent_id": 2, "genera_count": 12},
            {"id": 5, "name": "Emptyidae", "rank": "Family", "parent_id": 2, "genera_count": 0}
        ]));
        let options = HierarchyOptions::default();
        let roots = build_hierarchy(&data, &options);
        TreeBrowser::new(roots, options, display)
    }

    fn family_display() -> TreeDisplay {
        TreeDisplay {
            leaf_rank: Some("Family".to_string()),
            count_key: Some("genera_count".to_string()),
            item_query: Some("family_genera".to_string()),
            item_param: Some("family_id".to_string()),
            on_item_click: Some(ClickTarget {
                detail_view: Some("genus_detail".to_string()),
                id_key: "id".to_string(),
            }),
            item_valid_filter: Some(ValidFilter {
                key: "is_valid".to_string(),
                label: None,
                default: true,
            }),
            ..TreeDisplay::default()
        }
    }

    #[test]
    fn roots_start_expanded() {
        let tree = browser(TreeDisplay::default());
        let names: Vec<String> = tree
            .visible_items()
            .iter()
            .map(|item| tree.node(&item.path).unwrap().text("name"))
            .collect();
        assert_eq!(names, ["Trilobita", "Agnostida", "Redlichiida"]);
    }

    #[test]
    fn expand_collapse_and_goto() {
        let mut tree = browser(TreeDisplay::default());
        tree.cursor_down();
        tree.expand_current();
        assert_eq!(tree.visible_items().len(), 5);

        tree.collapse_all();
        assert_eq!(tree.visible_items().len(), 1);

        assert!(tree.goto_node(&EntityId::from(5)));
        assert_eq!(tree.current_node().unwrap().text("name"), "Emptyidae");
        assert!(!tree.goto_node(&EntityId::from(99)));

        tree.collapse_current();
        assert_eq!(tree.current_node().unwrap().text("name"), "Agnostida");

        tree.expand_all();
        assert_eq!(tree.visible_items().len(), 5);
    }

    #[test]
    fn counts_show_on_leaves_only() {
        let mut tree = browser(family_display());
        tree.expand_all();
        let labels: Vec<String> = tree
            .visible_items()
            .iter()
            .map(|item| tree.node_label(tree.node(&item.path).unwrap()))
            .collect();
        assert!(labels.contains(&"Agnostidae (12)".to_string()));
        assert!(labels.contains(&"Emptyidae".to_string()));
    }

    #[test]
    fn only_leaf_rank_nodes_are_selectable() {
        let mut tree = browser(family_display());
        assert!(tree.select_current().is_none());

        tree.goto_node(&EntityId::from(4));
        let leaf = tree.select_current().unwrap();
        assert_eq!(leaf.name, "Agnostidae");
        assert_eq!(tree.item_list().unwrap().state, ItemState::Loading);
    }

    #[test]
    fn valid_filter_and_stats() {
        let mut tree = browser(family_display());
        tree.goto_node(&EntityId::from(4));
        let leaf = tree.select_current().unwrap();
        tree.set_items(
            &leaf.id,
            ItemState::Loaded(rows(json!([
                {"id": 10, "name": "Agnostus", "is_valid": 1},
                {"id": 11, "name": "Agnostoides", "is_valid": 0},
                {"id": 12, "name": "Ptychagnostus", "is_valid": 1}
            ]))),
        );
        assert_eq!(tree.shown_items().len(), 2);
        assert_eq!(tree.item_stats(), "Showing 2 valid (1 invalid hidden)");

        tree.toggle_valid_only();
        assert_eq!(tree.shown_items().len(), 3);
        assert_eq!(tree.item_stats(), "Showing all 3 (2 valid, 1 invalid)");

        tree.move_item_cursor(1);
        let target = tree.current_item_target().unwrap();
        assert_eq!(target.detail_view, "genus_detail");
        assert_eq!(target.id, EntityId::from(11));
    }

    #[test]
    fn all_invalid_items_report_count() {
        let mut tree = browser(family_display());
        tree.goto_node(&EntityId::from(4));
        let leaf = tree.select_current().unwrap();
        tree.set_items(
            &leaf.id,
            ItemState::Loaded(rows(json!([{"id": 11, "is_valid": 0}, {"id": 13, "is_valid": false}]))),
        );
        assert!(tree.shown_items().is_empty());
        assert_eq!(tree.item_stats(), "No valid items (2 invalid)");
    }

    #[test]
    fn items_for_a_stale_leaf_are_ignored() {
        let mut tree = browser(family_display());
        tree.goto_node(&EntityId::from(4));
        tree.select_current().unwrap();
        tree.set_items(&EntityId::from(5), ItemState::Failed("boom".to_string()));
        assert_eq!(tree.item_list().unwrap().state, ItemState::Loading);
    }
}
