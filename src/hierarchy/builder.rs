use crate::data::{as_number, display_value, is_truthy, EntityId, Row};
use crate::manifest::{HierarchyOptions, SortBy};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// A row placed in the hierarchy.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// The source row.
    pub row: Row,
    /// Children in display order.
    pub children: Vec<TreeNode>,
    /// Number of leaf descendants; 1 for a leaf.
    pub leaf_count: usize,
}

impl TreeNode {
    /// True when the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Value of a row key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.row.get(key)
    }

    /// Row key rendered as text; missing keys give an empty string.
    pub fn text(&self, key: &str) -> String {
        self.row.get(key).map(display_value).unwrap_or_default()
    }

    /// Node id under `key`.
    pub fn id(&self, key: &str) -> Option<EntityId> {
        self.row.get(key).and_then(EntityId::from_value)
    }

    /// Total number of nodes in this subtree, including itself.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(TreeNode::subtree_len).sum::<usize>()
    }
}

/// Turn flat rows into an ordered forest.
///
/// A row without a parent reference, or whose parent id matches no row, is a
/// root. Rows whose rank is in `skip_ranks` are dropped and their children
/// become roots. Siblings are sorted per `sort_by`. Rows caught in a parent cycle are never reachable from a root
/// and do not appear.
pub fn build_hierarchy(rows: &[Row], options: &HierarchyOptions) -> Vec<TreeNode> {
    let mut index: HashMap<EntityId, usize> = HashMap::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        if let Some(id) = row.get(&options.id_key).and_then(EntityId::from_value) {
            index.entry(id).or_insert(i);
        }
    }

    let skipped: Vec<bool> = rows
        .iter()
        .map(|row| match row.get(&options.rank_key) {
            Some(Value::String(rank)) => options.skip_ranks.contains(rank),
            _ => false,
        })
        .collect();

    let parent_of = |i: usize| -> Option<usize> {
        let value = rows[i].get(&options.parent_key).filter(|v| is_truthy(v))?;
        let parent = *index.get(&EntityId::from_value(value)?)?;
        (parent != i).then_some(parent)
    };

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
    let mut roots = Vec::new();
    for i in 0..rows.len() {
        if skipped[i] {
            continue;
        }
        match parent_of(i) {
            Some(p) if !skipped[p] => children[p].push(i),
            _ => roots.push(i),
        }
    }

    let mut forest: Vec<TreeNode> = roots
        .into_iter()
        .map(|i| assemble(i, rows, &children, options))
        .collect();
    sort_siblings(&mut forest, options);
    forest
}

fn assemble(i: usize, rows: &[Row], children: &[Vec<usize>], options: &HierarchyOptions) -> TreeNode {
    let mut kids: Vec<TreeNode> = children[i]
        .iter()
        .map(|&c| assemble(c, rows, children, options))
        .collect();
    sort_siblings(&mut kids, options);
    let leaf_count = if kids.is_empty() {
        1
    } else {
        kids.iter().map(|k| k.leaf_count).sum()
    };
    TreeNode {
        row: rows[i].clone(),
        children: kids,
        leaf_count,
    }
}

fn sort_siblings(nodes: &mut [TreeNode], options: &HierarchyOptions) {
    nodes.sort_by(|a, b| sibling_order(a, b, options));
}

/// Compare two nodes the way [`build_hierarchy`] orders siblings.
pub fn sibling_order(a: &TreeNode, b: &TreeNode, options: &HierarchyOptions) -> Ordering {
    match options.sort_by {
        SortBy::OrderKey => {
            let key = |n: &TreeNode| n.get(&options.order_key).and_then(as_number).unwrap_or(0.0);
            key(a).total_cmp(&key(b))
        },
        SortBy::Label => {
            let key = |n: &TreeNode| n.text(&options.label_key).to_lowercase();
            key(a).cmp(&key(b))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn rows(value: Value) -> Vec<Row> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect()
    }

    fn labels(nodes: &[TreeNode]) -> Vec<String> {
        nodes.iter().map(|n| n.text("name")).collect()
    }

    fn options() -> HierarchyOptions {
        HierarchyOptions {
            parent_key: "parent".to_string(),
            ..HierarchyOptions::default()
        }
    }

    fn two_level() -> Vec<Row> {
        rows(json!([
            {"id": 1, "name": "A", "parent": null, "rank": "Order"},
            {"id": 3, "name": "C", "parent": 1, "rank": "Family"},
            {"id": 2, "name": "B", "parent": 1, "rank": "Family"}
        ]))
    }

    #[test]
    fn builds_two_levels_sorted_by_label() {
        let forest = build_hierarchy(&two_level(), &options());
        assert_eq!(labels(&forest), ["A"]);
        assert_eq!(labels(&forest[0].children), ["B", "C"]);
        assert_eq!(forest[0].leaf_count, 2);
    }

    #[test]
    fn skipped_root_promotes_children() {
        let mut opts = options();
        opts.skip_ranks.insert("Order".to_string());
        let forest = build_hierarchy(&two_level(), &opts);
        assert_eq!(labels(&forest), ["B", "C"]);
    }

    #[test]
    fn children_of_skipped_middle_rank_become_roots() {
        let data = rows(json!([
            {"id": 1, "name": "Phanerozoic", "parent": null, "rank": "Eon"},
            {"id": 2, "name": "Super", "parent": 1, "rank": "Super-Era"},
            {"id": 3, "name": "Paleozoic", "parent": 2, "rank": "Era"}
        ]));
        let mut opts = options();
        opts.skip_ranks.insert("Super-Era".to_string());
        let forest = build_hierarchy(&data, &opts);
        assert_eq!(labels(&forest), ["Paleozoic", "Phanerozoic"]);
        assert!(forest.iter().all(TreeNode::is_leaf));
    }

    #[test]
    fn unknown_parent_and_string_ids_resolve() {
        let data = rows(json!([
            {"id": "7", "name": "Orphan", "parent": 99},
            {"id": 8, "name": "Kid", "parent": "7"},
            {"id": 9, "name": "Zero", "parent": 0}
        ]));
        let forest = build_hierarchy(&data, &options());
        assert_eq!(labels(&forest), ["Orphan", "Zero"]);
        assert_eq!(labels(&forest[0].children), ["Kid"]);
    }

    #[test]
    fn order_key_sorts_numerically_with_missing_as_zero() {
        let data = rows(json!([
            {"id": 1, "name": "late", "ord": 10},
            {"id": 2, "name": "early", "ord": 2},
            {"id": 3, "name": "none"}
        ]));
        let opts = HierarchyOptions {
            sort_by: SortBy::OrderKey,
            order_key: "ord".to_string(),
            ..options()
        };
        let forest = build_hierarchy(&data, &opts);
        assert_eq!(labels(&forest), ["none", "early", "late"]);
    }

    #[test]
    fn cycles_terminate() {
        let data = rows(json!([
            {"id": 1, "name": "a", "parent": 2},
            {"id": 2, "name": "b", "parent": 1},
            {"id": 3, "name": "root", "parent": null}
        ]));
        let forest = build_hierarchy(&data, &options());
        assert_eq!(labels(&forest), ["root"]);
    }

    /// Acyclic forest: every row's parent is an earlier row or none.
    fn forest_rows() -> impl Strategy<Value = (Vec<Row>, Vec<bool>)> {
        prop::collection::vec((any::<prop::sample::Index>(), any::<bool>(), 0u8..5, "[a-zA-Z]{1,4}", any::<bool>()), 1..40)
            .prop_map(|specs| {
                let mut out = Vec::new();
                let mut skip = Vec::new();
                for (i, (parent, has_parent, order, name, skipped)) in specs.into_iter().enumerate() {
                    let parent = if has_parent && i > 0 {
                        json!(parent.index(i) + 1)
                    } else {
                        Value::Null
                    };
                    let rank = if skipped { "Skip" } else { "Keep" };
                    out.push(
                        json!({"id": i + 1, "parent": parent, "name": name, "ord": order, "rank": rank})
                            .as_object()
                            .cloned()
                            .unwrap(),
                    );
                    skip.push(skipped);
                }
                (out, skip)
            })
    }

    fn collect_ids(nodes: &[TreeNode], out: &mut Vec<String>) {
        for n in nodes {
            out.push(n.text("id"));
            collect_ids(&n.children, out);
        }
    }

    fn assert_sorted(nodes: &[TreeNode], opts: &HierarchyOptions) {
        for pair in nodes.windows(2) {
            assert_ne!(sibling_order(&pair[0], &pair[1], opts), Ordering::Greater);
        }
        for n in nodes {
            assert_sorted(&n.children, opts);
        }
    }

    proptest! {
        #[test]
        fn every_kept_row_appears_once((data, skipped) in forest_rows(), by_order in any::<bool>()) {
            let mut opts = options();
            opts.skip_ranks.insert("Skip".to_string());
            if by_order {
                opts.sort_by = SortBy::OrderKey;
                opts.order_key = "ord".to_string();
            }
            let forest = build_hierarchy(&data, &opts);

            let mut seen = Vec::new();
            collect_ids(&forest, &mut seen);
            seen.sort();
            let mut expected: Vec<String> = (0..data.len())
                .filter(|&i| !skipped[i])
                .map(|i| (i + 1).to_string())
                .collect();
            expected.sort();
            prop_assert_eq!(seen, expected);

            assert_sorted(&forest, &opts);
            for root in &forest {
                let leaves = count_leaves(root);
                prop_assert_eq!(root.leaf_count, leaves);
            }
        }
    }

    fn count_leaves(node: &TreeNode) -> usize {
        if node.is_leaf() {
            1
        } else {
            node.children.iter().map(count_leaves).sum()
        }
    }
}
