//! Hierarchy building and nested-table layout.
//!
//! [`build_hierarchy`] turns flat query rows into an ordered forest.
//! [`collect_leaf_rows`] flattens that forest into merged-cell chart rows.

mod builder;
mod layout;

pub use builder::{build_hierarchy, sibling_order, TreeNode};
pub use layout::{
    cell_tooltip, collect_leaf_rows, is_light_color, span_grid, GridCell, LeafPathEntry,
    RankColumns, SpanGrid,
};
