//! Choosing the block to copy for an interaction target.

use crate::dom_tree::{DocumentTree, NodeId};
use crate::parse::describe;
use crate::viability::{ViabilityConfig, is_viable_block};

/// The block to copy for `clicked`, or `None` when nothing qualifies.
///
/// A viable `table` anywhere on the ancestor chain wins over the clicked
/// node, so a click on a cell copies the whole table. Otherwise the clicked
/// node is used as is; there is no further upward search.
pub fn find_viable_block(tree: &DocumentTree, clicked: NodeId, config: &ViabilityConfig) -> Option<NodeId> {
    let root = tree.root();

    let table = tree
        .inclusive_ancestors(clicked)
        .take_while(|id| *id != root)
        .filter(|id| tree.tag_name(*id) == Some("table"))
        .find(|id| is_viable_block(tree, *id, config));
    if let Some(table) = table {
        tracing::debug!(clicked = %describe(tree, clicked), block = %describe(tree, table), "using enclosing table");
        return Some(table);
    }

    if is_viable_block(tree, clicked, config) {
        tracing::debug!(block = %describe(tree, clicked), "using clicked node");
        return Some(clicked);
    }

    tracing::debug!(clicked = %describe(tree, clicked), "no viable block");
    None
}

/// Widens a selection to the nearest viable strict ancestor.
pub fn promote_to_parent(tree: &DocumentTree, node: NodeId, config: &ViabilityConfig) -> Option<NodeId> {
    let root = tree.root();
    tree.ancestors(node)
        .take_while(|id| *id != root)
        .find(|id| is_viable_block(tree, *id, config))
}
