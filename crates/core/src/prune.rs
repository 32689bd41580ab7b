//! Detached clones holding only what a reader can perceive.

use crate::dom_tree::{DocumentTree, NodeData, NodeId};
use crate::parse::describe;
use crate::visibility::{VisibilityConfig, is_hidden_for_pruning};

/// Builds a new tree whose single root child is a clone of `root`.
///
/// Descendants are copied in document order. Whitespace-only text nodes are
/// dropped, and so is every element the pruning rules judge hidden, together
/// with its whole subtree. `root` itself is always kept. The clone carries
/// the source tree's viewport, title and URL, and the source tree is left
/// untouched.
pub fn create_visible_clone(tree: &DocumentTree, root: NodeId, config: &VisibilityConfig) -> DocumentTree {
    let mut clone = DocumentTree::new(tree.viewport());
    clone.set_title(tree.title().map(str::to_string));
    clone.set_url(tree.url().map(str::to_string));

    let Some(node) = tree.get(root) else {
        return clone;
    };
    let clone_root = clone.root();
    let top = match &node.data {
        NodeData::Document => clone_root,
        data => clone.append(clone_root, data.clone()),
    };

    let mut pruned = 0usize;
    let mut stack: Vec<(NodeId, NodeId)> = tree.children(root).iter().rev().map(|child| (*child, top)).collect();

    while let Some((original, parent)) = stack.pop() {
        let Some(node) = tree.get(original) else {
            continue;
        };

        match &node.data {
            NodeData::Text(text) => {
                if !text.trim().is_empty() {
                    clone.append_text(parent, text);
                }
            }
            NodeData::Element(element) => {
                if is_hidden_for_pruning(tree, original, config) {
                    tracing::trace!(node = %describe(tree, original), "pruned hidden subtree");
                    pruned += 1;
                    continue;
                }
                let copy = clone.append_element(parent, element.clone());
                stack.extend(tree.children(original).iter().rev().map(|child| (*child, copy)));
            }
            NodeData::Document => {}
        }
    }

    tracing::debug!(root = %describe(tree, root), pruned, "built visible clone");
    clone
}

/// The cloned block inside a tree returned by [`create_visible_clone`].
pub fn clone_root(clone: &DocumentTree) -> Option<NodeId> {
    clone.children(clone.root()).first().copied()
}
