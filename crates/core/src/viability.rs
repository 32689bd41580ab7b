//! Deciding whether one element is a good copy target.
//!
//! A viable block is visible, outside any editor, not an interactive control
//! (or nested in one), has real content, is big enough to point at, and does
//! not wrap a media child that would be the better target. The predicates run
//! in a fixed order and the first failing one rejects the element.

use std::fmt;

use crate::dom_tree::{DocumentTree, ElementData, NodeId};
use crate::editable::EditorExclusion;
use crate::parse::describe;
use crate::visibility::{HiddenReason, VisibilityConfig, hidden_reason, is_hidden};
use crate::Result;

/// Minimum rendered width of a block, in CSS pixels.
pub const MIN_BLOCK_WIDTH: f64 = 20.0;

/// Minimum rendered height of a block, in CSS pixels.
pub const MIN_BLOCK_HEIGHT: f64 = 20.0;

/// Minimum whitespace-collapsed text length of a non-media block.
pub const MIN_TEXT_LENGTH: usize = 1;

/// Depth below the candidate at which the content search gives up.
pub const MAX_CONTENT_DEPTH: usize = 512;

/// Tags that never hold user-visible content.
pub const NON_CONTENT_TAGS: [&str; 7] = ["script", "style", "meta", "head", "link", "template", "noscript"];

/// Interactive or structural tags that are not content blocks.
pub const EXCLUDED_TAGS: [&str; 13] = [
    "a", "button", "input", "select", "textarea", "label", "option", "optgroup", "datalist", "output", "iframe",
    "frame", "frameset",
];

/// Tags that carry content without needing text.
pub const MEDIA_TAGS: [&str; 7] = ["img", "video", "canvas", "svg", "picture", "embed", "object"];

/// Thresholds and tables for the viability chain.
#[derive(Debug, Clone)]
pub struct ViabilityConfig {
    pub visibility: VisibilityConfig,
    pub min_width: f64,
    pub min_height: f64,
    pub min_text_length: usize,
    pub max_content_depth: usize,
    pub editors: EditorExclusion,
}

impl Default for ViabilityConfig {
    fn default() -> Self {
        Self {
            visibility: VisibilityConfig::default(),
            min_width: MIN_BLOCK_WIDTH,
            min_height: MIN_BLOCK_HEIGHT,
            min_text_length: MIN_TEXT_LENGTH,
            max_content_depth: MAX_CONTENT_DEPTH,
            editors: EditorExclusion::default(),
        }
    }
}

/// Why an element was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotAnElement,
    Editable,
    NonContentTag,
    Hidden(HiddenReason),
    ExcludedTag,
    ExcludedAncestor,
    NoVisibleContent,
    TooSmall,
    NoText,
    PrefersMediaChild,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnElement => f.write_str("not an element"),
            Self::Editable => f.write_str("inside an editor"),
            Self::NonContentTag => f.write_str("non-content tag"),
            Self::Hidden(reason) => write!(f, "hidden ({})", reason),
            Self::ExcludedTag => f.write_str("interactive tag"),
            Self::ExcludedAncestor => f.write_str("inside an interactive element"),
            Self::NoVisibleContent => f.write_str("no visible content"),
            Self::TooSmall => f.write_str("below minimum size"),
            Self::NoText => f.write_str("no text"),
            Self::PrefersMediaChild => f.write_str("media child is the better target"),
        }
    }
}

/// Is the node an acceptable copy target?
///
/// Malformed style values make the node non-viable.
pub fn is_viable_block(tree: &DocumentTree, id: NodeId, config: &ViabilityConfig) -> bool {
    match assess_block(tree, id, config) {
        Ok(None) => true,
        Ok(Some(rejection)) => {
            tracing::trace!(node = %describe(tree, id), %rejection, "block rejected");
            false
        }
        Err(err) => {
            tracing::debug!(node = %describe(tree, id), error = %err, "block rejected on unreadable style");
            false
        }
    }
}

/// Runs the viability chain and reports the first failing predicate.
///
/// `Ok(None)` means viable.
///
/// # Errors
///
/// Propagates [`crate::ClipError::InvalidStyle`] from the visibility rules.
pub fn assess_block(tree: &DocumentTree, id: NodeId, config: &ViabilityConfig) -> Result<Option<Rejection>> {
    let Some(element) = tree.element(id) else {
        return Ok(Some(Rejection::NotAnElement));
    };
    let tag = element.tag_name.as_str();

    if config.editors.excludes(tree, id) {
        return Ok(Some(Rejection::Editable));
    }

    if NON_CONTENT_TAGS.contains(&tag) {
        return Ok(Some(Rejection::NonContentTag));
    }

    if let Some(reason) = hidden_reason(tree, id, &config.visibility, false)? {
        return Ok(Some(Rejection::Hidden(reason)));
    }

    if EXCLUDED_TAGS.contains(&tag) {
        return Ok(Some(Rejection::ExcludedTag));
    }

    if has_excluded_ancestor(tree, id) {
        return Ok(Some(Rejection::ExcludedAncestor));
    }

    if !has_visible_content(tree, id, config) {
        return Ok(Some(Rejection::NoVisibleContent));
    }

    if !meets_size_floor(element, config) {
        return Ok(Some(Rejection::TooSmall));
    }

    let media = is_media_tag(tag);
    if !media && normalized_text(tree, id).chars().count() < config.min_text_length {
        return Ok(Some(Rejection::NoText));
    }

    if !media && prefers_media_child(tree, id, config) {
        return Ok(Some(Rejection::PrefersMediaChild));
    }

    Ok(None)
}

pub fn is_media_tag(tag: &str) -> bool {
    MEDIA_TAGS.contains(&tag)
}

/// Does the rendered box meet the size floor? Unmeasured boxes pass.
pub fn meets_size_floor(element: &ElementData, config: &ViabilityConfig) -> bool {
    element
        .layout
        .is_none_or(|layout| layout.rect.width >= config.min_width && layout.rect.height >= config.min_height)
}

/// Text content with whitespace runs collapsed and ends trimmed.
pub fn normalized_text(tree: &DocumentTree, id: NodeId) -> String {
    tree.text_content(id).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Does the node, or some visible descendant, carry perceptible content?
///
/// Media counts when it has loaded; other elements count through
/// non-whitespace text. The search is bounded by `max_content_depth`.
pub fn has_visible_content(tree: &DocumentTree, id: NodeId, config: &ViabilityConfig) -> bool {
    let mut stack = vec![(id, 0usize)];

    while let Some((current, depth)) = stack.pop() {
        let Some(element) = tree.element(current) else {
            continue;
        };

        if is_media_tag(&element.tag_name) {
            if media_loaded(element) {
                return true;
            }
            continue;
        }

        let has_text = tree
            .children(current)
            .iter()
            .filter_map(|child| tree.text(*child))
            .any(|text| !text.trim().is_empty());
        if has_text {
            return true;
        }

        if depth >= config.max_content_depth {
            tracing::debug!(node = %describe(tree, current), depth, "content search depth cap reached");
            continue;
        }

        for child in tree.element_children(current).collect::<Vec<_>>().into_iter().rev() {
            let skip = tree.tag_name(child).is_some_and(|tag| NON_CONTENT_TAGS.contains(&tag))
                || is_hidden(tree, child, &config.visibility);
            if !skip {
                stack.push((child, depth + 1));
            }
        }
    }

    false
}

/// Load-state check for media that can report one.
fn media_loaded(element: &ElementData) -> bool {
    match element.tag_name.as_str() {
        "img" => {
            element.media.natural_width != Some(0.0)
                && ["src", "srcset"].iter().any(|name| element.attr(name).is_some_and(|v| !v.trim().is_empty()))
        }
        "video" => element.media.ready != Some(false),
        _ => true,
    }
}

/// Strict ancestors below `body` with an interactive tag.
fn has_excluded_ancestor(tree: &DocumentTree, id: NodeId) -> bool {
    tree.ancestors(id)
        .map_while(|ancestor| tree.tag_name(ancestor).filter(|tag| *tag != "body"))
        .any(|tag| EXCLUDED_TAGS.contains(&tag))
}

/// A visible, adequately sized media child beats its parent.
fn prefers_media_child(tree: &DocumentTree, id: NodeId, config: &ViabilityConfig) -> bool {
    tree.element_children(id).any(|child| {
        let Some(element) = tree.element(child) else {
            return false;
        };
        !EXCLUDED_TAGS.contains(&element.tag_name.as_str())
            && is_media_tag(&element.tag_name)
            && !is_hidden(tree, child, &config.visibility)
            && meets_size_floor(element, config)
    })
}
