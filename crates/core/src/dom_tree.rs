//! Arena-backed document tree with style and layout per element.
//!
//! [`DocumentTree`] is the model every pipeline stage reads: nodes live in a
//! flat vector and refer to each other by [`NodeId`]. Element nodes carry the
//! computed style and layout box the host reported, which is what the
//! visibility rules run against.

use serde::{Deserialize, Serialize};

use crate::style::ComputedStyle;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Elements whose text children are written without escaping.
const RAW_TEXT_ELEMENTS: [&str; 7] = ["script", "style", "xmp", "iframe", "noembed", "noframes", "noscript"];

/// Index of a node inside its [`DocumentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Layout box of an element: border rect plus content-box dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxMetrics {
    pub rect: Rect,
    pub content_width: f64,
    pub content_height: f64,
}

impl BoxMetrics {
    /// A box with no area, as reported for elements that are not rendered.
    pub fn zero() -> Self {
        Self::default()
    }

    /// A box of the given size at the viewport origin.
    pub fn sized(width: f64, height: f64) -> Self {
        Self { rect: Rect::new(0.0, 0.0, width, height), content_width: width, content_height: height }
    }

    pub fn is_zero(&self) -> bool {
        self.rect.width == 0.0 && self.rect.height == 0.0 && self.content_width == 0.0 && self.content_height == 0.0
    }
}

/// Load state of a media element.
///
/// `None` fields mean the host did not report them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MediaState {
    pub natural_width: Option<f64>,
    pub natural_height: Option<f64>,
    pub ready: Option<bool>,
}

/// Size of the visible viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280.0, height: 800.0 }
    }
}

/// Payload of an element node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag_name: String,
    /// Attributes in source order
    pub attributes: Vec<(String, String)>,
    pub style: ComputedStyle,
    /// Layout box; `None` when the host supplied no layout
    pub layout: Option<BoxMetrics>,
    /// Host reports the element as editable (`isContentEditable`)
    pub editable: bool,
    pub media: MediaState,
}

impl ElementData {
    pub fn new(tag_name: &str) -> Self {
        Self { tag_name: tag_name.to_ascii_lowercase(), ..Default::default() }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_style(mut self, style: ComputedStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_layout(mut self, layout: BoxMetrics) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.attributes.push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    pub fn class_tokens(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_tokens().any(|token| token == class)
    }
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

/// A node in the tree
#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    /// Parent node ID (if any)
    pub parent_id: Option<NodeId>,
    /// Child node IDs in document order
    pub child_ids: Vec<NodeId>,
}

impl Node {
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// An owned document: nodes, viewport and page identity.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<Node>,
    viewport: Viewport,
    title: Option<String>,
    url: Option<String>,
}

impl DocumentTree {
    /// Creates a tree holding only the document node.
    pub fn new(viewport: Viewport) -> Self {
        let root = Node { data: NodeData::Document, parent_id: None, child_ids: Vec::new() };
        Self { nodes: vec![root], viewport, title: None, url: None }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn set_url(&mut self, url: Option<String>) {
        self.url = url;
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(id.0).map(|node| &mut node.data) {
            Some(NodeData::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(Node::as_text)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag_name.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|element| element.attr(name))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent_id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.child_ids.as_slice()).unwrap_or_default()
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(|child| self.is_element(*child))
    }

    /// Strict ancestors, nearest first, ending with the document node.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |current| self.parent(*current))
    }

    /// The node itself followed by its ancestors.
    pub fn inclusive_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(id).chain(self.ancestors(id))
    }

    /// Preorder traversal of the subtree rooted at `id`, including `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = if self.get(id).is_some() { vec![id] } else { Vec::new() };
        Descendants { tree: self, stack }
    }

    /// The `body` element, if the document has one.
    pub fn body(&self) -> Option<NodeId> {
        self.descendants(self.root()).find(|id| self.tag_name(*id) == Some("body"))
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id).filter_map(|node| self.text(node)).collect()
    }

    /// Deepest rendered element whose box contains the point.
    ///
    /// Subtrees under `display: none` are skipped. Unmeasured elements never
    /// match.
    pub fn element_at(&self, x: f64, y: f64) -> Option<NodeId> {
        let mut hit = None;
        let mut stack = vec![self.root()];

        while let Some(id) = stack.pop() {
            if let Some(element) = self.element(id) {
                if element.style.is_display_none() {
                    continue;
                }
                if element.layout.is_some_and(|layout| layout.rect.contains(x, y)) {
                    hit = Some(id);
                }
            }
            stack.extend(self.children(id).iter().rev());
        }

        hit
    }

    /// Appends a node under `parent` and returns its id.
    pub fn append(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { data, parent_id: Some(parent), child_ids: Vec::new() });
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.child_ids.push(id);
        }
        id
    }

    pub fn append_element(&mut self, parent: NodeId, element: ElementData) -> NodeId {
        self.append(parent, NodeData::Element(element))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.append(parent, NodeData::Text(text.to_string()))
    }

    /// Detaches a subtree from its parent. The nodes stay in the arena but are
    /// no longer reachable from the root.
    pub fn remove_subtree(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.child_ids.retain(|child| *child != id);
        }
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.parent_id = None;
        }
    }

    /// Markup for the node including its own tags.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    /// Nesting depth of the subtree at `id`. A childless node has depth 1.
    pub fn subtree_depth(&self, id: NodeId) -> usize {
        let mut deepest = 0;
        let mut stack = if self.get(id).is_some() { vec![(id, 1)] } else { Vec::new() };

        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(self.children(node).iter().map(|child| (*child, depth + 1)));
        }

        deepest
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let mut stack = vec![HtmlStep::Open(id)];

        while let Some(step) = stack.pop() {
            let id = match step {
                HtmlStep::Open(id) => id,
                HtmlStep::Close(id) => {
                    if let Some(element) = self.element(id) {
                        out.push_str("</");
                        out.push_str(&element.tag_name);
                        out.push('>');
                    }
                    continue;
                }
            };
            let Some(node) = self.get(id) else {
                continue;
            };

            match &node.data {
                NodeData::Document => {
                    stack.extend(node.child_ids.iter().rev().map(|child| HtmlStep::Open(*child)));
                }
                NodeData::Text(text) => {
                    let raw = self
                        .parent(id)
                        .and_then(|parent| self.tag_name(parent))
                        .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
                    if raw {
                        out.push_str(text);
                    } else {
                        escape_text(text, out);
                    }
                }
                NodeData::Element(element) => {
                    out.push('<');
                    out.push_str(&element.tag_name);
                    for (name, value) in &element.attributes {
                        out.push(' ');
                        out.push_str(name);
                        out.push_str("=\"");
                        escape_attribute(value, out);
                        out.push('"');
                    }
                    out.push('>');

                    if VOID_ELEMENTS.contains(&element.tag_name.as_str()) {
                        continue;
                    }

                    stack.push(HtmlStep::Close(id));
                    stack.extend(node.child_ids.iter().rev().map(|child| HtmlStep::Open(*child)));
                }
            }
        }
    }
}

enum HtmlStep {
    Open(NodeId),
    Close(NodeId),
}

/// Preorder iterator over a subtree.
pub struct Descendants<'a> {
    tree: &'a DocumentTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children(id).iter().rev());
        Some(id)
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DocumentTree, NodeId, NodeId) {
        let mut tree = DocumentTree::new(Viewport::default());
        let root = tree.root();
        let body = tree.append_element(root, ElementData::new("body"));
        let div = tree.append_element(
            body,
            ElementData::new("DIV")
                .with_attr("class", "card wide")
                .with_layout(BoxMetrics { rect: Rect::new(10.0, 10.0, 200.0, 100.0), ..Default::default() }),
        );
        tree.append_text(div, "Fish & chips");
        let img = tree.append_element(div, ElementData::new("img").with_attr("alt", "say \"hi\""));
        (tree, div, img)
    }

    #[test]
    fn test_parent_child_relationships() {
        let (tree, div, img) = sample();
        assert_eq!(tree.parent(img), Some(div));
        assert_eq!(tree.tag_name(div), Some("div"));
        assert_eq!(tree.element_children(div).collect::<Vec<_>>(), vec![img]);
        assert_eq!(tree.ancestors(img).last(), Some(tree.root()));
        assert_eq!(tree.body().and_then(|body| tree.tag_name(body)), Some("body"));
    }

    #[test]
    fn test_class_tokens() {
        let (tree, div, _) = sample();
        let element = tree.element(div).unwrap();
        assert!(element.has_class("wide"));
        assert!(!element.has_class("wid"));
    }

    #[test]
    fn test_outer_html_escapes() {
        let (tree, div, _) = sample();
        assert_eq!(
            tree.outer_html(div),
            r#"<div class="card wide">Fish &amp; chips<img alt="say &quot;hi&quot;"></div>"#
        );
    }

    #[test]
    fn test_raw_text_not_escaped() {
        let mut tree = DocumentTree::new(Viewport::default());
        let root = tree.root();
        let script = tree.append_element(root, ElementData::new("script"));
        tree.append_text(script, "if (a < b && c) {}");
        assert_eq!(tree.outer_html(script), "<script>if (a < b && c) {}</script>");
    }

    #[test]
    fn test_text_content() {
        let (tree, div, _) = sample();
        assert_eq!(tree.text_content(div), "Fish & chips");
    }

    #[test]
    fn test_remove_subtree_detaches() {
        let (mut tree, div, img) = sample();
        tree.remove_subtree(img);
        assert_eq!(tree.element_children(div).count(), 0);
        assert_eq!(tree.parent(img), None);
        assert!(!tree.outer_html(div).contains("<img"));
    }

    #[test]
    fn test_element_at_picks_deepest() {
        let (mut tree, div, _) = sample();
        let span = tree.append_element(
            div,
            ElementData::new("span")
                .with_layout(BoxMetrics { rect: Rect::new(20.0, 20.0, 50.0, 20.0), ..Default::default() }),
        );
        assert_eq!(tree.element_at(25.0, 25.0), Some(span));
        assert_eq!(tree.element_at(150.0, 90.0), Some(div));
        assert_eq!(tree.element_at(500.0, 500.0), None);
    }

    #[test]
    fn test_invalid_id_is_harmless() {
        let (tree, _, _) = sample();
        let bogus = NodeId(999);
        assert!(tree.children(bogus).is_empty());
        assert_eq!(tree.text_content(bogus), "");
        assert_eq!(tree.outer_html(bogus), "");
        assert_eq!(tree.subtree_depth(bogus), 0);
    }

    #[test]
    fn test_subtree_depth() {
        let (tree, div, img) = sample();
        assert_eq!(tree.subtree_depth(img), 1);
        assert_eq!(tree.subtree_depth(div), 2);
        assert_eq!(tree.subtree_depth(tree.root()), 4);
    }

    #[test]
    fn test_deep_nesting_serializes() {
        let mut tree = DocumentTree::new(Viewport::default());
        let mut parent = tree.root();
        for _ in 0..5000 {
            parent = tree.append_element(parent, ElementData::new("div"));
        }
        tree.append_text(parent, "deep");

        let html = tree.outer_html(tree.root());
        assert_eq!(tree.subtree_depth(tree.root()), 5002);
        assert!(html.starts_with("<div><div>"));
        assert!(html.contains("deep</div></div>"));
        assert_eq!(html.matches("</div>").count(), 5000);
    }
}
