//! Layout snapshots from a host with a real rendering engine.
//!
//! A snapshot is a JSON dump of the live document: every element with its
//! attributes, computed style, bounding rect and editability, in the spirit
//! of a devtools DOM snapshot. It is the input format that carries real
//! geometry, so every visibility rule can fire.
//!
//! ```json
//! {
//!   "viewport": { "width": 1280, "height": 800 },
//!   "title": "My Page",
//!   "url": "https://x.test/",
//!   "root": {
//!     "tag": "body",
//!     "rect": { "x": 0, "y": 0, "width": 1280, "height": 600 },
//!     "children": [
//!       { "tag": "p", "rect": { "x": 8, "y": 8, "width": 400, "height": 24 },
//!         "children": [ { "text": "Hello" } ] }
//!     ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::Result;
use crate::dom_tree::{BoxMetrics, DocumentTree, ElementData, MediaState, NodeId, Rect, Viewport};
use crate::style::ComputedStyle;

/// Top-level snapshot document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub root: SnapshotNode,
}

/// A text or element node in a snapshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    Text { text: String },
    Element(SnapshotElement),
}

/// An element with everything the classifiers read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotElement {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default)]
    pub rect: Option<Rect>,
    #[serde(default)]
    pub content_width: Option<f64>,
    #[serde(default)]
    pub content_height: Option<f64>,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub natural_width: Option<f64>,
    #[serde(default)]
    pub natural_height: Option<f64>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
}

impl Snapshot {
    /// Parses a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClipError::InvalidSnapshot`] for malformed JSON or a
    /// document that does not match the snapshot shape.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the owned document tree.
    pub fn into_tree(self) -> DocumentTree {
        let mut tree = DocumentTree::new(self.viewport);
        tree.set_title(self.title.filter(|title| !title.trim().is_empty()));
        tree.set_url(self.url);

        let mut stack: Vec<(SnapshotNode, NodeId)> = vec![(self.root, tree.root())];
        while let Some((node, parent)) = stack.pop() {
            match node {
                SnapshotNode::Text { text } => {
                    tree.append_text(parent, &text);
                }
                SnapshotNode::Element(mut element) => {
                    let children = std::mem::take(&mut element.children);
                    let id = tree.append_element(parent, element.into_data());
                    stack.extend(children.into_iter().rev().map(|child| (child, id)));
                }
            }
        }

        tree
    }
}

impl SnapshotElement {
    fn into_data(self) -> ElementData {
        let layout = self.rect.map(|rect| BoxMetrics {
            rect,
            content_width: self.content_width.unwrap_or(rect.width),
            content_height: self.content_height.unwrap_or(rect.height),
        });

        let mut data = ElementData::new(&self.tag);
        data.attributes = self.attributes.into_iter().collect();
        data.style = self.style;
        data.layout = layout;
        data.editable = self.editable;
        data.media =
            MediaState { natural_width: self.natural_width, natural_height: self.natural_height, ready: self.ready };
        data
    }
}

/// Parses a snapshot and builds its tree in one step.
pub fn tree_from_snapshot(json: &str) -> Result<DocumentTree> {
    Ok(Snapshot::from_json(json)?.into_tree())
}
