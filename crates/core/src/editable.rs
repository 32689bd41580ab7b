//! Editable regions and known rich-text editors.
//!
//! Blocks inside something the user is typing into are never offered for
//! copying. Two checks feed that decision: the generic editable-context walk
//! and a configurable list of editor class names and attribute selectors.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dom_tree::{DocumentTree, ElementData, NodeId};
use crate::{ClipError, Result};

/// Class names of widely deployed rich-text and code editors.
pub const FALLBACK_EDITOR_CLASSES: [&str; 9] = [
    "ql-editor",
    "ProseMirror",
    "CodeMirror",
    "monaco-editor",
    "ace_editor",
    "cke_editable",
    "tox-edit-area",
    "DraftEditor-root",
    "public-DraftEditor-content",
];

/// Attribute selectors that mark editing surfaces.
pub const FALLBACK_EDITOR_SELECTORS: [&str; 2] = [r#"[contenteditable="true"]"#, r#"[role="textbox"]"#];

static ATTRIBUTE_SELECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\[\s*([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*(?:([~^*$|]?=)\s*(?:"([^"]*)"|'([^']*)'|([^\s\]"']+))\s*)?\]$"#)
        .expect("attribute selector pattern")
});

/// Nearest inclusive ancestor that is an editing root.
///
/// A node is an editing root when the host reports it editable or it carries
/// `contenteditable` with any value other than `false`.
pub fn find_editable_context(tree: &DocumentTree, id: NodeId) -> Option<NodeId> {
    tree.inclusive_ancestors(id).find(|candidate| {
        tree.element(*candidate).is_some_and(|element| {
            element.editable
                || element
                    .attr("contenteditable")
                    .is_some_and(|value| !value.trim().eq_ignore_ascii_case("false"))
        })
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchOp {
    Exists,
    Equals,
    /// `~=`: whitespace-separated word
    Word,
    /// `^=`
    Prefix,
    /// `*=`
    Contains,
    /// `$=`
    Suffix,
    /// `|=`
    Dash,
}

/// A parsed `[name op value]` selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    name: String,
    op: MatchOp,
    value: String,
    source: String,
}

impl AttributeSelector {
    /// Parses a single attribute selector.
    ///
    /// # Errors
    ///
    /// Returns [`ClipError::InvalidSelector`] for anything that is not one
    /// bracketed attribute test.
    pub fn parse(selector: &str) -> Result<Self> {
        let source = selector.trim();
        let caps = ATTRIBUTE_SELECTOR
            .captures(source)
            .ok_or_else(|| ClipError::InvalidSelector(source.to_string()))?;

        let op = match caps.get(2).map(|m| m.as_str()) {
            None => MatchOp::Exists,
            Some("=") => MatchOp::Equals,
            Some("~=") => MatchOp::Word,
            Some("^=") => MatchOp::Prefix,
            Some("*=") => MatchOp::Contains,
            Some("$=") => MatchOp::Suffix,
            Some("|=") => MatchOp::Dash,
            Some(_) => return Err(ClipError::InvalidSelector(source.to_string())),
        };
        let value = [3, 4, 5]
            .iter()
            .find_map(|group| caps.get(*group))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        Ok(Self { name: caps[1].to_ascii_lowercase(), op, value, source: source.to_string() })
    }

    pub fn matches(&self, element: &ElementData) -> bool {
        let Some(actual) = element.attr(&self.name) else {
            return false;
        };
        match self.op {
            MatchOp::Exists => true,
            MatchOp::Equals => actual == self.value,
            MatchOp::Word => actual.split_whitespace().any(|word| word == self.value),
            MatchOp::Prefix => !self.value.is_empty() && actual.starts_with(&self.value),
            MatchOp::Contains => !self.value.is_empty() && actual.contains(&self.value),
            MatchOp::Suffix => !self.value.is_empty() && actual.ends_with(&self.value),
            MatchOp::Dash => actual == self.value || actual.starts_with(&format!("{}-", self.value)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// User-supplied additions to the editor exclusion lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorExclusionConfig {
    pub excluded_editor_classes: Option<Vec<String>>,
    pub excluded_editor_selectors: Option<Vec<String>>,
}

/// Editors whose content must never become a copy target.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorExclusion {
    class_names: Vec<String>,
    selectors: Vec<AttributeSelector>,
}

impl Default for EditorExclusion {
    fn default() -> Self {
        Self {
            class_names: FALLBACK_EDITOR_CLASSES.iter().map(|c| c.to_string()).collect(),
            selectors: FALLBACK_EDITOR_SELECTORS
                .iter()
                .filter_map(|s| AttributeSelector::parse(s).ok())
                .collect(),
        }
    }
}

impl EditorExclusion {
    /// Fallback lists extended by the configured class names and selectors.
    ///
    /// # Errors
    ///
    /// Returns [`ClipError::InvalidSelector`] if a configured selector does
    /// not parse.
    pub fn from_config(config: &EditorExclusionConfig) -> Result<Self> {
        let mut exclusion = Self::default();

        for class in config.excluded_editor_classes.iter().flatten() {
            let class = class.trim();
            if !class.is_empty() && !exclusion.class_names.iter().any(|known| known == class) {
                exclusion.class_names.push(class.to_string());
            }
        }

        for selector in config.excluded_editor_selectors.iter().flatten() {
            let parsed = AttributeSelector::parse(selector)?;
            if !exclusion.selectors.contains(&parsed) {
                exclusion.selectors.push(parsed);
            }
        }

        Ok(exclusion)
    }

    /// No exclusions at all besides the editable-context walk.
    pub fn empty() -> Self {
        Self { class_names: Vec::new(), selectors: Vec::new() }
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().map(AttributeSelector::as_str)
    }

    /// Does the element itself look like an editor surface?
    pub fn matches(&self, element: &ElementData) -> bool {
        element
            .class_tokens()
            .any(|token| self.class_names.iter().any(|class| class == token))
            || self.selectors.iter().any(|selector| selector.matches(element))
    }

    /// True when the node sits in an editing root or inside a known editor.
    pub fn excludes(&self, tree: &DocumentTree, id: NodeId) -> bool {
        if find_editable_context(tree, id).is_some() {
            return true;
        }
        tree.inclusive_ancestors(id)
            .filter_map(|candidate| tree.element(candidate))
            .any(|element| self.matches(element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom_tree::Viewport;
    use rstest::rstest;

    fn nested(outer: ElementData) -> (DocumentTree, NodeId, NodeId) {
        let mut tree = DocumentTree::new(Viewport::default());
        let root = tree.root();
        let outer = tree.append_element(root, outer);
        let inner = tree.append_element(outer, ElementData::new("p"));
        (tree, outer, inner)
    }

    #[test]
    fn test_find_editable_context_attribute() {
        let (tree, outer, inner) = nested(ElementData::new("div").with_attr("contenteditable", ""));
        assert_eq!(find_editable_context(&tree, inner), Some(outer));
    }

    #[test]
    fn test_contenteditable_false_is_not_editable() {
        let (tree, _, inner) = nested(ElementData::new("div").with_attr("contenteditable", "FALSE"));
        assert_eq!(find_editable_context(&tree, inner), None);
    }

    #[test]
    fn test_host_reported_editable() {
        let mut outer = ElementData::new("div");
        outer.editable = true;
        let (tree, outer, inner) = nested(outer);
        assert_eq!(find_editable_context(&tree, inner), Some(outer));
    }

    #[rstest]
    #[case("[contenteditable]", "contenteditable", "plaintext-only", true)]
    #[case(r#"[role="textbox"]"#, "role", "textbox", true)]
    #[case("[role='textbox']", "role", "searchbox", false)]
    #[case("[data-editor=slate]", "data-editor", "slate", true)]
    #[case(r#"[class~="editor"]"#, "class", "rich editor", true)]
    #[case(r#"[class^="cm-"]"#, "class", "cm-content", true)]
    #[case(r#"[data-kind*="edit"]"#, "data-kind", "rich-editor-v2", true)]
    #[case(r#"[lang|="en"]"#, "lang", "en-US", true)]
    fn test_attribute_selector_matching(
        #[case] selector: &str, #[case] name: &str, #[case] value: &str, #[case] expected: bool,
    ) {
        let selector = AttributeSelector::parse(selector).unwrap();
        let element = ElementData::new("div").with_attr(name, value);
        assert_eq!(selector.matches(&element), expected);
    }

    #[rstest]
    #[case("div.editor")]
    #[case("[role=")]
    #[case("role=textbox")]
    fn test_attribute_selector_rejects(#[case] selector: &str) {
        assert!(matches!(AttributeSelector::parse(selector), Err(ClipError::InvalidSelector(_))));
    }

    #[test]
    fn test_fallback_lists() {
        let exclusion = EditorExclusion::default();
        assert_eq!(exclusion.class_names().len(), 9);
        assert_eq!(exclusion.selectors().count(), 2);
    }

    #[test]
    fn test_excludes_known_editor_class() {
        let (tree, _, inner) = nested(ElementData::new("div").with_attr("class", "editor-shell ProseMirror"));
        assert!(EditorExclusion::default().excludes(&tree, inner));
        assert!(!EditorExclusion::empty().excludes(&tree, inner));
    }

    #[test]
    fn test_from_config_extends_fallback() {
        let config = EditorExclusionConfig {
            excluded_editor_classes: Some(vec!["my-editor".to_string(), "ql-editor".to_string()]),
            excluded_editor_selectors: Some(vec!["[data-slate-editor]".to_string()]),
        };
        let exclusion = EditorExclusion::from_config(&config).unwrap();
        assert_eq!(exclusion.class_names().len(), 10);
        assert_eq!(exclusion.selectors().count(), 3);

        let (tree, _, inner) = nested(ElementData::new("div").with_attr("data-slate-editor", "true"));
        assert!(exclusion.excludes(&tree, inner));
    }

    #[test]
    fn test_from_config_rejects_bad_selector() {
        let config =
            EditorExclusionConfig { excluded_editor_selectors: Some(vec!["div >".to_string()]), ..Default::default() };
        assert!(EditorExclusion::from_config(&config).is_err());
    }
}
