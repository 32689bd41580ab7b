//! Turning a chosen block into clipboard text.
//!
//! [`ContentSerializer::process`] prunes the block, drops our own injected UI,
//! renders Markdown or plain text and appends the source attachment. It
//! never fails: conversion errors and blocks nested deeper than
//! [`MAX_MARKDOWN_DEPTH`] fall back to plain text.

use std::sync::Arc;

use crate::dom_tree::{DocumentTree, NodeId};
use crate::formatters::{HtmdConverter, MarkdownConverter, convert_to_markdown, convert_to_text};
use crate::i18n;
use crate::parse::describe;
use crate::prune::{clone_root, create_visible_clone};
use crate::settings::{OutputFormat, Settings};
use crate::visibility::VisibilityConfig;

/// Separator between content and the source line.
pub const SOURCE_SEPARATOR: &str = "\n\n---\n";

/// Attribute carried by elements the clipping UI injects into pages.
pub const UI_MARKER_ATTRIBUTE: &str = "data-clipblock-ui";

/// Class token carried by elements the clipping UI injects into pages.
pub const UI_MARKER_CLASS: &str = "clipblock-ui";

/// Deepest block nesting handed to the Markdown converter. Deeper blocks are
/// rendered as plain text.
pub const MAX_MARKDOWN_DEPTH: usize = 256;

/// Title and URL of the page a block came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub title: Option<String>,
    pub url: Option<String>,
}

impl PageInfo {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self { title: Some(title.into()), url: Some(url.into()) }
    }

    pub fn from_tree(tree: &DocumentTree) -> Self {
        Self { title: tree.title().map(str::to_string), url: tree.url().map(str::to_string) }
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Prunes, converts and annotates blocks.
#[derive(Debug, Clone)]
pub struct ContentSerializer {
    visibility: VisibilityConfig,
    converter: Arc<dyn MarkdownConverter>,
}

impl Default for ContentSerializer {
    fn default() -> Self {
        Self::new(VisibilityConfig::default(), Arc::new(HtmdConverter))
    }
}

impl ContentSerializer {
    pub fn new(visibility: VisibilityConfig, converter: Arc<dyn MarkdownConverter>) -> Self {
        Self { visibility, converter }
    }

    /// Serializes the block at `element` according to `settings`.
    pub fn process(&self, tree: &DocumentTree, element: NodeId, settings: &Settings, page: &PageInfo) -> String {
        let content = match self.render(tree, element, settings.output_format) {
            Some(content) => content,
            None => {
                tracing::debug!(node = %describe(tree, element), "falling back to text content");
                tree.text_content(element).trim().to_string()
            }
        };
        attach_source(&content, settings, page)
    }

    fn render(&self, tree: &DocumentTree, element: NodeId, format: OutputFormat) -> Option<String> {
        tree.element(element)?;
        let mut clone = create_visible_clone(tree, element, &self.visibility);
        remove_ui_elements(&mut clone);
        let root = clone_root(&clone)?;

        let content = match format {
            OutputFormat::Markdown if clone.subtree_depth(root) > MAX_MARKDOWN_DEPTH => {
                tracing::debug!(node = %describe(tree, element), "block nested too deeply for markdown, using plain text");
                convert_to_text(&clone, root)
            }
            OutputFormat::Markdown => {
                let html = clone.outer_html(root);
                match convert_to_markdown(&html, self.converter.as_ref()) {
                    Ok(markdown) => markdown,
                    Err(err) => {
                        tracing::debug!(error = %err, "markdown conversion failed, using plain text");
                        convert_to_text(&clone, root)
                    }
                }
            }
            OutputFormat::Plaintext => convert_to_text(&clone, root),
        };
        Some(content)
    }
}

/// Serializes with the default pruning rules and Markdown converter.
pub fn process_content(tree: &DocumentTree, element: NodeId, settings: &Settings, page: &PageInfo) -> String {
    ContentSerializer::default().process(tree, element, settings, page)
}

/// Detaches every injected UI element below the clone root.
fn remove_ui_elements(clone: &mut DocumentTree) {
    let Some(root) = clone_root(clone) else {
        return;
    };
    let injected: Vec<NodeId> = clone
        .descendants(root)
        .skip(1)
        .filter(|id| {
            clone
                .element(*id)
                .is_some_and(|el| el.attr(UI_MARKER_ATTRIBUTE).is_some() || el.has_class(UI_MARKER_CLASS))
        })
        .collect();

    for id in injected {
        clone.remove_subtree(id);
    }
}

/// Appends the localized source line when the settings ask for one.
///
/// Markdown output is block-quoted as a whole, source line included.
/// Plain text is left unquoted. When neither a title nor a URL is available
/// the content is returned unchanged.
pub fn attach_source(content: &str, settings: &Settings, page: &PageInfo) -> String {
    let title = page.title().filter(|_| settings.attach_title);
    let url = page.url().filter(|_| settings.attach_url);

    let info = match (settings.output_format, title, url) {
        (_, None, None) => return content.to_string(),
        (OutputFormat::Markdown, Some(title), Some(url)) => format!("[{}]({})", title, url),
        (OutputFormat::Markdown, None, Some(url)) => format!("<{}>", url),
        (OutputFormat::Plaintext, Some(title), Some(url)) => format!("{} ({})", title, url),
        (OutputFormat::Plaintext, None, Some(url)) => url.to_string(),
        (_, Some(title), None) => title.to_string(),
    };

    let label = i18n::resolve(settings.language).source_label();
    let line = format!("{}: {}", label, info);

    match settings.output_format {
        OutputFormat::Markdown => format!("{}{}{}", quote(content), SOURCE_SEPARATOR, quote(&line)),
        OutputFormat::Plaintext => format!("{}{}{}", content, SOURCE_SEPARATOR, line),
    }
}

/// Prefixes each line with `> `, or `>` when the line is blank.
fn quote(text: &str) -> String {
    text.lines()
        .map(|line| if line.trim().is_empty() { ">".to_string() } else { format!("> {}", line) })
        .collect::<Vec<_>>()
        .join("\n")
}
