//! High-level entry point tying the pipeline together.
//!
//! [`Clipper`] owns a [`ClipConfig`] and runs block identification, pruning
//! and serialization against a caller's tree. The free functions
//! [`copy_block`] and [`copy_block_from_snapshot`] cover the common one-shot
//! cases.
//!
//! # Example
//!
//! ```rust
//! use clipblock_core::{Settings, copy_block};
//!
//! let html = r#"<html><body><p id="intro">Hello <b>world</b></p></body></html>"#;
//! let copied = copy_block(html, "#intro", &Settings::plaintext()).unwrap();
//! assert_eq!(copied.as_deref(), Some("Hello world"));
//! ```

use std::sync::Arc;

use crate::dom_tree::{DocumentTree, NodeId};
use crate::editable::EditorExclusion;
use crate::formatters::{HtmdConverter, MarkdownConverter};
use crate::locator::{find_viable_block, promote_to_parent};
use crate::parse::Document;
use crate::serialize::{ContentSerializer, PageInfo};
use crate::settings::Settings;
use crate::snapshot::tree_from_snapshot;
use crate::viability::ViabilityConfig;
use crate::{ClipError, Result};

/// Configuration for the clipping pipeline.
///
/// # Example
///
/// ```rust
/// use clipblock_core::ClipConfig;
///
/// let config = ClipConfig::builder()
///     .opacity_threshold(0.1)
///     .min_block_size(40.0, 40.0)
///     .build();
/// assert_eq!(config.viability.min_width, 40.0);
/// ```
#[derive(Debug, Clone)]
pub struct ClipConfig {
    /// Visibility thresholds, size floor and editor exclusion.
    pub viability: ViabilityConfig,
    /// Markdown collaborator (default: [`HtmdConverter`]).
    pub converter: Arc<dyn MarkdownConverter>,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self { viability: ViabilityConfig::default(), converter: Arc::new(HtmdConverter) }
    }
}

impl ClipConfig {
    /// Creates a new builder for ClipConfig.
    pub fn builder() -> ClipConfigBuilder {
        ClipConfigBuilder::new()
    }
}

/// Builder for [`ClipConfig`].
pub struct ClipConfigBuilder {
    config: ClipConfig,
}

impl ClipConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ClipConfig::default() }
    }

    /// Sets the opacity at or below which elements are hidden.
    pub fn opacity_threshold(mut self, value: f64) -> Self {
        self.config.viability.visibility.opacity_threshold = value;
        self
    }

    /// Sets the `text-indent` at or below which text counts as off screen.
    pub fn text_indent_threshold(mut self, value: f64) -> Self {
        self.config.viability.visibility.text_indent_threshold = value;
        self
    }

    /// Replaces the screen-reader class fragments.
    pub fn screen_reader_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.viability.visibility.screen_reader_patterns =
            patterns.into_iter().map(|p| p.into().to_ascii_lowercase()).collect();
        self
    }

    /// Sets the minimum block width and height.
    pub fn min_block_size(mut self, width: f64, height: f64) -> Self {
        self.config.viability.min_width = width;
        self.config.viability.min_height = height;
        self
    }

    /// Sets the minimum text length of non-media blocks.
    pub fn min_text_length(mut self, value: usize) -> Self {
        self.config.viability.min_text_length = value;
        self
    }

    /// Sets the depth cap of the content search.
    pub fn max_content_depth(mut self, value: usize) -> Self {
        self.config.viability.max_content_depth = value;
        self
    }

    /// Sets the editor exclusion lists.
    pub fn editor_exclusion(mut self, editors: EditorExclusion) -> Self {
        self.config.viability.editors = editors;
        self
    }

    /// Sets the Markdown converter.
    pub fn markdown_converter(mut self, converter: Arc<dyn MarkdownConverter>) -> Self {
        self.config.converter = converter;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ClipConfig {
        self.config
    }
}

impl Default for ClipConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the clipping pipeline with one configuration.
#[derive(Debug, Clone)]
pub struct Clipper {
    config: ClipConfig,
    serializer: ContentSerializer,
}

impl Clipper {
    /// Creates a new Clipper with default settings.
    pub fn new() -> Self {
        Self::with_config(ClipConfig::default())
    }

    pub fn with_config(config: ClipConfig) -> Self {
        let serializer = ContentSerializer::new(config.viability.visibility.clone(), Arc::clone(&config.converter));
        Self { config, serializer }
    }

    pub fn config(&self) -> &ClipConfig {
        &self.config
    }

    /// The block to copy for an interaction target.
    pub fn locate(&self, tree: &DocumentTree, target: NodeId) -> Option<NodeId> {
        find_viable_block(tree, target, &self.config.viability)
    }

    /// Hit-tests a viewport point, then locates the block for the hit.
    pub fn locate_at(&self, tree: &DocumentTree, x: f64, y: f64) -> Option<NodeId> {
        let hit = tree.element_at(x, y)?;
        self.locate(tree, hit)
    }

    /// Widens a located block to its nearest viable ancestor.
    pub fn promote(&self, tree: &DocumentTree, block: NodeId) -> Option<NodeId> {
        promote_to_parent(tree, block, &self.config.viability)
    }

    /// Serializes a block, taking page info from the tree.
    pub fn process(&self, tree: &DocumentTree, element: NodeId, settings: &Settings) -> String {
        self.serializer.process(tree, element, settings, &PageInfo::from_tree(tree))
    }

    /// Serializes a block with explicit page info.
    pub fn process_with_page(
        &self, tree: &DocumentTree, element: NodeId, settings: &Settings, page: &PageInfo,
    ) -> String {
        self.serializer.process(tree, element, settings, page)
    }

    /// Locates and serializes. `None` means nothing on this target is worth copying.
    pub fn copy(&self, tree: &DocumentTree, target: NodeId, settings: &Settings) -> Option<String> {
        let block = self.locate(tree, target)?;
        Some(self.process(tree, block, settings))
    }
}

impl Default for Clipper {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies the block for the first element matching `selector` in `html`.
///
/// # Errors
///
/// Returns [`ClipError::InvalidSelector`] for a bad selector and
/// [`ClipError::NodeNotFound`] when nothing matches.
pub fn copy_block(html: &str, selector: &str, settings: &Settings) -> Result<Option<String>> {
    let doc = Document::parse(html)?;
    let target = doc
        .select_first(selector)?
        .ok_or_else(|| ClipError::NodeNotFound(selector.to_string()))?;
    Ok(Clipper::new().copy(doc.tree(), target, settings))
}

/// Copies the block under a viewport point of a layout snapshot.
///
/// # Errors
///
/// Returns [`ClipError::InvalidSnapshot`] for malformed snapshot JSON.
pub fn copy_block_from_snapshot(json: &str, x: f64, y: f64, settings: &Settings) -> Result<Option<String>> {
    let tree = tree_from_snapshot(json)?;
    let clipper = Clipper::new();
    Ok(clipper.locate_at(&tree, x, y).map(|block| clipper.process(&tree, block, settings)))
}
