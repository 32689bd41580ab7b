//! Perceptual visibility of a single element.
//!
//! Every rule here targets one CSS idiom authors use to hide things from
//! sighted users. An element is hidden as soon as any rule fires. Rules that
//! need to parse a style value can fail; a failing rule does not stop the
//! others from being checked, and the error only surfaces through the `try_`
//! functions when nothing fired.

use std::fmt;

use crate::dom_tree::{DocumentTree, ElementData, NodeId, Viewport};
use crate::{ClipError, Result};

/// Opacity at or below which an element counts as invisible.
pub const OPACITY_THRESHOLD: f64 = 0.05;

/// `text-indent` at or below which text is pushed off screen.
pub const TEXT_INDENT_THRESHOLD: f64 = -9999.0;

/// Class-name fragments used by screen-reader-only utility classes.
pub const SCREEN_READER_PATTERNS: [&str; 5] =
    ["sr-only", "screen-reader", "visually-hidden", "visuallyhidden", "a11y-hidden"];

/// Media elements that may report an empty box before they load.
const LATE_SIZED_TAGS: [&str; 2] = ["img", "video"];

/// Tunable thresholds and pattern table for the visibility rules.
#[derive(Debug, Clone)]
pub struct VisibilityConfig {
    pub opacity_threshold: f64,
    pub text_indent_threshold: f64,
    /// Lowercase fragments matched against each class token
    pub screen_reader_patterns: Vec<String>,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            opacity_threshold: OPACITY_THRESHOLD,
            text_indent_threshold: TEXT_INDENT_THRESHOLD,
            screen_reader_patterns: SCREEN_READER_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Which rule judged an element hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenReason {
    AriaHidden,
    PresentationRole,
    ScreenReaderOnly,
    NotRendered,
    Transparent,
    Collapsed,
    Clipped,
    TextIndent,
    ZeroSize,
    OutsideViewport,
}

impl fmt::Display for HiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AriaHidden => "aria-hidden",
            Self::PresentationRole => "presentation role",
            Self::ScreenReaderOnly => "screen-reader-only class",
            Self::NotRendered => "display/visibility",
            Self::Transparent => "opacity",
            Self::Collapsed => "zero scale",
            Self::Clipped => "clipped",
            Self::TextIndent => "text-indent",
            Self::ZeroSize => "zero size",
            Self::OutsideViewport => "outside viewport",
        };
        f.write_str(label)
    }
}

/// Is the node hidden? Rules 1 to 9; unreadable values count as visible.
pub fn is_hidden(tree: &DocumentTree, id: NodeId, config: &VisibilityConfig) -> bool {
    try_is_hidden(tree, id, config).unwrap_or(false)
}

/// Is the node hidden for pruning purposes? Adds the off-viewport rule.
///
/// Unreadable values count as visible, so nothing is pruned on a guess.
pub fn is_hidden_for_pruning(tree: &DocumentTree, id: NodeId, config: &VisibilityConfig) -> bool {
    match hidden_reason(tree, id, config, true) {
        Ok(reason) => reason.is_some(),
        Err(err) => {
            tracing::trace!(error = %err, "keeping node with unreadable style");
            false
        }
    }
}

/// Fallible form of [`is_hidden`].
///
/// # Errors
///
/// Returns the first [`ClipError::InvalidStyle`] met when no rule fired.
pub fn try_is_hidden(tree: &DocumentTree, id: NodeId, config: &VisibilityConfig) -> Result<bool> {
    Ok(hidden_reason(tree, id, config, false)?.is_some())
}

/// The first rule that hides the node, if any.
///
/// `pruning` enables the off-viewport rule. Text and document nodes are
/// never hidden.
pub fn hidden_reason(
    tree: &DocumentTree, id: NodeId, config: &VisibilityConfig, pruning: bool,
) -> Result<Option<HiddenReason>> {
    let Some(element) = tree.element(id) else {
        return Ok(None);
    };

    if let Some(reason) = attribute_rules(element, config) {
        return Ok(Some(reason));
    }

    let mut first_error: Option<ClipError> = None;
    let mut check = |outcome: Result<Option<HiddenReason>>| match outcome {
        Ok(reason) => reason,
        Err(err) => {
            first_error.get_or_insert(err);
            None
        }
    };

    let reason = check(Ok(rendering_rule(element)))
        .or_else(|| check(opacity_rule(element, config)))
        .or_else(|| check(scale_rule(element)))
        .or_else(|| check(clip_rule(element)))
        .or_else(|| check(text_indent_rule(element, config)))
        .or_else(|| check(Ok(zero_size_rule(element))))
        .or_else(|| if pruning { check(Ok(viewport_rule(element, tree.viewport()))) } else { None });

    match (reason, first_error) {
        (Some(reason), _) => Ok(Some(reason)),
        (None, Some(err)) => Err(err),
        (None, None) => Ok(None),
    }
}

/// Rules 1 to 3: ARIA state and utility classes.
fn attribute_rules(element: &ElementData, config: &VisibilityConfig) -> Option<HiddenReason> {
    if element.attr("aria-hidden").is_some_and(|v| v.trim().eq_ignore_ascii_case("true")) {
        return Some(HiddenReason::AriaHidden);
    }

    if element
        .attr("role")
        .is_some_and(|role| matches!(role.trim().to_ascii_lowercase().as_str(), "presentation" | "none"))
    {
        return Some(HiddenReason::PresentationRole);
    }

    let screen_reader_only = element.class_tokens().any(|token| {
        let token = token.to_ascii_lowercase();
        config.screen_reader_patterns.iter().any(|pattern| token.contains(pattern.as_str()))
    });
    if screen_reader_only {
        return Some(HiddenReason::ScreenReaderOnly);
    }

    None
}

fn rendering_rule(element: &ElementData) -> Option<HiddenReason> {
    (element.style.is_display_none() || element.style.is_visibility_hidden()).then_some(HiddenReason::NotRendered)
}

fn opacity_rule(element: &ElementData, config: &VisibilityConfig) -> Result<Option<HiddenReason>> {
    let transparent = element.style.opacity()?.is_some_and(|opacity| opacity <= config.opacity_threshold);
    Ok(transparent.then_some(HiddenReason::Transparent))
}

fn scale_rule(element: &ElementData) -> Result<Option<HiddenReason>> {
    let collapsed = element.style.has_zero_scale()? || element.style.has_zero_filter_opacity()?;
    Ok(collapsed.then_some(HiddenReason::Collapsed))
}

fn clip_rule(element: &ElementData) -> Result<Option<HiddenReason>> {
    let box_size = element.layout.map(|layout| (layout.rect.width, layout.rect.height));
    let clipped = element.style.has_empty_clip()? || element.style.clip_path_covers_box(box_size)?;
    Ok(clipped.then_some(HiddenReason::Clipped))
}

fn text_indent_rule(element: &ElementData, config: &VisibilityConfig) -> Result<Option<HiddenReason>> {
    let off_screen = element
        .style
        .text_indent_px()?
        .is_some_and(|indent| indent <= config.text_indent_threshold);
    Ok(off_screen.then_some(HiddenReason::TextIndent))
}

fn zero_size_rule(element: &ElementData) -> Option<HiddenReason> {
    if LATE_SIZED_TAGS.contains(&element.tag_name.as_str()) {
        return None;
    }
    element.layout.is_some_and(|layout| layout.is_zero()).then_some(HiddenReason::ZeroSize)
}

fn viewport_rule(element: &ElementData, viewport: Viewport) -> Option<HiddenReason> {
    let rect = element.layout?.rect;
    let has_box = rect.width > 0.0 && rect.height > 0.0;
    (has_box && (rect.y >= viewport.height || rect.x >= viewport.width)).then_some(HiddenReason::OutsideViewport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom_tree::{BoxMetrics, ElementData, Rect};
    use crate::style::ComputedStyle;
    use rstest::rstest;

    fn single(element: ElementData) -> (DocumentTree, NodeId) {
        let mut tree = DocumentTree::new(Viewport { width: 1000.0, height: 800.0 });
        let root = tree.root();
        let id = tree.append_element(root, element);
        (tree, id)
    }

    fn styled(css: &str) -> ElementData {
        ElementData::new("div").with_style(ComputedStyle::from_inline(css))
    }

    fn reason(element: ElementData) -> Option<HiddenReason> {
        let (tree, id) = single(element);
        hidden_reason(&tree, id, &VisibilityConfig::default(), false).unwrap()
    }

    #[rstest]
    #[case(ElementData::new("div").with_attr("aria-hidden", "TRUE"), HiddenReason::AriaHidden)]
    #[case(ElementData::new("div").with_attr("role", "presentation"), HiddenReason::PresentationRole)]
    #[case(ElementData::new("div").with_attr("role", "none"), HiddenReason::PresentationRole)]
    #[case(ElementData::new("span").with_attr("class", "label SR-Only"), HiddenReason::ScreenReaderOnly)]
    #[case(ElementData::new("span").with_attr("class", "u-visually-hidden"), HiddenReason::ScreenReaderOnly)]
    #[case(styled("display: none"), HiddenReason::NotRendered)]
    #[case(styled("visibility: hidden"), HiddenReason::NotRendered)]
    #[case(styled("opacity: 0"), HiddenReason::Transparent)]
    #[case(styled("opacity: 0.05"), HiddenReason::Transparent)]
    #[case(styled("transform: scale(0)"), HiddenReason::Collapsed)]
    #[case(styled("filter: opacity(0)"), HiddenReason::Collapsed)]
    #[case(styled("clip: rect(0px, 0px, 0px, 0px)"), HiddenReason::Clipped)]
    #[case(styled("clip-path: inset(50%)"), HiddenReason::Clipped)]
    #[case(styled("text-indent: -9999px"), HiddenReason::TextIndent)]
    #[case(ElementData::new("span").with_layout(BoxMetrics::zero()), HiddenReason::ZeroSize)]
    fn test_hidden_rules(#[case] element: ElementData, #[case] expected: HiddenReason) {
        assert_eq!(reason(element), Some(expected));
    }

    #[rstest]
    #[case(ElementData::new("div").with_attr("aria-hidden", "false"))]
    #[case(ElementData::new("div").with_attr("role", "region"))]
    #[case(ElementData::new("div").with_attr("class", "sorted"))]
    #[case(styled("opacity: 0.06"))]
    #[case(styled("transform: rotate(90deg)"))]
    #[case(styled("text-indent: 2em"))]
    #[case(ElementData::new("img").with_layout(BoxMetrics::zero()))]
    #[case(ElementData::new("video").with_layout(BoxMetrics::zero()))]
    #[case(ElementData::new("div"))]
    fn test_visible_cases(#[case] element: ElementData) {
        assert_eq!(reason(element), None);
    }

    #[test]
    fn test_display_none_wins_regardless_of_other_values() {
        let element = styled("display: none; opacity: 1");
        let (tree, id) = single(element);
        assert!(is_hidden(&tree, id, &VisibilityConfig::default()));
    }

    #[test]
    fn test_aria_hidden_beats_display_block() {
        let element = styled("display: block").with_attr("aria-hidden", "true");
        let (tree, id) = single(element);
        assert!(is_hidden(&tree, id, &VisibilityConfig::default()));
    }

    #[test]
    fn test_malformed_value_reports_error_but_is_visible() {
        let (tree, id) = single(styled("opacity: banana"));
        let config = VisibilityConfig::default();
        assert!(try_is_hidden(&tree, id, &config).is_err());
        assert!(!is_hidden(&tree, id, &config));
        assert!(!is_hidden_for_pruning(&tree, id, &config));
    }

    #[test]
    fn test_malformed_value_does_not_mask_other_rules() {
        let (tree, id) = single(styled("opacity: banana; text-indent: -10000px"));
        assert!(try_is_hidden(&tree, id, &VisibilityConfig::default()).unwrap());
    }

    #[test]
    fn test_viewport_rule_only_when_pruning() {
        let below = ElementData::new("p")
            .with_layout(BoxMetrics { rect: Rect::new(0.0, 900.0, 200.0, 20.0), ..BoxMetrics::sized(200.0, 20.0) });
        let (tree, id) = single(below);
        let config = VisibilityConfig::default();

        assert!(!is_hidden(&tree, id, &config));
        assert!(is_hidden_for_pruning(&tree, id, &config));
        assert_eq!(hidden_reason(&tree, id, &config, true).unwrap(), Some(HiddenReason::OutsideViewport));
    }

    #[test]
    fn test_viewport_rule_ignores_boxless_elements() {
        let right = ElementData::new("p").with_layout(BoxMetrics {
            rect: Rect::new(1200.0, 0.0, 0.0, 20.0),
            content_width: 0.0,
            content_height: 20.0,
        });
        let (tree, id) = single(right);
        assert!(!is_hidden_for_pruning(&tree, id, &VisibilityConfig::default()));
    }

    #[test]
    fn test_custom_threshold() {
        let (tree, id) = single(styled("opacity: 0.2"));
        let config = VisibilityConfig { opacity_threshold: 0.25, ..Default::default() };
        assert!(is_hidden(&tree, id, &config));
        assert!(!is_hidden(&tree, id, &VisibilityConfig::default()));
    }

    #[test]
    fn test_text_nodes_never_hidden() {
        let mut tree = DocumentTree::new(Viewport::default());
        let root = tree.root();
        let text = tree.append_text(root, "   ");
        assert!(!is_hidden(&tree, text, &VisibilityConfig::default()));
    }
}
