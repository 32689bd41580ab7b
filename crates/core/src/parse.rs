//! HTML parsing into a [`DocumentTree`].
//!
//! This module provides the [`Document`] type, which parses markup with
//! `scraper` and converts it into the arena tree the pipeline works on.
//! Plain HTML carries no layout engine, so styles come from inline `style`
//! attributes plus a small user-agent table, and boxes are only known where
//! the markup states an absolute size.
//!
//! # Example
//!
//! ```rust
//! use clipblock_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <head><title>Title</title></head>
//!         <body><p class="content">Paragraph</p></body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! assert_eq!(doc.title(), Some("Title".to_string()));
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! ```

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::dom_tree::{BoxMetrics, DocumentTree, ElementData, MediaState, NodeData, NodeId, Viewport};
use crate::style::ComputedStyle;
use crate::{ClipError, Result};

/// Elements the user-agent stylesheet never renders.
const UA_HIDDEN_TAGS: [&str; 8] = ["head", "script", "style", "meta", "link", "title", "template", "base"];

/// Elements whose `width`/`height` attributes size their box.
const SIZED_BY_ATTRIBUTES: [&str; 7] = ["img", "video", "canvas", "svg", "embed", "object", "iframe"];

/// A parsed HTML document.
///
/// Keeps the `scraper` parse for selector matching next to the converted
/// [`DocumentTree`].
pub struct Document {
    html: Html,
    tree: DocumentTree,
}

/// Style state inherited from ancestors during conversion.
#[derive(Clone, Default)]
struct Inherited {
    visibility: Option<String>,
    unrendered: bool,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// Parsing follows the HTML5 recovery rules, so malformed markup still
    /// yields a document. The `Result` keeps the signature aligned with
    /// [`Document::parse_with_url`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use clipblock_core::parse::Document;
    ///
    /// let doc = Document::parse("<html><body><h1>Title</h1></body></html>").unwrap();
    /// assert!(doc.tree().body().is_some());
    /// ```
    pub fn parse(html: &str) -> Result<Self> {
        let parsed = Html::parse_document(html);
        let tree = convert(&parsed, Viewport::default());
        Ok(Self { html: parsed, tree })
    }

    /// Parses HTML and records the page URL used for source attachment.
    ///
    /// # Errors
    ///
    /// Returns [`ClipError::InvalidUrl`] if the URL cannot be parsed.
    pub fn parse_with_url(html: &str, url: &str) -> Result<Self> {
        let parsed_url = Url::parse(url).map_err(|e| ClipError::InvalidUrl(format!("{}: {}", url, e)))?;
        let mut doc = Self::parse(html)?;
        doc.tree.set_url(Some(parsed_url.to_string()));
        Ok(doc)
    }

    /// The converted tree.
    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DocumentTree {
        &mut self.tree
    }

    pub fn into_tree(self) -> DocumentTree {
        self.tree
    }

    /// Gets the title of the document.
    pub fn title(&self) -> Option<String> {
        self.tree.title().map(str::to_string)
    }

    /// Resolves a CSS selector to nodes of the converted tree, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`ClipError::InvalidSelector`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeId>> {
        let sel = Selector::parse(selector).map_err(|e| ClipError::InvalidSelector(format!("{}: {}", selector, e)))?;

        Ok(self
            .html
            .select(&sel)
            .filter_map(|element| self.locate(element))
            .collect())
    }

    /// First node matching a CSS selector.
    pub fn select_first(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.select(selector)?.into_iter().next())
    }

    /// Maps a scraper element to the converted tree by following its
    /// element-sibling index path from the document node.
    fn locate(&self, element: ElementRef<'_>) -> Option<NodeId> {
        let mut path = Vec::new();
        let mut current = *element;
        loop {
            if current.value().is_document() {
                break;
            }
            path.push(current.prev_siblings().filter(|s| s.value().is_element()).count());
            current = current.parent()?;
        }

        let mut id = self.tree.root();
        for index in path.into_iter().rev() {
            id = self.tree.element_children(id).nth(index)?;
        }
        Some(id)
    }
}

fn convert(html: &Html, viewport: Viewport) -> DocumentTree {
    let mut tree = DocumentTree::new(viewport);
    let mut stack: Vec<_> = html
        .tree
        .root()
        .children()
        .rev()
        .map(|child| (child, tree.root(), Inherited::default()))
        .collect();

    while let Some((node, parent, inherited)) = stack.pop() {
        match node.value() {
            Node::Text(text) => {
                tree.append_text(parent, text);
            }
            Node::Element(element) => {
                let (data, inherited) = element_data(element, &inherited);
                let id = tree.append_element(parent, data);
                for child in node.children().rev() {
                    stack.push((child, id, inherited.clone()));
                }
            }
            _ => {}
        }
    }

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| html.select(&sel).next().map(|el| el.text().collect::<String>().trim().to_string()))
        .filter(|title| !title.is_empty());
    tree.set_title(title);

    tree
}

fn element_data(element: &scraper::node::Element, inherited: &Inherited) -> (ElementData, Inherited) {
    let mut data = ElementData::new(element.name());
    for (name, value) in element.attrs() {
        data.attributes.push((name.to_string(), value.to_string()));
    }

    let mut style = match data.attr("style") {
        Some(inline) => ComputedStyle::from_inline(inline),
        None => ComputedStyle::default(),
    };

    if style.display.is_none() && (UA_HIDDEN_TAGS.contains(&data.tag_name.as_str()) || data.attr("hidden").is_some())
    {
        style.display = Some("none".to_string());
    }
    if style.visibility.is_none() {
        style.visibility = inherited.visibility.clone();
    }

    let unrendered = inherited.unrendered || style.is_display_none();
    data.layout = if unrendered { Some(BoxMetrics::zero()) } else { declared_box(&data, &style) };
    data.media = media_state(&data);
    data.style = style;

    let next = Inherited { visibility: data.style.visibility.clone(), unrendered };
    (data, next)
}

fn declared_box(data: &ElementData, style: &ComputedStyle) -> Option<BoxMetrics> {
    let sized_by_attrs = SIZED_BY_ATTRIBUTES.contains(&data.tag_name.as_str());
    let dimension = |css: Option<f64>, attr: &str| {
        css.or_else(|| {
            if sized_by_attrs { data.attr(attr).and_then(|v| v.trim().trim_end_matches("px").parse().ok()) } else { None }
        })
    };

    let width = dimension(style.width_px(), "width")?;
    let height = dimension(style.height_px(), "height")?;
    Some(BoxMetrics::sized(width, height))
}

fn media_state(data: &ElementData) -> MediaState {
    let number = |name: &str| data.attr(name).and_then(|v| v.trim().parse::<f64>().ok());
    let mut state = MediaState {
        natural_width: number("data-natural-width"),
        natural_height: number("data-natural-height"),
        ready: data.attr("data-ready").map(|v| !v.eq_ignore_ascii_case("false")),
    };

    if data.tag_name == "img" {
        let has_source = ["src", "srcset"]
            .iter()
            .any(|name| data.attr(name).is_some_and(|v| !v.trim().is_empty()));
        if !has_source {
            state.natural_width = Some(0.0);
            state.natural_height = Some(0.0);
        }
    }

    state
}

impl From<Document> for DocumentTree {
    fn from(doc: Document) -> Self {
        doc.tree
    }
}

/// Debug helper: the payload kind of a node, used in log lines.
pub(crate) fn describe(tree: &DocumentTree, id: NodeId) -> String {
    match tree.get(id).map(|node| &node.data) {
        Some(NodeData::Element(element)) => match element.attr("id") {
            Some(html_id) => format!("<{}#{}>", element.tag_name, html_id),
            None => format!("<{}>", element.tag_name),
        },
        Some(NodeData::Text(_)) => "#text".to_string(),
        Some(NodeData::Document) => "#document".to_string(),
        None => "#missing".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page</title>
        </head>
        <body>
            <!-- a comment -->
            <h1>Heading</h1>
            <p class="content">Paragraph 1</p>
            <p class="content">Paragraph 2</p>
            <div style="visibility: hidden"><span id="inner">Ghost</span></div>
            <div style="display:none"><p id="buried">Buried</p></div>
            <img id="sized" src="a.png" width="40" height="30">
            <img id="empty">
            <a href="https://example.com">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("p.content").unwrap();
        let tree = doc.tree();

        assert_eq!(elements.len(), 2);
        assert_eq!(tree.text_content(elements[0]), "Paragraph 1");
        assert_eq!(tree.text_content(elements[1]), "Paragraph 2");
    }

    #[test]
    fn test_element_attributes() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let link = doc.select_first("a").unwrap().unwrap();
        assert_eq!(doc.tree().attr(link, "href"), Some("https://example.com"));
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(ClipError::InvalidSelector(_))));
    }

    #[test]
    fn test_comments_dropped() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let body = doc.tree().body().unwrap();
        assert!(!doc.tree().outer_html(body).contains("a comment"));
    }

    #[test]
    fn test_user_agent_hidden_tags() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let head = doc.select_first("head").unwrap().unwrap();
        assert!(doc.tree().element(head).unwrap().style.is_display_none());
    }

    #[test]
    fn test_visibility_is_inherited() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let inner = doc.select_first("#inner").unwrap().unwrap();
        assert!(doc.tree().element(inner).unwrap().style.is_visibility_hidden());
    }

    #[test]
    fn test_descendants_of_display_none_get_zero_box() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let buried = doc.select_first("#buried").unwrap().unwrap();
        let layout = doc.tree().element(buried).unwrap().layout.unwrap();
        assert!(layout.is_zero());
    }

    #[test]
    fn test_declared_sizes_and_media_state() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let tree = doc.tree();

        let sized = doc.select_first("#sized").unwrap().unwrap();
        let layout = tree.element(sized).unwrap().layout.unwrap();
        assert_eq!((layout.rect.width, layout.rect.height), (40.0, 30.0));
        assert_eq!(tree.element(sized).unwrap().media.natural_width, None);

        let empty = doc.select_first("#empty").unwrap().unwrap();
        assert_eq!(tree.element(empty).unwrap().media.natural_width, Some(0.0));

        let heading = doc.select_first("h1").unwrap().unwrap();
        assert!(tree.element(heading).unwrap().layout.is_none());
    }

    #[test]
    fn test_malformed_markup_still_parses() {
        for html in ["", "<<<>>>", "<div><p>unclosed <b>tags", "</body></html><td>stray"] {
            let doc = Document::parse(html).unwrap();
            assert!(doc.tree().body().is_some());
        }

        let doc = Document::parse("<div><p>unclosed <b>tags").unwrap();
        assert_eq!(doc.tree().text_content(doc.tree().root()), "unclosed tags");
    }

    #[test]
    fn test_parse_with_url() {
        let doc = Document::parse_with_url("<p>x</p>", "https://x.test/").unwrap();
        assert_eq!(doc.tree().url(), Some("https://x.test/"));
        assert!(matches!(
            Document::parse_with_url("<p>x</p>", "not a url"),
            Err(ClipError::InvalidUrl(_))
        ));
    }
}
