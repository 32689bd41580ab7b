use std::fmt;

use crate::{ClipError, Result};

/// Tags whose content never reaches the Markdown output.
#[cfg(feature = "markdown")]
const SKIPPED_TAGS: [&str; 3] = ["script", "style", "noscript"];

/// Turns block markup into Markdown.
///
/// Implementations must be deterministic: the same markup always yields the
/// same text.
pub trait MarkdownConverter: fmt::Debug + Send + Sync {
    fn convert(&self, html: &str) -> Result<String>;
}

/// Converter backed by the `htmd` crate.
///
/// ATX headings, `---` rules, `-` bullets, fenced backtick code blocks,
/// inline links and two-space hard breaks.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmdConverter;

impl MarkdownConverter for HtmdConverter {
    fn convert(&self, html: &str) -> Result<String> {
        html_to_markdown(html)
    }
}

#[cfg(feature = "markdown")]
fn html_to_markdown(html: &str) -> Result<String> {
    use htmd::options::{
        BrStyle, BulletListMarker, CodeBlockFence, CodeBlockStyle, HeadingStyle, HrStyle, LinkStyle, Options,
    };

    let converter = htmd::HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            hr_style: HrStyle::Dashes,
            br_style: BrStyle::TwoSpaces,
            link_style: LinkStyle::Inlined,
            code_block_style: CodeBlockStyle::Fenced,
            code_block_fence: CodeBlockFence::Backticks,
            bullet_list_marker: BulletListMarker::Dash,
            ..Default::default()
        })
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();

    converter.convert(html).map_err(|e| ClipError::ConversionError(e.to_string()))
}

/// Fallback when the markdown feature is disabled: the markup's text.
#[cfg(not(feature = "markdown"))]
fn html_to_markdown(html: &str) -> Result<String> {
    let doc = scraper::Html::parse_fragment(html);
    Ok(doc.root_element().text().collect::<String>())
}

/// Converts block markup to Markdown with `converter`.
///
/// Script, style and noscript elements are removed before conversion, and the
/// result is trimmed.
///
/// # Errors
///
/// Returns [`ClipError::ConversionError`] if the markup cannot be rewritten or
/// the converter fails.
pub fn convert_to_markdown(html: &str, converter: &dyn MarkdownConverter) -> Result<String> {
    let cleaned = strip_non_content(html)?;
    let markdown = converter.convert(&cleaned)?;
    Ok(markdown.trim().to_string())
}

/// Removes script, style and noscript elements along with their content.
pub fn strip_non_content(html: &str) -> Result<String> {
    let mut output = Vec::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("script, style, noscript", |el| {
                el.remove();
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| ClipError::ConversionError(e.to_string()))?;
    rewriter.end().map_err(|e| ClipError::ConversionError(e.to_string()))?;

    String::from_utf8(output).map_err(|e| ClipError::ConversionError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md(html: &str) -> String {
        convert_to_markdown(html, &HtmdConverter).unwrap()
    }

    #[test]
    fn test_paragraph() {
        assert_eq!(md("<p>Hello</p>"), "Hello");
    }

    #[test]
    fn test_atx_headings() {
        let markdown = md("<div><h2>Title</h2><p>This is a paragraph.</p></div>");
        assert!(markdown.starts_with("## Title"));
        assert!(markdown.contains("This is a paragraph."));
    }

    #[test]
    fn test_emphasis_strong_and_line_breaks() {
        assert_eq!(md("<p>a <em>x</em> and <strong>y</strong><br>next</p>"), "a *x* and **y**  \nnext");
    }

    #[test]
    fn test_inline_links() {
        let markdown = md(r#"<p>Check out <a href="https://example.com">this link</a>.</p>"#);
        assert!(markdown.contains("[this link](https://example.com)"));
    }

    #[test]
    fn test_images() {
        let markdown = md(r#"<p>An image: <img src="photo.jpg" alt="A photo"></p>"#);
        assert!(markdown.contains("![A photo](photo.jpg)"));
    }

    #[test]
    fn test_dash_bullets() {
        let markdown = md("<ul><li>one</li><li>two</li></ul>");
        assert!(markdown.contains("- one"));
        assert!(markdown.contains("- two"));
    }

    #[test]
    fn test_fenced_code_blocks() {
        let markdown = md(r#"<pre><code>fn main() { println!("Hello"); }</code></pre>"#);
        assert!(markdown.contains("```"));
        assert!(markdown.contains("fn main()"));
    }

    #[test]
    fn test_dash_rule() {
        let markdown = md("<div><p>a</p><hr><p>b</p></div>");
        assert!(markdown.contains("---"));
        assert!(!markdown.contains("* * *"));
    }

    #[test]
    fn test_tables_keep_cells() {
        let markdown = md(r#"<table><thead><tr><th>Column 1</th></tr></thead>
            <tbody><tr><td>Data 1</td></tr></tbody></table>"#);
        assert!(markdown.contains("Column 1"));
        assert!(markdown.contains("Data 1"));
    }

    #[test]
    fn test_scripts_and_styles_removed() {
        let markdown = md("<div><script>var x = 1;</script><style>p{}</style><noscript>no js</noscript><p>Body</p></div>");
        assert_eq!(markdown, "Body");
    }

    #[test]
    fn test_strip_non_content_keeps_other_markup() {
        let stripped = strip_non_content("<p>a<script>b</script><em>c</em></p>").unwrap();
        assert_eq!(stripped, "<p>a<em>c</em></p>");
    }

    #[test]
    fn test_deterministic() {
        let html = "<article><h1>T</h1><p>One <strong>two</strong></p><ol><li>x</li></ol></article>";
        assert_eq!(md(html), md(html));
    }
}
