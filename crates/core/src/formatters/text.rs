//! Plain-text rendering of a block.
//!
//! Text follows the rendered layout the way `innerText` does: block elements
//! start new lines, paragraphs and headings stand apart by a blank line,
//! table cells are tab separated and rows are lines. The result then goes
//! through [`collapse_whitespace`].

use crate::dom_tree::{DocumentTree, NodeData, NodeId};

const BLOCK_ELEMENTS: [&str; 27] = [
    "address",
    "article",
    "aside",
    "blockquote",
    "caption",
    "dd",
    "details",
    "dialog",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "pre",
    "section",
    "summary",
    "table",
    "ul",
];

/// Blocks surrounded by a blank line.
const PARAGRAPH_ELEMENTS: [&str; 7] = ["p", "h1", "h2", "h3", "h4", "h5", "h6"];

const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "head"];

enum Step {
    Enter(NodeId),
    Exit(NodeId),
}

/// Layout-aware text of the subtree at `id`, whitespace collapsed.
pub fn convert_to_text(tree: &DocumentTree, id: NodeId) -> String {
    collapse_whitespace(&layout_text(tree, id))
}

/// Layout-aware text of the subtree at `id`, before collapsing.
pub fn layout_text(tree: &DocumentTree, id: NodeId) -> String {
    let mut out = String::new();
    let mut pre_depth = 0usize;
    let mut stack = vec![Step::Enter(id)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(current) => {
                let Some(node) = tree.get(current) else {
                    continue;
                };
                match &node.data {
                    NodeData::Text(text) => {
                        if pre_depth > 0 {
                            out.push_str(text);
                        } else {
                            push_flowing(&mut out, text);
                        }
                    }
                    NodeData::Element(element) => {
                        let tag = element.tag_name.as_str();
                        if SKIPPED_ELEMENTS.contains(&tag) {
                            continue;
                        }
                        match tag {
                            "br" => out.push('\n'),
                            "tr" => break_lines(&mut out, 1),
                            "pre" => {
                                pre_depth += 1;
                                break_lines(&mut out, 1);
                            }
                            _ if PARAGRAPH_ELEMENTS.contains(&tag) => break_lines(&mut out, 2),
                            _ if BLOCK_ELEMENTS.contains(&tag) => break_lines(&mut out, 1),
                            _ => {}
                        }
                        stack.push(Step::Exit(current));
                        stack.extend(tree.children(current).iter().rev().map(|child| Step::Enter(*child)));
                    }
                    NodeData::Document => {
                        stack.extend(tree.children(current).iter().rev().map(|child| Step::Enter(*child)));
                    }
                }
            }
            Step::Exit(current) => {
                let tag = tree.tag_name(current).unwrap_or_default();
                match tag {
                    "td" | "th" => out.push('\t'),
                    "tr" => break_lines(&mut out, 1),
                    "pre" => {
                        pre_depth = pre_depth.saturating_sub(1);
                        break_lines(&mut out, 1);
                    }
                    _ if PARAGRAPH_ELEMENTS.contains(&tag) => break_lines(&mut out, 2),
                    _ if BLOCK_ELEMENTS.contains(&tag) => break_lines(&mut out, 1),
                    _ => {}
                }
            }
        }
    }

    out
}

/// Appends text outside `pre`, where source line breaks are just spaces.
fn push_flowing(out: &mut String, text: &str) {
    let mut pending_space = text.starts_with(char::is_whitespace);
    for word in text.split_whitespace() {
        if pending_space && !out.is_empty() && !out.ends_with(char::is_whitespace) {
            out.push(' ');
        }
        out.push_str(word);
        pending_space = true;
    }
    if text.ends_with(char::is_whitespace) && !out.is_empty() && !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

/// Makes sure the output ends with at least `count` line breaks.
fn break_lines(out: &mut String, count: usize) {
    if out.trim().is_empty() {
        return;
    }
    let trimmed_len = out.trim_end_matches([' ', '\t']).len();
    out.truncate(trimmed_len);
    let present = out.chars().rev().take_while(|c| *c == '\n').count();
    for _ in present..count {
        out.push('\n');
    }
}

/// Normalizes whitespace in extracted text.
///
/// Runs of horizontal whitespace become one space, every line is trimmed,
/// consecutive blank lines become exactly one, and the ends are trimmed.
/// Applying it twice gives the same result as applying it once.
pub fn collapse_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut blank_pending = false;

    for line in text.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            blank_pending = !lines.is_empty();
            continue;
        }
        if blank_pending {
            lines.push(String::new());
            blank_pending = false;
        }
        lines.push(collapsed);
    }

    lines.join("\n")
}
