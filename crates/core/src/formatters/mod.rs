pub mod markdown;
pub mod text;

pub use markdown::{HtmdConverter, MarkdownConverter, convert_to_markdown, strip_non_content};
pub use text::{collapse_whitespace, convert_to_text, layout_text};
