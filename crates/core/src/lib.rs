//! Copy the content block under the pointer as Markdown or plain text.
//!
//! The pipeline has three stages:
//!
//! 1. [`locator`] decides which element is the unit to copy, using the
//!    [`viability`] chain, the [`visibility`] rules and [`editable`] exclusion.
//! 2. [`prune`] clones that element into a detached tree holding only
//!    perceptible nodes.
//! 3. [`serialize`] renders the clone with the [`formatters`] and appends the
//!    source attachment described by [`Settings`].
//!
//! Documents come from HTML ([`parse`]) or from a layout snapshot taken by a
//! host with a rendering engine ([`snapshot`]).

pub mod clipper;
pub mod dom_tree;
pub mod editable;
pub mod error;
pub mod fetch;
pub mod formatters;
pub mod i18n;
pub mod locator;
pub mod parse;
pub mod prune;
pub mod serialize;
pub mod settings;
pub mod snapshot;
pub mod style;
pub mod viability;
pub mod visibility;

pub use clipper::{ClipConfig, ClipConfigBuilder, Clipper, copy_block, copy_block_from_snapshot};
pub use dom_tree::{BoxMetrics, DocumentTree, ElementData, MediaState, NodeData, NodeId, Rect, Viewport};
pub use editable::{EditorExclusion, EditorExclusionConfig, find_editable_context};
pub use error::{ClipError, Result};
#[cfg(feature = "fetch")]
pub use fetch::fetch_url;
pub use fetch::{FetchConfig, fetch_file, fetch_stdin, validate_url};
pub use formatters::{HtmdConverter, MarkdownConverter, collapse_whitespace};
pub use i18n::Locale;
pub use locator::{find_viable_block, promote_to_parent};
pub use parse::Document;
pub use prune::create_visible_clone;
pub use serialize::{ContentSerializer, PageInfo, attach_source, process_content};
pub use settings::{Language, OutputFormat, Settings, SettingsFile};
pub use snapshot::{Snapshot, tree_from_snapshot};
pub use style::ComputedStyle;
pub use viability::{ViabilityConfig, is_viable_block};
pub use visibility::{VisibilityConfig, is_hidden, is_hidden_for_pruning, try_is_hidden};
