//! Error types for clipblock operations.
//!
//! This module defines the main error type [`ClipError`] which represents
//! everything that can go wrong while loading a document, resolving a target,
//! reading settings or fetching input.
//!
//! The pipeline itself (locate, prune, serialize) does not surface errors to
//! its caller: classification failures are absorbed locally and serialization
//! degrades to plain text. Errors only escape from the loading and
//! configuration edges.
//!
//! # Example
//!
//! ```rust
//! use clipblock_core::{ClipError, Result};
//!
//! fn require_target(found: Option<usize>) -> Result<usize> {
//!     found.ok_or(ClipError::NodeNotFound("no element under the pointer".to_string()))
//! }
//! # assert!(require_target(None).is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for clipblock operations.
#[derive(Error, Debug)]
pub enum ClipError {
    /// HTTP request errors from reqwest.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A CSS or attribute selector could not be parsed.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// The layout snapshot is not valid JSON or does not match the expected shape.
    #[error("Invalid layout snapshot: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),

    /// A computed style value could not be interpreted.
    ///
    /// Raised by the typed accessors on [`crate::ComputedStyle`]. The
    /// classifiers catch it; callers only see it when they use the
    /// accessors directly.
    #[error("Invalid value for `{property}`: {value:?}")]
    InvalidStyle { property: &'static str, value: String },

    /// A node id or selector did not resolve to a node.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// The Markdown converter rejected its input.
    #[error("Conversion failed: {0}")]
    ConversionError(String),

    /// Settings file errors.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read/write errors.
    #[error("Failed to write to file: {0}")]
    WriteError(#[from] std::io::Error),
}

/// Result type alias for ClipError.
pub type Result<T> = std::result::Result<T, ClipError>;
