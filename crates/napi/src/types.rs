//! NAPI-exposed data structures.

use napi_derive::napi;

/// One heading of the table of contents.
#[napi(object)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocItem {
    /// Final heading level (1-6).
    pub level: u32,
    /// Plain-text heading title.
    pub title: String,
    /// Element id, explicit or generated.
    pub id: Option<String>,
}

/// Parse warning returned from Rust
#[napi(object)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarningEntry {
    /// Warning type (e.g., "disallowed_tag")
    pub warning_type: String,
    /// Human-readable message
    pub message: String,
}

/// Result of processing one document.
#[napi(object)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Sanitized HTML.
    pub html: String,
    /// Plain text of the first heading.
    pub title: Option<String>,
    /// Headings in document order.
    pub toc: Vec<TocItem>,
    /// `href` values of accepted links.
    pub links: Vec<String>,
    /// `src` values of accepted images.
    pub images: Vec<String>,
    /// Non-fatal warnings.
    pub warnings: Vec<ParseWarningEntry>,
}
