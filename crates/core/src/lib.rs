#![deny(missing_docs)]
//! quillmark core: output nodes, content model, marks, options and errors.

/// Core error and diagnostic types.
pub mod error;
/// HTML output model: elements, content-model table, escaping.
pub mod html;
/// Protected spans and the per-document mark table.
pub mod mark;
/// Trailing modifier syntax.
pub mod modifier;
/// Engine configuration.
pub mod options;
/// Slug and element-id generation.
pub mod slug;

pub use error::{ParseDiagnostics, ParseWarning, QuillError};
pub use html::{AttrValue, Child, HtmlElement, NodeRef, NonTextContent};
pub use mark::{ContentType, Embedding, Mark, MarkTable};
pub use modifier::{HAlign, Modifier};
pub use options::{
    Allow, Balancing, CodeOptions, HeadingOptions, HtmlMode, HtmlOptions, Limits, Options,
    OutputOptions, UnderlineLevels,
};
pub use slug::{IdRegistry, webalize};
