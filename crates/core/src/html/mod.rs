//! HTML output model: element tree, content-model table and escaping.

/// Static content-model table.
pub mod dtd;
/// Element tree and serialization.
pub mod element;
/// Text and attribute escaping.
pub mod escape;

pub use element::{AttrValue, Child, HtmlElement, NodeRef, NonTextContent};
pub use escape::{escape_attribute, escape_text};
