//! Module contract and the bundled modules.
//!
//! A module registers patterns and handlers on an [`Engine`] during `init`.
//! Modules never call each other; they meet only in the engine's handler
//! chains and in the per-document [`Context`](crate::Context).

mod code;
mod heading;
mod html;
pub(crate) mod paragraph;

pub use code::CodeModule;
pub use heading::HeadingModule;
pub use html::HtmlModule;

use crate::engine::Engine;
use quillmark_core::QuillError;

/// A pluggable markup rule.
pub trait Module: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Registers the module's patterns and handlers.
    fn init(&self, engine: &mut Engine) -> Result<(), QuillError>;
}
