#![deny(missing_docs)]
//! quillmark engine: pattern registry, block and line parsers, handler chains and the bundled modules.

/// Per-document parse state and the values returned next to the HTML.
pub mod context;
/// Engine setup and the `process` entry points.
pub mod engine;
/// Typed handler chains (`beforeParse`, `afterParse` and the around events).
pub mod handler;
/// Module contract plus the code, heading and HTML modules.
pub mod modules;
/// Input normalization run before parsing.
pub mod normalize;
/// Pattern values and callback outcomes.
pub mod pattern;

mod parser;

pub use context::{Context, Rendered, Summary, TocEntry};
pub use engine::Engine;
pub use handler::{
    AroundEvent, Handler, Handlers, HeadingArgs, HeadingEvent, HtmlCommentArgs, HtmlCommentEvent,
    HtmlTagArgs, HtmlTagEvent, Invocation, ParagraphArgs, ParagraphEvent,
};
pub use modules::{CodeModule, HeadingModule, HtmlModule, Module};
pub use pattern::{Outcome, Pattern};
pub use quillmark_core;
