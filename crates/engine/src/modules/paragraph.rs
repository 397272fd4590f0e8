use crate::context::Context;
use crate::engine::Engine;
use crate::handler::ParagraphArgs;
use crate::pattern::Outcome;
use quillmark_core::{Embedding, HtmlElement, MarkTable, QuillError};

/// Default end of the `paragraph` chain: runs the line parser and wraps the
/// result in `<p>`, unless it already carries block-level content.
pub(crate) fn solve(
    engine: &Engine,
    ctx: &mut Context,
    args: ParagraphArgs,
) -> Result<Outcome, QuillError> {
    let content = engine.parse_line(ctx, args.content.trim(), Embedding::Inline { allow_block: true })?;
    if content.is_empty() || MarkTable::contains_block(&content) {
        return Ok(Outcome::Text(content));
    }
    Ok(Outcome::Element(HtmlElement::new("p")?.with_text(content)))
}
