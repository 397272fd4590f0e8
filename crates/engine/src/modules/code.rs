//! Code spans: `` `text .[modifier]` ``. A backtick preceded by whitespace does
//! not close the span.
//!
//! A `` `=tag `` line switches the wrapping element for the rest of the document.

use super::Module;
use crate::context::Context;
use crate::engine::Engine;
use crate::pattern::{Outcome, Pattern};
use log::debug;
use quillmark_core::modifier::MODIFIER;
use quillmark_core::{HtmlElement, Modifier, QuillError};
use regex::Captures;

/// Registers the `code/switch` block pattern and the `code` line pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeModule;

impl Module for CodeModule {
    fn name(&self) -> &'static str {
        "code"
    }

    fn init(&self, engine: &mut Engine) -> Result<(), QuillError> {
        engine.register_block_pattern(Pattern::new(
            "code/switch",
            r"(?mi)^`=(none|code|kbd|samp|var|span)[ \t]*$",
            switch,
        )?)?;
        engine.register_line_pattern(Pattern::new(
            "code",
            format!(r"`(\S(?:[^\x13-\x1F]*?\S)?)(?:[ \t]+{MODIFIER})?`"),
            span,
        )?)
    }
}

fn switch(_engine: &Engine, ctx: &mut Context, caps: &Captures<'_>) -> Result<Outcome, QuillError> {
    let tag = caps[1].to_ascii_lowercase();
    debug!("code spans now render as {tag}");
    ctx.set_code_tag(&tag);
    Ok(Outcome::Text(String::new()))
}

fn span(engine: &Engine, ctx: &mut Context, caps: &Captures<'_>) -> Result<Outcome, QuillError> {
    let content = &caps[1];
    let tag = ctx.code_tag().unwrap_or(engine.options().code.tag.as_str());
    if tag == "none" {
        return Ok(Outcome::Text(content.to_string()));
    }
    let mut el = HtmlElement::new(tag)?;
    Modifier::parse(caps.get(2).map(|m| m.as_str())).decorate(&mut el, &engine.options().html);
    el.set_text(content);
    Ok(Outcome::Element(el))
}

#[cfg(test)]
mod tests {
    use quillmark_core::Options;

    use crate::Engine;

    fn render(text: &str) -> String {
        Engine::new(Options::default()).unwrap().process(text).unwrap()
    }

    #[test]
    fn span_content_is_escaped_and_opaque() {
        assert_eq!(
            render("use `<b>` here"),
            "<p>use <code>&lt;b&gt;</code> here</p>"
        );
    }

    #[test]
    fn modifier_applies_to_span() {
        assert_eq!(
            render("`x + 1 .[math]`"),
            r#"<p><code class="math">x + 1</code></p>"#
        );
    }

    #[test]
    fn backtick_after_space_does_not_close() {
        assert_eq!(render("`a ` b"), "<p>`a ` b</p>");
        assert_eq!(
            render("`a ` b` c"),
            "<p><code>a ` b</code> c</p>"
        );
    }

    #[test]
    fn span_may_cross_lines() {
        assert_eq!(render("x `a\nb` y"), "<p>x <code>a\nb</code> y</p>");
    }

    #[test]
    fn switch_changes_tag_for_later_spans() {
        assert_eq!(
            render("`a`\n\n`=kbd\n\n`b`\n\n`=NONE\n\n`c`"),
            "<p><code>a</code></p>\n<p><kbd>b</kbd></p>\n<p>c</p>"
        );
    }

    #[test]
    fn escaped_backtick_does_not_open_span() {
        assert_eq!(render(r"\`a` b"), "<p>`a` b</p>");
    }
}
