//! Engine and pattern registry.

use crate::context::{Context, Rendered};
use crate::handler::{self, AroundEvent, DefaultFn, Handler, Handlers};
use crate::modules::{CodeModule, HeadingModule, HtmlModule, Module};
use crate::normalize::normalize;
use crate::parser;
use crate::pattern::{Outcome, Pattern, RegisteredPattern, insert_by_priority};
use log::{debug, warn};
use quillmark_core::{Embedding, HtmlElement, Options, ParseWarning, QuillError};

/// Immutable-after-setup compiler: configuration, the two ordered pattern
/// sequences and the handler chains.
///
/// Setup (`register_*`, `add_handler`) takes `&mut self`; processing takes
/// `&self` and allocates a fresh [`Context`] per document, so one engine can be
/// shared across threads.
///
/// ```
/// use quillmark_engine::Engine;
///
/// let engine = Engine::new(Default::default()).unwrap();
/// let html = engine.process("Hello `world`").unwrap();
/// assert_eq!(html, "<p>Hello <code>world</code></p>");
/// ```
#[derive(Clone)]
pub struct Engine {
    options: Options,
    block_patterns: Vec<RegisteredPattern>,
    line_patterns: Vec<RegisteredPattern>,
    handlers: Handlers,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |list: &[RegisteredPattern]| -> Vec<String> {
            list.iter().map(|p| p.pattern.name().to_string()).collect()
        };
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("block_patterns", &names(&self.block_patterns))
            .field("line_patterns", &names(&self.line_patterns))
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Engine with the bundled code, heading and HTML modules.
    pub fn new(options: Options) -> Result<Self, QuillError> {
        let mut engine = Self::bare(options)?;
        engine.register_module(&CodeModule)?;
        engine.register_module(&HeadingModule)?;
        engine.register_module(&HtmlModule)?;
        Ok(engine)
    }

    /// Engine without any module: paragraphs hold escaped text only.
    pub fn bare(options: Options) -> Result<Self, QuillError> {
        options.validate()?;
        Ok(Self {
            options,
            block_patterns: Vec::new(),
            line_patterns: Vec::new(),
            handlers: Handlers::default(),
        })
    }

    /// Configuration.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Handler chains.
    pub fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    /// Lets a module register its patterns and handlers.
    pub fn register_module(&mut self, module: &dyn Module) -> Result<(), QuillError> {
        debug!("registering module {}", module.name());
        module.init(self)
    }

    /// Adds a block pattern. Block patterns match at the start of a line.
    pub fn register_block_pattern(&mut self, pattern: Pattern) -> Result<(), QuillError> {
        let registered = RegisteredPattern::block(pattern)?;
        insert_by_priority(&mut self.block_patterns, registered);
        Ok(())
    }

    /// Adds a line pattern.
    pub fn register_line_pattern(&mut self, pattern: Pattern) -> Result<(), QuillError> {
        insert_by_priority(&mut self.line_patterns, RegisteredPattern::line(pattern));
        Ok(())
    }

    /// Removes every block and line pattern called `name`. Returns true if any was removed.
    pub fn unregister_pattern(&mut self, name: &str) -> bool {
        let before = self.block_patterns.len() + self.line_patterns.len();
        self.block_patterns.retain(|p| p.pattern.name() != name);
        self.line_patterns.retain(|p| p.pattern.name() != name);
        before != self.block_patterns.len() + self.line_patterns.len()
    }

    /// Names of the block patterns in matching order.
    pub fn block_pattern_names(&self) -> Vec<&str> {
        self.block_patterns.iter().map(|p| p.pattern.name()).collect()
    }

    /// Names of the line patterns in matching order.
    pub fn line_pattern_names(&self) -> Vec<&str> {
        self.line_patterns.iter().map(|p| p.pattern.name()).collect()
    }

    pub(crate) fn block_patterns(&self) -> &[RegisteredPattern] {
        &self.block_patterns
    }

    pub(crate) fn line_patterns(&self) -> &[RegisteredPattern] {
        &self.line_patterns
    }

    /// Appends a handler to its event's chain.
    pub fn add_handler(&mut self, handler: Handler) {
        debug!("adding {} handler", handler.event_name());
        self.handlers.add(handler);
    }

    /// Runs the around chain of event `E`, falling back to `default`.
    pub fn invoke_around<E: AroundEvent>(
        &self,
        ctx: &mut Context,
        args: E::Args,
        default: DefaultFn<'_, E::Args>,
    ) -> Result<Outcome, QuillError> {
        handler::run_around::<E>(self, ctx, args, default)
    }

    /// Fresh per-document state.
    pub fn new_context(&self) -> Context {
        Context::new(&self.options)
    }

    /// Converts a document to HTML.
    pub fn process(&self, text: &str) -> Result<String, QuillError> {
        self.process_document(text).map(|rendered| rendered.html)
    }

    /// Converts a document to HTML and returns title, TOC, summary and warnings too.
    pub fn process_document(&self, text: &str) -> Result<Rendered, QuillError> {
        self.run(text, false)
    }

    /// Converts a single line: only line patterns run, headings are not balanced.
    pub fn process_line(&self, text: &str) -> Result<Rendered, QuillError> {
        self.run(text, true)
    }

    fn run(&self, input: &str, single_line: bool) -> Result<Rendered, QuillError> {
        let mut ctx = self.new_context();
        let normalized = normalize(input, self.options.limits.tab_width);
        if normalized.stripped > 0 {
            warn!(
                "removed {} reserved control character(s) from input",
                normalized.stripped
            );
            ctx.warn(ParseWarning::ReservedCharacters {
                count: normalized.stripped,
            });
        }
        let mut text = normalized.text;

        for handler in &self.handlers.before_parse {
            handler(self, &mut ctx, &mut text)?;
        }

        let mut root = HtmlElement::fragment();
        if single_line {
            let line = self.parse_line(&mut ctx, &text, Embedding::Inline { allow_block: false })?;
            root.set_text(line);
        } else {
            self.parse_block_into(&mut ctx, &mut root, &text)?;
        }

        for handler in &self.handlers.after_parse {
            handler(self, &mut ctx, &mut root, single_line)?;
        }

        ctx.finish(&root.to_html(self.options.output))
    }

    /// Parses `text` with the block parser into a new fragment.
    pub fn parse_block(&self, ctx: &mut Context, text: &str) -> Result<HtmlElement, QuillError> {
        let mut fragment = HtmlElement::fragment();
        self.parse_block_into(ctx, &mut fragment, text)?;
        Ok(fragment)
    }

    /// Parses `text` with the block parser, appending the blocks to `parent`.
    pub fn parse_block_into(
        &self,
        ctx: &mut Context,
        parent: &mut HtmlElement,
        text: &str,
    ) -> Result<(), QuillError> {
        ctx.nested(|ctx| parser::block::parse(self, ctx, parent, text))
    }

    /// Parses `text` with the line parser. The result is literal text with
    /// placeholder tokens for every matched construct.
    pub fn parse_line(
        &self,
        ctx: &mut Context,
        text: &str,
        embedding: Embedding,
    ) -> Result<String, QuillError> {
        ctx.nested(|ctx| parser::line::parse(self, ctx, text, embedding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn invalid_options_fail_fast() {
        let mut options = Options::default();
        options.heading.top = 0;
        assert!(Engine::new(options).is_err());
    }

    #[test]
    fn bundled_patterns_are_registered() {
        let engine = Engine::new(Options::default()).unwrap();
        assert_eq!(
            engine.block_pattern_names(),
            vec!["code/switch", "heading/underlined", "heading/surrounded"]
        );
        assert_eq!(engine.line_pattern_names(), vec!["code", "html"]);
    }

    #[test]
    fn unregister_removes_by_name() {
        let mut engine = Engine::new(Options::default()).unwrap();
        assert!(engine.unregister_pattern("heading/surrounded"));
        assert!(!engine.unregister_pattern("heading/surrounded"));
        assert_eq!(engine.process("## Title").unwrap(), "<p>## Title</p>");
    }

    #[test]
    fn bare_engine_escapes_everything() {
        let engine = Engine::bare(Options::default()).unwrap();
        assert_eq!(
            engine.process("a <b> & `c`").unwrap(),
            "<p>a &lt;b&gt; &amp; `c`</p>"
        );
    }
}
