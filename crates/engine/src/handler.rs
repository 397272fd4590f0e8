//! Typed handler chains.
//!
//! Every event has its own argument type. `beforeParse` and `afterParse` are
//! plain notification lists; the other events use "around" composition: each
//! handler receives an [`Invocation`] and may inspect or rewrite the arguments,
//! call [`Invocation::proceed`] to run the rest of the chain, substitute its own
//! result, or veto with [`Outcome::Reject`]. The handler registered last runs
//! first; when the chain is exhausted the caller-supplied default runs.

use crate::context::Context;
use crate::engine::Engine;
use crate::pattern::Outcome;
use quillmark_core::{HtmlElement, Modifier, QuillError};
use std::sync::Arc;

/// An around handler for event arguments `A`.
pub type AroundFn<A> =
    Arc<dyn for<'a> Fn(Invocation<'a, A>, A) -> Result<Outcome, QuillError> + Send + Sync>;

/// Default behavior run when an around chain is exhausted.
pub type DefaultFn<'a, A> =
    &'a dyn Fn(&Engine, &mut Context, A) -> Result<Outcome, QuillError>;

/// `beforeParse` handler: may rewrite the normalized input.
pub type BeforeParseFn =
    Arc<dyn Fn(&Engine, &mut Context, &mut String) -> Result<(), QuillError> + Send + Sync>;

/// `afterParse` handler: receives the finished tree and the single-line flag.
pub type AfterParseFn = Arc<
    dyn Fn(&Engine, &mut Context, &mut HtmlElement, bool) -> Result<(), QuillError> + Send + Sync,
>;

/// One step of an around chain.
pub struct Invocation<'a, A> {
    engine: &'a Engine,
    ctx: &'a mut Context,
    rest: &'a [AroundFn<A>],
    default: DefaultFn<'a, A>,
}

impl<'a, A> Invocation<'a, A> {
    /// The engine running the chain.
    pub fn engine(&self) -> &'a Engine {
        self.engine
    }

    /// Per-document state.
    pub fn context(&mut self) -> &mut Context {
        &mut *self.ctx
    }

    /// Engine and per-document state at once, for handlers that call back into the parsers.
    pub fn parts(&mut self) -> (&'a Engine, &mut Context) {
        (self.engine, &mut *self.ctx)
    }

    /// Runs the remaining handlers (innermost last) and finally the default.
    pub fn proceed(self, args: A) -> Result<Outcome, QuillError> {
        match self.rest.split_last() {
            Some((handler, rest)) => handler(
                Invocation {
                    engine: self.engine,
                    ctx: self.ctx,
                    rest,
                    default: self.default,
                },
                args,
            ),
            None => (self.default)(self.engine, self.ctx, args),
        }
    }
}

/// Arguments of the `heading` event.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingArgs {
    /// Raw level before `top` and balancing (0 = most important)
    pub level: u8,
    /// Heading text as written
    pub content: String,
    /// Parsed trailing modifier
    pub modifier: Modifier,
    /// Produced by the surrounded form (`### Title`)
    pub surrounded: bool,
}

/// Arguments of the `paragraph` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphArgs {
    /// Buffered source lines
    pub content: String,
}

/// Arguments of the `htmlTag` event.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlTagArgs {
    /// Sanitized element (attributes already filtered)
    pub element: HtmlElement,
    /// Start tag (true) or end tag (false)
    pub is_start: bool,
    /// Matched source text
    pub source: String,
}

/// Arguments of the `htmlComment` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlCommentArgs {
    /// Comment body between `<!--` and `-->`
    pub content: String,
    /// Matched source text
    pub source: String,
}

/// An event with around semantics.
pub trait AroundEvent {
    /// Argument type passed down the chain
    type Args;
    /// Event name used in diagnostics
    const NAME: &'static str;
    /// Registered handlers, in registration order
    fn chain(handlers: &Handlers) -> &[AroundFn<Self::Args>];
    /// Mutable access for registration
    fn chain_mut(handlers: &mut Handlers) -> &mut Vec<AroundFn<Self::Args>>;
}

macro_rules! around_event {
    ($(#[$doc:meta])* $event:ident, $args:ty, $name:literal, $field:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $event;

        impl AroundEvent for $event {
            type Args = $args;
            const NAME: &'static str = $name;

            fn chain(handlers: &Handlers) -> &[AroundFn<$args>] {
                &handlers.$field
            }

            fn chain_mut(handlers: &mut Handlers) -> &mut Vec<AroundFn<$args>> {
                &mut handlers.$field
            }
        }
    };
}

around_event!(
    /// `heading`: one underlined or surrounded heading.
    HeadingEvent, HeadingArgs, "heading", heading
);
around_event!(
    /// `paragraph`: a run of lines no block pattern claimed.
    ParagraphEvent, ParagraphArgs, "paragraph", paragraph
);
around_event!(
    /// `htmlTag`: an accepted raw HTML start or end tag.
    HtmlTagEvent, HtmlTagArgs, "htmlTag", html_tag
);
around_event!(
    /// `htmlComment`: an accepted HTML comment.
    HtmlCommentEvent, HtmlCommentArgs, "htmlComment", html_comment
);

/// All handler chains of an engine.
#[derive(Default, Clone)]
pub struct Handlers {
    pub(crate) before_parse: Vec<BeforeParseFn>,
    pub(crate) after_parse: Vec<AfterParseFn>,
    heading: Vec<AroundFn<HeadingArgs>>,
    paragraph: Vec<AroundFn<ParagraphArgs>>,
    html_tag: Vec<AroundFn<HtmlTagArgs>>,
    html_comment: Vec<AroundFn<HtmlCommentArgs>>,
}

impl Handlers {
    /// Number of handlers registered for `event`.
    pub fn count(&self, event: &str) -> usize {
        match event {
            "beforeParse" => self.before_parse.len(),
            "afterParse" => self.after_parse.len(),
            "heading" => self.heading.len(),
            "paragraph" => self.paragraph.len(),
            "htmlTag" => self.html_tag.len(),
            "htmlComment" => self.html_comment.len(),
            _ => 0,
        }
    }

    pub(crate) fn add(&mut self, handler: Handler) {
        match handler {
            Handler::BeforeParse(f) => self.before_parse.push(f),
            Handler::AfterParse(f) => self.after_parse.push(f),
            Handler::Heading(f) => HeadingEvent::chain_mut(self).push(f),
            Handler::Paragraph(f) => ParagraphEvent::chain_mut(self).push(f),
            Handler::HtmlTag(f) => HtmlTagEvent::chain_mut(self).push(f),
            Handler::HtmlComment(f) => HtmlCommentEvent::chain_mut(self).push(f),
        }
    }
}

/// A handler for one of the closed set of events.
#[derive(Clone)]
pub enum Handler {
    /// `beforeParse`
    BeforeParse(BeforeParseFn),
    /// `afterParse`
    AfterParse(AfterParseFn),
    /// `paragraph`
    Paragraph(AroundFn<ParagraphArgs>),
    /// `heading`
    Heading(AroundFn<HeadingArgs>),
    /// `htmlTag`
    HtmlTag(AroundFn<HtmlTagArgs>),
    /// `htmlComment`
    HtmlComment(AroundFn<HtmlCommentArgs>),
}

impl Handler {
    /// Event this handler belongs to.
    pub fn event_name(&self) -> &'static str {
        match self {
            Handler::BeforeParse(_) => "beforeParse",
            Handler::AfterParse(_) => "afterParse",
            Handler::Paragraph(_) => ParagraphEvent::NAME,
            Handler::Heading(_) => HeadingEvent::NAME,
            Handler::HtmlTag(_) => HtmlTagEvent::NAME,
            Handler::HtmlComment(_) => HtmlCommentEvent::NAME,
        }
    }

    /// Wraps a `beforeParse` callback.
    pub fn before_parse<F>(f: F) -> Self
    where
        F: Fn(&Engine, &mut Context, &mut String) -> Result<(), QuillError> + Send + Sync + 'static,
    {
        Handler::BeforeParse(Arc::new(f))
    }

    /// Wraps an `afterParse` callback.
    pub fn after_parse<F>(f: F) -> Self
    where
        F: Fn(&Engine, &mut Context, &mut HtmlElement, bool) -> Result<(), QuillError>
            + Send
            + Sync
            + 'static,
    {
        Handler::AfterParse(Arc::new(f))
    }

    /// Wraps a `paragraph` around handler.
    pub fn paragraph<F>(f: F) -> Self
    where
        F: for<'a> Fn(Invocation<'a, ParagraphArgs>, ParagraphArgs) -> Result<Outcome, QuillError>
            + Send
            + Sync
            + 'static,
    {
        Handler::Paragraph(Arc::new(f))
    }

    /// Wraps a `heading` around handler.
    pub fn heading<F>(f: F) -> Self
    where
        F: for<'a> Fn(Invocation<'a, HeadingArgs>, HeadingArgs) -> Result<Outcome, QuillError>
            + Send
            + Sync
            + 'static,
    {
        Handler::Heading(Arc::new(f))
    }

    /// Wraps an `htmlTag` around handler.
    pub fn html_tag<F>(f: F) -> Self
    where
        F: for<'a> Fn(Invocation<'a, HtmlTagArgs>, HtmlTagArgs) -> Result<Outcome, QuillError>
            + Send
            + Sync
            + 'static,
    {
        Handler::HtmlTag(Arc::new(f))
    }

    /// Wraps an `htmlComment` around handler.
    pub fn html_comment<F>(f: F) -> Self
    where
        F: for<'a> Fn(Invocation<'a, HtmlCommentArgs>, HtmlCommentArgs) -> Result<Outcome, QuillError>
            + Send
            + Sync
            + 'static,
    {
        Handler::HtmlComment(Arc::new(f))
    }
}

pub(crate) fn run_around<E: AroundEvent>(
    engine: &Engine,
    ctx: &mut Context,
    args: E::Args,
    default: DefaultFn<'_, E::Args>,
) -> Result<Outcome, QuillError> {
    log::trace!(
        "dispatching {} through {} handler(s)",
        E::NAME,
        E::chain(engine.handlers()).len()
    );
    Invocation {
        engine,
        ctx,
        rest: E::chain(engine.handlers()),
        default,
    }
    .proceed(args)
}
