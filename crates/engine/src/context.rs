//! Per-document parse state.
//!
//! A `Context` is created at the start of every `process` call and dropped at the
//! end. It owns the mark table, the table of contents, the summary of collected
//! URLs, the id registry and the warnings; nothing in it outlives the document.

use quillmark_core::{
    ContentType, IdRegistry, MarkTable, NodeRef, Options, ParseDiagnostics, ParseWarning,
    QuillError,
};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Heading recorded while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Handle of the heading element inside the document tree
    pub node: NodeRef,
    /// Final level (1-6) after balancing
    pub level: u8,
    /// Marker-derived level before `top` and balancing
    pub raw_level: u8,
    /// Plain-text title
    pub title: String,
    /// Element id, explicit or generated
    pub id: Option<String>,
    /// Produced by the surrounded form
    pub surrounded: bool,
}

/// URLs collected from accepted links and images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// `a[href]` values in document order
    pub links: Vec<String>,
    /// `img[src]` values in document order
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum UrlKind {
    Link,
    Image,
}

#[derive(Debug)]
struct CollectedUrl {
    mark: u32,
    kind: UrlKind,
    url: String,
}

/// Everything a `process` call produces besides errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Final HTML
    pub html: String,
    /// Plain text of the first heading
    pub title: Option<String>,
    /// Table of contents in document order
    pub toc: Vec<TocEntry>,
    /// Collected URLs
    pub summary: Summary,
    /// Non-fatal problems
    pub diagnostics: ParseDiagnostics,
}

/// Per-document state threaded through every parser and module call.
#[derive(Debug)]
pub struct Context {
    marks: MarkTable,
    toc: Vec<TocEntry>,
    title: Option<String>,
    urls: Vec<CollectedUrl>,
    ids: IdRegistry,
    diagnostics: ParseDiagnostics,
    code_tag: Option<String>,
    depth: usize,
    max_depth: usize,
    deadline: Option<Instant>,
    next_node: u32,
}

impl Context {
    /// Fresh state for one document.
    pub fn new(options: &Options) -> Self {
        Self {
            marks: MarkTable::new(),
            toc: Vec::new(),
            title: None,
            urls: Vec::new(),
            ids: IdRegistry::new(),
            diagnostics: ParseDiagnostics::new(),
            code_tag: None,
            depth: 0,
            max_depth: options.limits.max_nesting,
            deadline: options
                .limits
                .time_limit_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
            next_node: 0,
        }
    }

    /// Stores a finished fragment and returns its placeholder token.
    pub fn protect(
        &mut self,
        content: impl Into<String>,
        content_type: ContentType,
    ) -> Result<String, QuillError> {
        self.marks.protect(content, content_type)
    }

    /// The mark table.
    pub fn marks(&self) -> &MarkTable {
        &self.marks
    }

    /// Records a non-fatal problem.
    pub fn warn(&mut self, warning: ParseWarning) {
        self.diagnostics.add_warning(warning);
    }

    /// Warnings so far.
    pub fn diagnostics(&self) -> &ParseDiagnostics {
        &self.diagnostics
    }

    /// Allocates a handle for an element that will be looked up again later.
    pub fn new_node_ref(&mut self) -> NodeRef {
        let node = NodeRef::new(self.next_node);
        self.next_node += 1;
        node
    }

    /// Runs `f` one nesting level deeper, failing beyond the configured limit.
    pub fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, QuillError>,
    ) -> Result<T, QuillError> {
        if self.depth >= self.max_depth {
            return Err(QuillError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Fails once the per-document time limit has elapsed.
    pub fn check_deadline(&self) -> Result<(), QuillError> {
        match self.deadline {
            Some(deadline) if Instant::now() > deadline => Err(QuillError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Document title, if set.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Sets the title unless one was already recorded.
    pub fn set_title_if_unset(&mut self, title: &str) {
        if self.title.is_none() {
            self.title = Some(title.to_string());
        }
    }

    /// Table of contents so far.
    pub fn toc(&self) -> &[TocEntry] {
        &self.toc
    }

    /// Mutable table of contents, for balancing.
    pub fn toc_mut(&mut self) -> &mut Vec<TocEntry> {
        &mut self.toc
    }

    /// Appends a heading to the table of contents.
    pub fn push_toc(&mut self, entry: TocEntry) {
        self.toc.push(entry);
    }

    /// Records the target of a link protected as `token`.
    ///
    /// It is reported only if the token ends up in the final output.
    pub fn add_link(&mut self, token: &str, href: &str) {
        self.collect(token, UrlKind::Link, href);
    }

    /// Records the source of an image protected as `token`.
    pub fn add_image(&mut self, token: &str, src: &str) {
        self.collect(token, UrlKind::Image, src);
    }

    fn collect(&mut self, token: &str, kind: UrlKind, url: &str) {
        if let Some(mark) = MarkTable::token_id(token) {
            self.urls.push(CollectedUrl {
                mark,
                kind,
                url: url.to_string(),
            });
        }
    }

    /// Element ids used in this document.
    pub fn ids(&mut self) -> &mut IdRegistry {
        &mut self.ids
    }

    /// Code span element selected by a `` `=tag `` directive.
    pub fn code_tag(&self) -> Option<&str> {
        self.code_tag.as_deref()
    }

    /// Switches the code span element for the rest of the document.
    pub fn set_code_tag(&mut self, tag: &str) {
        self.code_tag = Some(tag.to_string());
    }

    /// Resolves `markup` and consumes the context into the caller-facing result.
    ///
    /// URLs whose tags were discarded during parsing are left out of the summary.
    pub fn finish(self, markup: &str) -> Result<Rendered, QuillError> {
        let (html, reachable) = self.marks.resolve_reachable(markup)?;
        let mut summary = Summary::default();
        for collected in self.urls {
            if !reachable.contains(&collected.mark) {
                continue;
            }
            match collected.kind {
                UrlKind::Link => summary.links.push(collected.url),
                UrlKind::Image => summary.images.push(collected.url),
            }
        }
        Ok(Rendered {
            html,
            title: self.title,
            toc: self.toc,
            summary,
            diagnostics: self.diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_is_bounded() {
        let mut options = Options::default();
        options.limits.max_nesting = 2;
        let mut ctx = Context::new(&options);

        fn recurse(ctx: &mut Context) -> Result<(), QuillError> {
            ctx.nested(recurse)
        }

        let err = recurse(&mut ctx).unwrap_err();
        assert!(matches!(err, QuillError::NestingTooDeep { limit: 2 }));
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn title_is_set_once() {
        let mut ctx = Context::new(&Options::default());
        ctx.set_title_if_unset("First");
        ctx.set_title_if_unset("Second");
        assert_eq!(ctx.title(), Some("First"));
    }

    #[test]
    fn summary_keeps_only_reachable_urls() {
        let mut ctx = Context::new(&Options::default());
        let dropped = ctx.protect("<a href=\"/old\">", ContentType::Markup).unwrap();
        ctx.add_link(&dropped, "/old");
        let kept = ctx.protect("<a href=\"/new\">", ContentType::Markup).unwrap();
        ctx.add_link(&kept, "/new");
        let image = ctx.protect("<img src=\"i.png\" />", ContentType::Replaced).unwrap();
        ctx.add_image(&image, "i.png");
        let rendered = ctx.finish(&format!("{kept}x{image}")).unwrap();
        assert_eq!(rendered.summary.links, vec!["/new".to_string()]);
        assert_eq!(rendered.summary.images, vec!["i.png".to_string()]);
    }

    #[test]
    fn node_refs_are_unique() {
        let mut ctx = Context::new(&Options::default());
        assert_ne!(ctx.new_node_ref(), ctx.new_node_ref());
    }

    #[test]
    fn no_deadline_by_default() {
        let ctx = Context::new(&Options::default());
        assert!(ctx.check_deadline().is_ok());
    }
}
