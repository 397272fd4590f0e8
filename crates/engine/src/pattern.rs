//! Pattern values consumed by the block and line parsers.

use crate::context::Context;
use crate::engine::Engine;
use quillmark_core::{HtmlElement, QuillError};
use regex::{Captures, Regex};
use std::fmt;
use std::sync::Arc;

/// What a pattern callback (or handler) produced for a match.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Literal text, escaped on output; may contain placeholder tokens.
    Text(String),
    /// A finished output node.
    Element(HtmlElement),
    /// Leave the span unmatched; the parser tries the next candidate.
    Reject,
}

/// Callback bound to a pattern.
pub type PatternFn =
    Arc<dyn Fn(&Engine, &mut Context, &Captures<'_>) -> Result<Outcome, QuillError> + Send + Sync>;

/// Immutable pattern descriptor: name, regex, priority and callback.
#[derive(Clone)]
pub struct Pattern {
    name: String,
    source: String,
    regex: Regex,
    priority: i32,
    callback: PatternFn,
}

impl Pattern {
    /// Compiles `source` and binds `callback`.
    pub fn new<F>(
        name: impl Into<String>,
        source: impl Into<String>,
        callback: F,
    ) -> Result<Self, QuillError>
    where
        F: Fn(&Engine, &mut Context, &Captures<'_>) -> Result<Outcome, QuillError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        let source = source.into();
        let regex = Regex::new(&source).map_err(|source| QuillError::InvalidPattern {
            name: name.clone(),
            source,
        })?;
        Ok(Self {
            name,
            source,
            regex,
            priority: 0,
            callback: Arc::new(callback),
        })
    }

    /// Higher priorities are tried first; equal priorities keep registration order.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Pattern name, e.g. `heading/underlined`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Regex source as given.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compiled regex (unanchored).
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Ordering key.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub(crate) fn call(
        &self,
        engine: &Engine,
        ctx: &mut Context,
        caps: &Captures<'_>,
    ) -> Result<Outcome, QuillError> {
        (self.callback)(engine, ctx, caps)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// A pattern plus the regex the parser actually runs (anchored for block patterns).
#[derive(Debug, Clone)]
pub(crate) struct RegisteredPattern {
    pub(crate) pattern: Pattern,
    pub(crate) matcher: Regex,
}

impl RegisteredPattern {
    pub(crate) fn block(pattern: Pattern) -> Result<Self, QuillError> {
        let matcher = Regex::new(&format!(r"\A(?:{})", pattern.source)).map_err(|source| {
            QuillError::InvalidPattern {
                name: pattern.name.clone(),
                source,
            }
        })?;
        Ok(Self { pattern, matcher })
    }

    pub(crate) fn line(pattern: Pattern) -> Self {
        let matcher = pattern.regex.clone();
        Self { pattern, matcher }
    }
}

/// Inserts `entry` after every entry with a priority >= its own.
pub(crate) fn insert_by_priority(list: &mut Vec<RegisteredPattern>, entry: RegisteredPattern) {
    let priority = entry.pattern.priority;
    let index = list
        .iter()
        .position(|existing| existing.pattern.priority < priority)
        .unwrap_or(list.len());
    list.insert(index, entry);
}
