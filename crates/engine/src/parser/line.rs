//! Line parser.
//!
//! Finds the leftmost match of any line pattern (ties go to the earlier pattern),
//! lets its callback decide, and splices the result in as a placeholder token.
//! Text outside matches is copied through untouched; it is escaped later, when
//! the tree is serialized.

use crate::context::Context;
use crate::engine::Engine;
use crate::pattern::{Outcome, RegisteredPattern};
use log::{debug, trace};
use quillmark_core::html::escape_text;
use quillmark_core::{ContentType, Embedding, MarkTable, ParseWarning, QuillError};
use regex::Regex;

/// Characters that may be escaped with a backslash.
const ESCAPABLE: &[char] = &['`', '*', '<', '>'];

pub(crate) fn parse(
    engine: &Engine,
    ctx: &mut Context,
    text: &str,
    embedding: Embedding,
) -> Result<String, QuillError> {
    let text = protect_escapes(ctx, text)?;
    let patterns = engine.line_patterns();
    let mut next: Vec<Option<usize>> = patterns
        .iter()
        .map(|entry| find_from(&entry.matcher, &text, 0))
        .collect();

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    loop {
        ctx.check_deadline()?;
        let Some((start, index)) = next
            .iter()
            .enumerate()
            .filter_map(|(index, found)| found.map(|start| (start, index)))
            .min()
        else {
            break;
        };
        let entry = &patterns[index];
        let Some(caps) = entry.matcher.captures_at(&text, start) else {
            next[index] = None;
            continue;
        };
        let Some(whole) = caps.get(0).filter(|m| m.start() == start && !m.is_empty()) else {
            next[index] = find_from(&entry.matcher, &text, next_char(&text, start));
            continue;
        };
        let end = whole.end();
        trace!("line pattern {} matched at {}", entry.pattern.name(), start);

        let fragment = match entry.pattern.call(engine, ctx, &caps)? {
            Outcome::Reject => {
                trace!("line pattern {} rejected", entry.pattern.name());
                next[index] = find_from(&entry.matcher, &text, next_char(&text, start));
                continue;
            }
            Outcome::Text(fragment) => {
                if MarkTable::contains_block(&fragment)
                    && !embedding.accepts(ContentType::Block)
                {
                    refuse(ctx, entry, whole.as_str())
                } else {
                    fragment
                }
            }
            Outcome::Element(el) => {
                let content_type = el.content_type();
                if embedding.accepts(content_type) {
                    ctx.protect(el.to_html(engine.options().output), content_type)?
                } else {
                    refuse(ctx, entry, whole.as_str())
                }
            }
        };

        out.push_str(&text[cursor..start]);
        out.push_str(&fragment);
        cursor = end;

        for (candidate, found) in patterns.iter().zip(next.iter_mut()) {
            if found.is_some_and(|pos| pos < cursor) {
                *found = find_from(&candidate.matcher, &text, cursor);
            }
        }
    }

    out.push_str(&text[cursor..]);
    Ok(out)
}

/// Block content in an inline context: keep the source as literal text.
fn refuse(ctx: &mut Context, entry: &RegisteredPattern, source: &str) -> String {
    debug!(
        "block content from {} refused in inline context",
        entry.pattern.name()
    );
    ctx.warn(ParseWarning::BlockInInline {
        pattern: entry.pattern.name().to_string(),
    });
    source.to_string()
}

/// Start of the first non-empty match at or after `from`.
fn find_from(regex: &Regex, text: &str, mut from: usize) -> Option<usize> {
    while from <= text.len() {
        let found = regex.find_at(text, from)?;
        if !found.is_empty() {
            return Some(found.start());
        }
        from = next_char(text, found.start());
    }
    None
}

fn next_char(text: &str, pos: usize) -> usize {
    pos + text[pos..].chars().next().map_or(1, char::len_utf8)
}

/// Replaces `\x` escapes with placeholders so no pattern sees the escaped character.
fn protect_escapes(ctx: &mut Context, text: &str) -> Result<String, QuillError> {
    if !text.contains('\\') {
        return Ok(text.to_string());
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match chars.peek() {
            Some(&next) if ch == '\\' && ESCAPABLE.contains(&next) => {
                chars.next();
                let token = ctx.protect(escape_text(&next.to_string()), ContentType::Inline)?;
                out.push_str(&token);
            }
            _ => out.push(ch),
        }
    }
    Ok(out)
}
