//! Block parser.
//!
//! Walks the text line by line. At every line start the block patterns are tried
//! in order; the first match whose callback does not reject wins and the cursor
//! moves past it. Lines no pattern claims are buffered and handed to the
//! `paragraph` chain at the next blank line, matched block or end of input.

use crate::context::Context;
use crate::engine::Engine;
use crate::handler::{ParagraphArgs, ParagraphEvent};
use crate::modules::paragraph;
use crate::pattern::Outcome;
use log::{trace, warn};
use quillmark_core::{Child, HtmlElement, ParseWarning, QuillError};
use std::ops::Range;

pub(crate) fn parse(
    engine: &Engine,
    ctx: &mut Context,
    parent: &mut HtmlElement,
    text: &str,
) -> Result<(), QuillError> {
    let mut cursor = 0;
    let mut pending: Option<Range<usize>> = None;

    while cursor < text.len() {
        ctx.check_deadline()?;
        let line_end = text[cursor..].find('\n').map_or(text.len(), |i| cursor + i);

        if text[cursor..line_end].trim().is_empty() {
            flush_paragraph(engine, ctx, parent, text, pending.take())?;
            cursor = (line_end + 1).min(text.len());
            continue;
        }

        match match_at(engine, ctx, &text[cursor..])? {
            Some((consumed, outcome)) => {
                flush_paragraph(engine, ctx, parent, text, pending.take())?;
                append(ctx, parent, outcome);
                cursor += consumed;
                if text[cursor..].starts_with('\n') {
                    cursor += 1;
                }
            }
            None => {
                let start = pending.map_or(cursor, |range| range.start);
                pending = Some(start..line_end);
                cursor = (line_end + 1).min(text.len());
            }
        }
    }

    flush_paragraph(engine, ctx, parent, text, pending)
}

/// First block pattern that matches at the start of `rest` and is not vetoed.
fn match_at(
    engine: &Engine,
    ctx: &mut Context,
    rest: &str,
) -> Result<Option<(usize, Outcome)>, QuillError> {
    for entry in engine.block_patterns() {
        let Some(caps) = entry.matcher.captures(rest) else {
            continue;
        };
        let consumed = caps.get(0).map_or(0, |m| m.end());
        if consumed == 0 {
            continue;
        }
        trace!("block pattern {} matched {} bytes", entry.pattern.name(), consumed);
        match entry.pattern.call(engine, ctx, &caps)? {
            Outcome::Reject => trace!("block pattern {} rejected", entry.pattern.name()),
            outcome => return Ok(Some((consumed, outcome))),
        }
    }
    Ok(None)
}

fn flush_paragraph(
    engine: &Engine,
    ctx: &mut Context,
    parent: &mut HtmlElement,
    text: &str,
    pending: Option<Range<usize>>,
) -> Result<(), QuillError> {
    let Some(range) = pending else {
        return Ok(());
    };
    let content = text[range].to_string();
    let args = ParagraphArgs {
        content: content.clone(),
    };
    let outcome = match engine.invoke_around::<ParagraphEvent>(ctx, args, &paragraph::solve)? {
        Outcome::Reject => Outcome::Text(content),
        outcome => outcome,
    };
    append(ctx, parent, outcome);
    Ok(())
}

/// Appends a block result to `parent`, separating blocks with a newline.
/// Elements the parent may not contain are flattened into their children.
fn append(ctx: &mut Context, parent: &mut HtmlElement, outcome: Outcome) {
    let child = match outcome {
        Outcome::Reject => return,
        Outcome::Text(text) if text.is_empty() => return,
        Outcome::Text(text) => Child::Text(text),
        Outcome::Element(el) => Child::Element(el),
    };
    if !parent.children().is_empty() {
        parent.add_text("\n");
    }
    if parent.validate_child(&child) {
        parent.children_mut().push(child);
        return;
    }
    if let Child::Element(mut el) = child {
        let parent_name = parent.name().unwrap_or_default().to_string();
        let child_name = el.name().unwrap_or_default().to_string();
        warn!("<{}> may not contain <{}>; flattening", parent_name, child_name);
        ctx.warn(ParseWarning::InvalidNesting {
            parent: parent_name,
            child: child_name,
        });
        parent.children_mut().append(el.children_mut());
    }
}
