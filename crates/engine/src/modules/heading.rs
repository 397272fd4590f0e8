//! Headings.
//!
//! ```text
//! Underlined heading .[class]        ### Surrounded heading ###
//! ---------------------------
//! ```
//!
//! Underline markers map through [`UnderlineLevels`](quillmark_core::UnderlineLevels); surrounded markers map by
//! run length, `7 - clamp(run, 2, 7)`. After parsing, levels are rebalanced
//! unless balancing is fixed or the input was a single line.

use super::Module;
use crate::context::{Context, TocEntry};
use crate::engine::Engine;
use crate::handler::{Handler, HeadingArgs, HeadingEvent};
use crate::pattern::{Outcome, Pattern};
use log::debug;
use quillmark_core::html::escape_text;
use quillmark_core::modifier::MODIFIER;
use quillmark_core::{Balancing, Embedding, HtmlElement, Modifier, QuillError, webalize};
use regex::Captures;

/// Registers `heading/underlined`, `heading/surrounded` and the balancing pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingModule;

impl Module for HeadingModule {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn init(&self, engine: &mut Engine) -> Result<(), QuillError> {
        engine.register_block_pattern(Pattern::new(
            "heading/underlined",
            format!(
                r"(?m)^(\S[^\n]*?)(?:[ \t]+{MODIFIER})?[ \t]*\n(#{{3,}}|\*{{3,}}|={{3,}}|-{{3,}})[ \t]*$"
            ),
            underlined,
        )?)?;
        engine.register_block_pattern(Pattern::new(
            "heading/surrounded",
            format!(r"(?m)^(#{{2,}}|={{2,}})[ \t]*([^\n]+?)(?:[ \t]+{MODIFIER})?[ \t]*$"),
            surrounded,
        )?)?;
        engine.add_handler(Handler::after_parse(balance));
        Ok(())
    }
}

fn underlined(engine: &Engine, ctx: &mut Context, caps: &Captures<'_>) -> Result<Outcome, QuillError> {
    let marker = caps[3].chars().next().unwrap_or('-');
    let Some(level) = engine.options().heading.levels.level_for(marker) else {
        return Ok(Outcome::Reject);
    };
    let args = HeadingArgs {
        level,
        content: caps[1].to_string(),
        modifier: Modifier::parse(caps.get(2).map(|m| m.as_str())),
        surrounded: false,
    };
    engine.invoke_around::<HeadingEvent>(ctx, args, &solve)
}

fn surrounded(engine: &Engine, ctx: &mut Context, caps: &Captures<'_>) -> Result<Outcome, QuillError> {
    let run = &caps[1];
    let marker = run.chars().next().unwrap_or('#');
    let content = caps[2].trim_end_matches(|c: char| c == marker || c == ' ' || c == '\t');
    if content.trim().is_empty() {
        return Ok(Outcome::Reject);
    }
    let level = 7 - run.len().clamp(2, 7) as u8;
    let args = HeadingArgs {
        level,
        content: content.to_string(),
        modifier: Modifier::parse(caps.get(3).map(|m| m.as_str())),
        surrounded: true,
    };
    engine.invoke_around::<HeadingEvent>(ctx, args, &solve)
}

/// Default end of the `heading` chain: builds the element and records it in the TOC.
fn solve(engine: &Engine, ctx: &mut Context, args: HeadingArgs) -> Result<Outcome, QuillError> {
    let options = &engine.options().heading;
    let level = fixed_level(args.level, options.top);
    let mut el = HtmlElement::new(&format!("h{level}"))?;
    args.modifier.decorate(&mut el, &engine.options().html);
    if let Some(explicit) = el.attr_str("id").map(str::to_string) {
        let id = ctx.ids().unique(&explicit);
        el.set_attr("id", id);
    }

    let content = engine.parse_line(ctx, args.content.trim(), Embedding::Inline { allow_block: false })?;
    let title = ctx.marks().to_text(&escape_text(&content))?.trim().to_string();
    el.set_text(content);

    let slug = webalize(&title);
    if options.generate_ids && !el.has_attr("id") && !slug.is_empty() {
        let id = ctx.ids().unique(&format!("{}{slug}", options.id_prefix));
        el.set_attr("id", id);
    }

    let node = ctx.new_node_ref();
    el.set_node_ref(node);
    ctx.push_toc(TocEntry {
        node,
        level,
        raw_level: args.level,
        title,
        id: el.attr_str("id").map(str::to_string),
        surrounded: args.surrounded,
    });
    Ok(Outcome::Element(el))
}

fn fixed_level(raw: u8, top: u8) -> u8 {
    raw.saturating_add(top).clamp(1, 6)
}

/// `afterParse`: syncs the TOC with the tree and rebalances heading levels.
fn balance(
    engine: &Engine,
    ctx: &mut Context,
    root: &mut HtmlElement,
    single_line: bool,
) -> Result<(), QuillError> {
    let options = &engine.options().heading;
    let toc = ctx.toc_mut();
    toc.retain_mut(|entry| match root.find_mut(entry.node) {
        Some(el) => {
            entry.id = el.attr_str("id").map(str::to_string);
            true
        }
        None => false,
    });
    if let Some(first) = toc.first().map(|entry| entry.title.clone()) {
        ctx.set_title_if_unset(&first);
    }
    let toc = ctx.toc_mut();

    if single_line || options.balancing == Balancing::Fixed || toc.is_empty() {
        return Ok(());
    }

    let top = i32::from(options.top);
    let min_surrounded = toc
        .iter()
        .filter(|entry| entry.surrounded)
        .map(|entry| i32::from(entry.raw_level))
        .min()
        .unwrap_or(0);
    let mut ranks: Vec<u8> = toc
        .iter()
        .filter(|entry| !entry.surrounded)
        .map(|entry| entry.raw_level)
        .collect();
    ranks.sort_unstable();
    ranks.dedup();

    for entry in toc.iter_mut() {
        let level = if entry.surrounded {
            i32::from(entry.raw_level) + top - min_surrounded
        } else {
            let rank = ranks.binary_search(&entry.raw_level).unwrap_or(0);
            rank as i32 + top
        };
        entry.level = level.clamp(1, 6) as u8;
        if let Some(el) = root.find_mut(entry.node) {
            el.set_name(&format!("h{}", entry.level))?;
        }
    }
    debug!(
        "balanced {} heading(s) over {} underline level(s)",
        toc.len(),
        ranks.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use quillmark_core::Options;

    use crate::Engine;

    fn engine_with(options: Options) -> Engine {
        Engine::new(options).unwrap()
    }

    #[test]
    fn surrounded_levels_from_run_length() {
        let engine = engine_with(Options::default());
        let rendered = engine
            .process_document("### Top ###\n\n## Lower")
            .unwrap();
        assert_eq!(rendered.html, "<h1>Top</h1>\n<h2>Lower</h2>");
        assert_eq!(rendered.toc[0].raw_level, 4);
        assert_eq!(rendered.toc[1].raw_level, 5);
    }

    #[test]
    fn fixed_balancing_keeps_marker_levels() {
        let mut options = Options::default();
        options.heading.balancing = quillmark_core::Balancing::Fixed;
        let engine = engine_with(options);
        assert_eq!(
            engine.process("Title\n-----").unwrap(),
            "<h4>Title</h4>"
        );
    }

    #[test]
    fn modifier_decorates_heading() {
        let engine = engine_with(Options::default());
        assert_eq!(
            engine.process("Intro .[lead #start]\n=====").unwrap(),
            r#"<h1 class="lead" id="start">Intro</h1>"#
        );
    }

    #[test]
    fn title_comes_from_first_heading() {
        let engine = engine_with(Options::default());
        let rendered = engine
            .process_document("First `code`\n*****\n\nSecond\n-----")
            .unwrap();
        assert_eq!(rendered.title.as_deref(), Some("First code"));
        assert_eq!(rendered.toc.len(), 2);
    }

    #[test]
    fn marker_only_line_is_not_a_heading() {
        let engine = engine_with(Options::default());
        assert_eq!(engine.process("===").unwrap(), "<p>===</p>");
    }

    #[test]
    fn top_offsets_all_levels() {
        let mut options = Options::default();
        options.heading.top = 2;
        let engine = engine_with(options);
        assert_eq!(
            engine.process("A\n###\n\nB\n---").unwrap(),
            "<h2>A</h2>\n<h3>B</h3>"
        );
    }

    #[test]
    fn punctuation_only_titles_get_no_id() {
        let mut options = Options::default();
        options.heading.generate_ids = true;
        let rendered = engine_with(options)
            .process_document("## !!!\n\n## ???")
            .unwrap();
        assert_eq!(rendered.html, "<h1>!!!</h1>\n<h1>???</h1>");
        assert_eq!(rendered.toc[0].id, None);
        assert_eq!(rendered.title.as_deref(), Some("!!!"));
    }

    #[test]
    fn explicit_id_never_repeats_a_generated_one() {
        let mut options = Options::default();
        options.heading.generate_ids = true;
        assert_eq!(
            engine_with(options)
                .process("## A\n\n## B .[#toc-a]")
                .unwrap(),
            "<h1 id=\"toc-a\">A</h1>\n<h1 id=\"toc-a-2\">B</h1>"
        );
    }

    #[test]
    fn generated_ids_use_prefix() {
        let mut options = Options::default();
        options.heading.generate_ids = true;
        let engine = engine_with(options);
        assert_eq!(
            engine.process("## Hello, World!").unwrap(),
            r#"<h1 id="toc-hello-world">Hello, World!</h1>"#
        );
    }
}
