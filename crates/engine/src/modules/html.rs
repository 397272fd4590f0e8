//! Raw HTML passthrough.
//!
//! One line pattern covers start tags, end tags, self-closing tags and comments.
//! Tags outside the active whitelist are emitted back as literal text; accepted
//! tags are rebuilt from their parsed attributes, never copied from the source.

use super::Module;
use crate::context::Context;
use crate::engine::Engine;
use crate::handler::{HtmlCommentArgs, HtmlCommentEvent, HtmlTagArgs, HtmlTagEvent};
use crate::pattern::{Outcome, Pattern};
use log::debug;
use once_cell::sync::Lazy;
use quillmark_core::html::dtd;
use quillmark_core::{
    Allow, AttrValue, ContentType, HtmlElement, HtmlMode, HtmlOptions, ParseWarning, QuillError,
};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::Arc;

const TAG_PATTERN: &str = r#"(?is)<(/?)([a-z][a-z0-9_:-]*)(/?|\s(?:[\sa-z0-9_:-]|=\s*"[^"\x13-\x1F]*"|=\s*'[^'\x13-\x1F]*'|=[^\s>\x13-\x1F]+)*/?)>|<!--([^\x13-\x1F]*?)-->"#;

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)([a-z0-9_:-]+)\s*(?:=\s*('[^']*'|"[^"]*"|[^'"\s]+))?"#)
        .expect("attribute regex is valid")
});

/// Tags and attributes accepted in safe mode unless `safe_tags` replaces them.
const SAFE_TAGS: &[(&str, &[&str])] = &[
    ("a", &["href", "rel", "title", "lang"]),
    ("abbr", &["title", "lang"]),
    ("acronym", &["title", "lang"]),
    ("b", &["title", "lang"]),
    ("br", &[]),
    ("cite", &["title", "lang"]),
    ("code", &["title", "lang"]),
    ("dfn", &["title", "lang"]),
    ("em", &["title", "lang"]),
    ("i", &["title", "lang"]),
    ("kbd", &["title", "lang"]),
    ("q", &["cite", "title", "lang"]),
    ("samp", &["title", "lang"]),
    ("small", &["title", "lang"]),
    ("span", &["title", "lang"]),
    ("strong", &["title", "lang"]),
    ("sub", &["title", "lang"]),
    ("sup", &["title", "lang"]),
    ("var", &["title", "lang"]),
];

/// Registers the `html` line pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlModule;

impl Module for HtmlModule {
    fn name(&self) -> &'static str {
        "html"
    }

    fn init(&self, engine: &mut Engine) -> Result<(), QuillError> {
        let policy = Arc::new(TagPolicy::new(&engine.options().html));
        engine.register_line_pattern(Pattern::new(
            "html",
            TAG_PATTERN,
            move |engine: &Engine, ctx: &mut Context, caps: &Captures<'_>| match caps.get(4) {
                Some(comment) => comment_pattern(engine, ctx, &caps[0], comment.as_str()),
                None => tag_pattern(engine, ctx, caps, &policy),
            },
        )?)
    }
}

/// Attribute whitelist of one accepted tag.
#[derive(Debug, Clone, Copy)]
enum AttrRule<'a> {
    Any,
    Dtd,
    Only(&'a [String]),
}

impl AttrRule<'_> {
    fn permits(self, tag: &str, attribute: &str) -> bool {
        match self {
            AttrRule::Any => true,
            AttrRule::Dtd => dtd::allows_attribute(tag, attribute),
            AttrRule::Only(list) => list.iter().any(|allowed| allowed == attribute),
        }
    }
}

/// Tag whitelist resolved once from [`HtmlOptions`].
#[derive(Debug)]
struct TagPolicy {
    mode: HtmlMode,
    table: BTreeMap<String, Vec<String>>,
}

impl TagPolicy {
    fn new(options: &HtmlOptions) -> Self {
        let mut table = match options.mode {
            HtmlMode::Safe => options.safe_tags.clone().unwrap_or_else(|| {
                SAFE_TAGS
                    .iter()
                    .map(|(tag, attrs)| {
                        (tag.to_string(), attrs.iter().map(|a| a.to_string()).collect())
                    })
                    .collect()
            }),
            _ => BTreeMap::new(),
        };
        for (tag, attrs) in &options.tag_attributes {
            table.insert(tag.clone(), attrs.clone());
        }
        Self {
            mode: options.mode,
            table,
        }
    }

    fn lookup(&self, tag: &str) -> Option<AttrRule<'_>> {
        let listed = self.table.get(tag).map(|attrs| AttrRule::Only(attrs.as_slice()));
        match self.mode {
            HtmlMode::None => None,
            HtmlMode::TrustAll => Some(listed.unwrap_or(AttrRule::Any)),
            HtmlMode::TrustKnown if dtd::is_known(tag) => Some(listed.unwrap_or(AttrRule::Dtd)),
            HtmlMode::TrustKnown => None,
            HtmlMode::Safe => listed,
        }
    }
}

fn tag_pattern(
    engine: &Engine,
    ctx: &mut Context,
    caps: &Captures<'_>,
    policy: &TagPolicy,
) -> Result<Outcome, QuillError> {
    let source = &caps[0];
    let is_start = caps[1].is_empty();
    let raw_attrs = caps.get(3).map_or("", |m| m.as_str());
    let is_empty = raw_attrs.ends_with('/');

    let lowered = caps[2].to_ascii_lowercase();
    let tag = if dtd::is_known(&lowered) {
        lowered
    } else {
        caps[2].to_string()
    };

    let Some(rule) = policy.lookup(&tag) else {
        debug!("html tag <{tag}> not allowed");
        ctx.warn(ParseWarning::DisallowedTag { tag });
        return Ok(literal(source));
    };

    if is_empty && !is_start {
        return Ok(literal(source));
    }

    let mut el = HtmlElement::new(&tag)?;
    if policy.mode == HtmlMode::TrustAll && is_empty {
        el.set_void(true);
    }

    if !is_start {
        if el.is_void() {
            return Ok(literal(source));
        }
        return invoke(engine, ctx, el, false, source);
    }

    let raw_attrs = raw_attrs.strip_suffix('/').unwrap_or(raw_attrs);
    for attr in ATTRIBUTE.captures_iter(raw_attrs) {
        let key = attr[1].to_ascii_lowercase();
        if !rule.permits(&tag, &key) {
            debug!("dropping attribute {key} on <{tag}>");
            ctx.warn(ParseWarning::DisallowedAttribute {
                tag: tag.clone(),
                attribute: key,
            });
            continue;
        }
        let value = match attr.get(2).map(|m| m.as_str()) {
            None => AttrValue::Flag(true),
            Some(quoted) if quoted.starts_with(['\'', '"']) => {
                AttrValue::Text(quoted[1..quoted.len() - 1].to_string())
            }
            Some(bare) => AttrValue::Text(bare.to_string()),
        };
        el.set_attr(&key, value);
    }

    filter_classes(&mut el, &engine.options().html);
    filter_styles(&mut el, &engine.options().html.allowed_styles);

    let functional = match tag.as_str() {
        "img" => el.has_attr("src"),
        "a" => el.has_attr("href") || el.has_attr("name") || el.has_attr("id"),
        _ => true,
    };
    if !functional {
        debug!("<{tag}> without its target attribute kept literal");
        return Ok(literal(source));
    }

    invoke(engine, ctx, el, true, source)
}

fn invoke(
    engine: &Engine,
    ctx: &mut Context,
    element: HtmlElement,
    is_start: bool,
    source: &str,
) -> Result<Outcome, QuillError> {
    let args = HtmlTagArgs {
        element,
        is_start,
        source: source.to_string(),
    };
    engine.invoke_around::<HtmlTagEvent>(ctx, args, &emit_tag)
}

/// Default end of the `htmlTag` chain: records URLs and protects the tag.
fn emit_tag(engine: &Engine, ctx: &mut Context, args: HtmlTagArgs) -> Result<Outcome, QuillError> {
    let el = &args.element;
    if !args.is_start {
        return Ok(Outcome::Text(ctx.protect(el.end_tag(), el.content_type())?));
    }
    let token = ctx.protect(el.start_tag(engine.options().output), el.content_type())?;
    match (el.name(), el.attr_str("src"), el.attr_str("href")) {
        (Some("img"), Some(src), _) => ctx.add_image(&token, src),
        (Some("a"), _, Some(href)) => ctx.add_link(&token, href),
        _ => {}
    }
    Ok(Outcome::Text(token))
}

fn filter_classes(el: &mut HtmlElement, options: &HtmlOptions) {
    match &options.allowed_classes {
        Allow::All => {}
        Allow::None => {
            el.remove_attr("class");
            el.remove_attr("id");
        }
        Allow::Only(allowed) => {
            if let Some(AttrValue::Text(classes)) = el.remove_attr("class") {
                let kept: Vec<String> = classes
                    .split_whitespace()
                    .filter(|class| allowed.contains(*class))
                    .map(str::to_string)
                    .collect();
                if !kept.is_empty() {
                    el.set_attr("class", kept);
                }
            }
            if el.attr_str("id").is_some_and(|id| !options.permits_id(id)) {
                el.remove_attr("id");
            }
        }
    }
}

fn filter_styles(el: &mut HtmlElement, allowed: &Allow) {
    match allowed {
        Allow::All => {}
        Allow::None => {
            el.remove_attr("style");
        }
        Allow::Only(_) => {
            let Some(AttrValue::Text(style)) = el.remove_attr("style") else {
                return;
            };
            let pairs: Vec<(String, String)> = style
                .split(';')
                .filter_map(|decl| {
                    let (property, value) = decl.split_once(':').unwrap_or((decl, ""));
                    let property = property.trim().to_ascii_lowercase();
                    let value = value.trim();
                    (!value.is_empty() && allowed.permits(&property))
                        .then(|| (property, value.to_string()))
                })
                .collect();
            if !pairs.is_empty() {
                el.set_attr("style", pairs);
            }
        }
    }
}

fn comment_pattern(
    engine: &Engine,
    ctx: &mut Context,
    source: &str,
    content: &str,
) -> Result<Outcome, QuillError> {
    if engine.options().html.comments_allowed() {
        let args = HtmlCommentArgs {
            content: content.to_string(),
            source: source.to_string(),
        };
        return engine.invoke_around::<HtmlCommentEvent>(ctx, args, &emit_comment);
    }
    if content.starts_with('[') {
        return Ok(literal(source));
    }
    debug!("dropping html comment");
    Ok(Outcome::Text(String::new()))
}

fn emit_comment(
    _engine: &Engine,
    ctx: &mut Context,
    args: HtmlCommentArgs,
) -> Result<Outcome, QuillError> {
    Ok(Outcome::Text(ctx.protect(args.source, ContentType::None)?))
}

/// The matched source, escaped on output like any other text.
fn literal(source: &str) -> Outcome {
    Outcome::Text(source.to_string())
}
