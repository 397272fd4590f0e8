use quillmark_engine::quillmark_core::{
    ContentType, HtmlElement, HtmlMode, Options, ParseWarning, QuillError,
};
use quillmark_engine::{Engine, Outcome, Pattern};
use std::collections::BTreeMap;
use std::thread;

fn engine() -> Engine {
    Engine::new(Options::default()).unwrap()
}

#[test]
fn protected_fragment_resolves_unchanged() {
    let engine = engine();
    let mut ctx = engine.new_context();
    let token = ctx.protect("<b>x</b>", ContentType::Markup).unwrap();
    assert_eq!(token.chars().count(), 13);
    let resolved = ctx.marks().resolve(&format!("a{token}b")).unwrap();
    assert_eq!(resolved, "a<b>x</b>b");
}

#[test]
fn generated_markup_is_not_reparsed() {
    let mut engine = Engine::bare(Options::default()).unwrap();
    engine
        .register_line_pattern(
            Pattern::new("star", r"\*([^*\n]+)\*", |_, _, caps| {
                Ok(Outcome::Element(HtmlElement::new("em")?.with_text(&caps[1])))
            })
            .unwrap(),
        )
        .unwrap();
    engine
        .register_line_pattern(
            Pattern::new("shout", "em", |_, _, _| Ok(Outcome::Text("EM".to_string()))).unwrap(),
        )
        .unwrap();
    insta::assert_snapshot!(engine.process("*x* em").unwrap(), @"<p><em>x</em> EM</p>");
}

#[test]
fn first_non_rejecting_block_pattern_wins() {
    let mut engine = Engine::bare(Options::default()).unwrap();
    engine
        .register_block_pattern(
            Pattern::new("first", r"!!([^\n]*)", |_, _, caps| {
                if &caps[1] == "skip" {
                    return Ok(Outcome::Reject);
                }
                let el = HtmlElement::new("div")?.with_attr("class", "a").with_text(&caps[1]);
                Ok(Outcome::Element(el))
            })
            .unwrap(),
        )
        .unwrap();
    engine
        .register_block_pattern(
            Pattern::new("second", r"!!([^\n]*)", |_, _, caps| {
                let el = HtmlElement::new("div")?.with_attr("class", "b").with_text(&caps[1]);
                Ok(Outcome::Element(el))
            })
            .unwrap(),
        )
        .unwrap();
    assert_eq!(
        engine.process("!!keep\n!!skip").unwrap(),
        "<div class=\"a\">keep</div>\n<div class=\"b\">skip</div>"
    );
}

#[test]
fn block_priority_overrides_registration_order() {
    let mut engine = Engine::bare(Options::default()).unwrap();
    engine
        .register_block_pattern(
            Pattern::new("low", "!!", |_, _, _| Ok(Outcome::Text("low".to_string()))).unwrap(),
        )
        .unwrap();
    engine
        .register_block_pattern(
            Pattern::new("high", "!!", |_, _, _| Ok(Outcome::Text("high".to_string())))
                .unwrap()
                .with_priority(10),
        )
        .unwrap();
    assert_eq!(engine.block_pattern_names(), vec!["high", "low"]);
    assert_eq!(engine.process("!!").unwrap(), "high");
}

#[test]
fn leftmost_line_match_wins_over_registration_order() {
    let mut engine = Engine::bare(Options::default()).unwrap();
    engine
        .register_line_pattern(
            Pattern::new("yz", "yz", |_, _, _| {
                Ok(Outcome::Element(HtmlElement::new("i")?.with_text("yz")))
            })
            .unwrap(),
        )
        .unwrap();
    engine
        .register_line_pattern(
            Pattern::new("xy", "xy", |_, _, _| {
                Ok(Outcome::Element(HtmlElement::new("b")?.with_text("xy")))
            })
            .unwrap(),
        )
        .unwrap();
    insta::assert_snapshot!(engine.process("xyz").unwrap(), @"<p><b>xy</b>z</p>");
}

#[test]
fn rejected_line_match_is_retried_further_on() {
    let mut engine = Engine::bare(Options::default()).unwrap();
    engine
        .register_line_pattern(
            Pattern::new("digit", "[0-9]", |_, _, caps| {
                if &caps[0] == "0" {
                    return Ok(Outcome::Reject);
                }
                Ok(Outcome::Element(HtmlElement::new("sup")?.with_text(&caps[0])))
            })
            .unwrap(),
        )
        .unwrap();
    insta::assert_snapshot!(engine.process("a0b1").unwrap(), @"<p>a0b<sup>1</sup></p>");
}

#[test]
fn dynamic_balancing_ranks_underline_levels() {
    let engine = engine();
    let rendered = engine
        .process_document("A\n###\n\nB\n---\n\nC\n---\n\nD\n***")
        .unwrap();
    assert_eq!(
        rendered.html,
        "<h1>A</h1>\n<h3>B</h3>\n<h3>C</h3>\n<h2>D</h2>"
    );
    let levels: Vec<u8> = rendered.toc.iter().map(|entry| entry.level).collect();
    assert_eq!(levels, vec![1, 3, 3, 2]);
    assert_eq!(rendered.title.as_deref(), Some("A"));
}

#[test]
fn underlined_and_surrounded_headings_balance_independently() {
    let rendered = engine()
        .process_document("A\n---\n\n#### B\n\n## C\n\nD\n===")
        .unwrap();
    insta::assert_snapshot!(
        rendered.html,
        @"<h2>A</h2>\n<h1>B</h1>\n<h3>C</h3>\n<h1>D</h1>"
    );
    let levels: Vec<(u8, u8)> = rendered
        .toc
        .iter()
        .map(|entry| (entry.raw_level, entry.level))
        .collect();
    assert_eq!(levels, vec![(3, 2), (3, 1), (5, 3), (2, 1)]);
}

#[test]
fn attribute_values_are_escaped_once() {
    let html = engine()
        .process(r#"<a href="a&amp;b&c" title='x"y'>t</a>"#)
        .unwrap();
    insta::assert_snapshot!(html, @r#"<p><a href="a&amp;b&amp;c" title="x&quot;y">t</a></p>"#);
}

#[test]
fn safe_mode_fails_closed() {
    let mut options = Options::default();
    options.html.mode = HtmlMode::Safe;
    options.html.safe_tags = Some(BTreeMap::from([(
        "code".to_string(),
        vec!["title".to_string(), "lang".to_string()],
    )]));
    let engine = Engine::new(options).unwrap();
    let rendered = engine
        .process_document(r#"<script>alert(1)</script> <code onclick="x">y</code>"#)
        .unwrap();
    insta::assert_snapshot!(
        rendered.html,
        @"<p>&lt;script&gt;alert(1)&lt;/script&gt; <code>y</code></p>"
    );
    let kinds: Vec<String> = rendered.diagnostics.iter().map(ToString::to_string).collect();
    assert_eq!(kinds.len(), 3);
    assert!(rendered
        .diagnostics
        .iter()
        .any(|w| matches!(w, ParseWarning::DisallowedTag { tag } if tag == "script")));
}

#[test]
fn generated_ids_never_collide() {
    let mut options = Options::default();
    options.heading.generate_ids = true;
    let engine = Engine::new(options).unwrap();
    let rendered = engine.process_document("X\n---\n\nX\n---").unwrap();
    assert_eq!(
        rendered.html,
        "<h1 id=\"toc-x\">X</h1>\n<h1 id=\"toc-x-2\">X</h1>"
    );
    let ids: Vec<_> = rendered.toc.iter().map(|e| e.id.clone()).collect();
    assert_eq!(
        ids,
        vec![Some("toc-x".to_string()), Some("toc-x-2".to_string())]
    );
}

#[test]
fn explicit_id_is_reserved_before_generated_ones() {
    let mut options = Options::default();
    options.heading.generate_ids = true;
    let engine = Engine::new(options).unwrap();
    let html = engine.process("## B .[#toc-a]\n\n## A").unwrap();
    assert_eq!(
        html,
        "<h1 id=\"toc-a\">B</h1>\n<h1 id=\"toc-a-2\">A</h1>"
    );
}

#[test]
fn documents_are_independent_across_threads() {
    let engine = engine();
    let inputs = [
        "First\n=====\n\nbody `one`",
        "## Second\n\n<a href=\"/two\">two</a>",
        "plain <em>three</em>",
        "Fourth\n-----\n\n`=kbd\n\n`four`",
    ];
    let sequential: Vec<_> = inputs
        .iter()
        .map(|input| engine.process_document(input).unwrap())
        .collect();

    let parallel: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| {
                let engine = &engine;
                scope.spawn(move || engine.process_document(input).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, parallel);
    assert_eq!(parallel[1].summary.links, vec!["/two".to_string()]);
    assert!(parallel[0].summary.links.is_empty());
}

#[test]
fn single_line_mode_refuses_block_content() {
    let rendered = engine().process_line("## x <div>b</div> `c`").unwrap();
    insta::assert_snapshot!(
        rendered.html,
        @"## x &lt;div&gt;b&lt;/div&gt; <code>c</code>"
    );
    assert!(rendered
        .diagnostics
        .iter()
        .any(|w| matches!(w, ParseWarning::BlockInInline { pattern } if pattern == "html")));
    assert!(rendered.toc.is_empty());
}

#[test]
fn block_tags_unwrap_the_paragraph() {
    insta::assert_snapshot!(
        engine().process("<div>x</div>").unwrap(),
        @"<div>x</div>"
    );
}

#[test]
fn reserved_characters_are_stripped_with_a_warning() {
    let rendered = engine().process_document("a\u{13}b\u{1F}").unwrap();
    assert_eq!(rendered.html, "<p>ab</p>");
    assert!(rendered
        .diagnostics
        .iter()
        .any(|w| matches!(w, ParseWarning::ReservedCharacters { count: 2 })));
}

#[test]
fn input_is_normalized() {
    assert_eq!(
        engine().process("a  \r\nb\r\n\r\n\tc").unwrap(),
        "<p>a\nb</p>\n<p>c</p>"
    );
}

#[test]
fn nesting_limit_is_reported() {
    let mut options = Options::default();
    options.limits.max_nesting = 1;
    let engine = Engine::new(options).unwrap();
    let err = engine.process("hello").unwrap_err();
    assert!(matches!(err, QuillError::NestingTooDeep { limit: 1 }));
    assert!(err.is_fatal());
}

#[test]
fn loose_output_drops_self_closing_slash() {
    let mut options = Options::default();
    options.output.xhtml = false;
    insta::assert_snapshot!(
        Engine::new(options).unwrap().process("a<br/>b").unwrap(),
        @"<p>a<br>b</p>"
    );
}

#[test]
fn summary_serializes_collected_urls() {
    let rendered = engine()
        .process_document(r#"<a href="/a">a</a> <img src="b.png" alt="">"#)
        .unwrap();
    assert_eq!(
        serde_json::to_value(&rendered.summary).unwrap(),
        serde_json::json!({ "links": ["/a"], "images": ["b.png"] })
    );
}
