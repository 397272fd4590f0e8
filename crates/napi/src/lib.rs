#![deny(missing_docs)]
//! Node.js bindings that surface quillmark's Rust implementation.

use napi_derive::napi;
use serde_json::Value as JsonValue;

/// Batch processing types.
pub mod batch;
/// The reusable compiler.
pub mod compiler;
mod convert;
/// NAPI-exposed data structures.
pub mod types;

pub use batch::*;
pub use compiler::QuillCompiler;
pub use types::*;

/// Converts a document to HTML with one-off options.
///
/// # Example (JavaScript)
///
/// ```javascript
/// const { process } = require('quillmark-napi');
///
/// const { html, title } = process('Hello\n=====\n\nSome `code`.', { heading: { top: 2 } });
/// // html  = '<h2>Hello</h2>\n<p>Some <code>code</code>.</p>'
/// // title = 'Hello'
/// ```
#[napi]
pub fn process(source: String, options: Option<JsonValue>) -> napi::Result<ProcessResult> {
    QuillCompiler::new(options)?.process(source)
}

/// Converts a single line with one-off options.
#[napi(js_name = "processLine")]
pub fn process_line(source: String, options: Option<JsonValue>) -> napi::Result<ProcessResult> {
    QuillCompiler::new(options)?.process_line(source)
}

/// Converts many documents in parallel with shared options.
#[napi(js_name = "processBatch")]
pub fn process_batch(
    inputs: Vec<BatchInput>,
    options: Option<JsonValue>,
    batch: Option<BatchOptions>,
) -> napi::Result<BatchProcessingResult> {
    QuillCompiler::new(options)?.process_batch(inputs, batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn process_returns_metadata() {
        let result = process(
            "Hello\n=====\n\n<a href=\"/x\">x</a> <img src=\"i.png\">".to_string(),
            Some(json!({ "heading": { "top": 2, "generateIds": true } })),
        )
        .unwrap();
        assert_eq!(
            result.html,
            "<h2 id=\"toc-hello\">Hello</h2>\n<p><a href=\"/x\">x</a> <img src=\"i.png\" /></p>"
        );
        assert_eq!(result.title.as_deref(), Some("Hello"));
        assert_eq!(
            result.toc,
            vec![TocItem {
                level: 2,
                title: "Hello".to_string(),
                id: Some("toc-hello".to_string()),
            }]
        );
        assert_eq!(result.links, vec!["/x".to_string()]);
        assert_eq!(result.images, vec!["i.png".to_string()]);
    }

    #[test]
    fn warnings_carry_kind_and_message() {
        let result = process(
            "<script>x</script>".to_string(),
            Some(json!({ "html": { "mode": "safe" } })),
        )
        .unwrap();
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.warnings[0].warning_type, "disallowed_tag");
        assert!(result.warnings[0].message.contains("script"));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let err = process("x".to_string(), Some(json!({ "heading": { "top": 9 } }))).unwrap_err();
        assert!(err.reason.contains("heading.top"));
        assert!(process("x".to_string(), Some(json!({ "heading": 3 }))).is_err());
    }

    #[test]
    fn process_line_skips_paragraph() {
        let result = process_line("a `b`".to_string(), None).unwrap();
        assert_eq!(result.html, "a <code>b</code>");
    }

    #[test]
    fn batch_keeps_input_order() {
        let inputs: Vec<BatchInput> = (0..8)
            .map(|i| BatchInput {
                id: format!("doc-{i}"),
                source: format!("Doc {i}\n-----"),
            })
            .collect();
        let result = process_batch(
            inputs,
            None,
            Some(BatchOptions {
                max_threads: Some(2),
                ..Default::default()
            }),
        )
        .unwrap();
        assert_eq!(result.stats.total, 8);
        assert_eq!(result.stats.succeeded, 8);
        assert_eq!(result.stats.failed, 0);
        assert_eq!(result.stats.with_warnings, 0);
        for (i, item) in result.results.iter().enumerate() {
            assert_eq!(item.id, format!("doc-{i}"));
            let html = &item.result.as_ref().unwrap().html;
            assert_eq!(html, &format!("<h1>Doc {i}</h1>"));
        }
    }

    #[test]
    fn batch_stops_on_first_error_when_asked() {
        let compiler = QuillCompiler::new(Some(json!({ "limits": { "maxNesting": 1 } }))).unwrap();
        let inputs = vec![
            BatchInput {
                id: "a".to_string(),
                source: "text".to_string(),
            },
            BatchInput {
                id: "b".to_string(),
                source: "more".to_string(),
            },
        ];
        let result = compiler
            .process_batch(
                inputs,
                Some(BatchOptions {
                    continue_on_error: Some(false),
                    ..Default::default()
                }),
            )
            .unwrap();
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.stats.failed, 1);
        assert!(result.results[0].error.as_deref().unwrap().contains("limit of 1"));
    }

    #[test]
    fn batch_counts_and_optionally_fails_on_warnings() {
        let inputs = || {
            vec![
                BatchInput {
                    id: "clean".to_string(),
                    source: "fine".to_string(),
                },
                BatchInput {
                    id: "noisy".to_string(),
                    source: "<script>x</script>".to_string(),
                },
            ]
        };
        let compiler = QuillCompiler::new(Some(json!({ "html": { "mode": "safe" } }))).unwrap();

        let lenient = compiler.process_batch(inputs(), None).unwrap();
        assert_eq!(lenient.stats.succeeded, 2);
        assert_eq!(lenient.stats.with_warnings, 1);
        assert_eq!(lenient.results[1].warning_count, 2);

        let strict = compiler
            .process_batch(
                inputs(),
                Some(BatchOptions {
                    fail_on_warnings: Some(true),
                    ..Default::default()
                }),
            )
            .unwrap();
        assert_eq!(strict.stats.succeeded, 1);
        assert_eq!(strict.stats.failed, 1);
        assert!(strict.results[0].result.is_some());
        let error = strict.results[1].error.as_deref().unwrap();
        assert!(error.starts_with("2 warning(s)"));
        assert!(error.contains("script"));
    }
}
