use quillmark_core::Options;
use quillmark_engine::{Engine, Rendered};
use serde::Serialize;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;

// ============================================================================
// Options
// ============================================================================

/// Reads engine options from a JS object. `undefined`/`null` gives the defaults.
///
/// The time limit is cleared: `std::time::Instant` is unavailable on
/// `wasm32-unknown-unknown`.
fn parse_options(options: JsValue) -> Result<Options, JsError> {
    let mut options: Options = if options.is_undefined() || options.is_null() {
        Options::default()
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|e| JsError::new(&format!("Invalid options: {}", e)))?
    };
    options.limits.time_limit_ms = None;
    Ok(options)
}

// ============================================================================
// Result Types
// ============================================================================

/// Heading recorded in the table of contents.
#[derive(Debug, Clone, Serialize)]
pub struct TocItem {
    /// Final heading level (1-6).
    pub level: u8,
    /// Plain-text title.
    pub title: String,
    /// Element id, if any.
    pub id: Option<String>,
}

/// Result of processing one document.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    /// Sanitized HTML.
    pub html: String,
    /// Plain text of the first heading.
    pub title: Option<String>,
    /// Headings in document order.
    pub toc: Vec<TocItem>,
    /// `href` values of accepted links.
    pub links: Vec<String>,
    /// `src` values of accepted images.
    pub images: Vec<String>,
    /// Human-readable warnings.
    pub warnings: Vec<String>,
}

impl From<Rendered> for ProcessResult {
    fn from(rendered: Rendered) -> Self {
        Self {
            html: rendered.html,
            title: rendered.title,
            toc: rendered
                .toc
                .into_iter()
                .map(|entry| TocItem {
                    level: entry.level,
                    title: entry.title,
                    id: entry.id,
                })
                .collect(),
            links: rendered.summary.links,
            images: rendered.summary.images,
            warnings: rendered.diagnostics.iter().map(ToString::to_string).collect(),
        }
    }
}

fn to_js(rendered: Rendered) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(&ProcessResult::from(rendered))
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

// ============================================================================
// Process API
// ============================================================================

/// Converts a document to sanitized HTML.
///
/// # Returns
///
/// `{ html, title, toc, links, images, warnings }`
///
/// # Example (JavaScript)
///
/// ```javascript
/// import { process } from './quillmark_wasm';
///
/// const { html } = process('Title\n=====\n\n<b>bold</b>', { html: { mode: 'safe' } });
/// // html = '<h1>Title</h1>\n<p><b>bold</b></p>'
/// ```
#[wasm_bindgen]
pub fn process(source: &str, options: JsValue) -> Result<JsValue, JsError> {
    let engine = Engine::new(parse_options(options)?).map_err(|e| JsError::new(&e.to_string()))?;
    let rendered = engine
        .process_document(source)
        .map_err(|e| JsError::new(&e.to_string()))?;
    to_js(rendered)
}

/// Converts a single line: inline constructs only, no paragraph wrapper.
#[wasm_bindgen(js_name = processLine)]
pub fn process_line(source: &str, options: JsValue) -> Result<JsValue, JsError> {
    let engine = Engine::new(parse_options(options)?).map_err(|e| JsError::new(&e.to_string()))?;
    let rendered = engine
        .process_line(source)
        .map_err(|e| JsError::new(&e.to_string()))?;
    to_js(rendered)
}
