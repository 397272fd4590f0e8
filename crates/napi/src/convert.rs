use crate::types::{ParseWarningEntry, ProcessResult, TocItem};
use napi::{Error, Status};
use quillmark_core::{Options, QuillError};
use quillmark_engine::Rendered;
use serde_json::Value as JsonValue;

/// Reads engine options from a plain JS object; `null`/`undefined` gives the defaults.
pub fn to_options(value: Option<JsonValue>) -> napi::Result<Options> {
    match value {
        None | Some(JsonValue::Null) => Ok(Options::default()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| Error::new(Status::InvalidArg, format!("Invalid options: {}", e))),
    }
}

/// Converts a `Rendered` document to a `ProcessResult`.
pub fn to_process_result(rendered: Rendered) -> ProcessResult {
    ProcessResult {
        html: rendered.html,
        title: rendered.title,
        toc: rendered
            .toc
            .into_iter()
            .map(|entry| TocItem {
                level: u32::from(entry.level),
                title: entry.title,
                id: entry.id,
            })
            .collect(),
        links: rendered.summary.links,
        images: rendered.summary.images,
        warnings: rendered
            .diagnostics
            .iter()
            .map(|warning| ParseWarningEntry {
                warning_type: warning.kind().to_string(),
                message: warning.to_string(),
            })
            .collect(),
    }
}

/// Maps engine errors to NAPI statuses.
pub fn convert_error(err: QuillError) -> Error {
    match err {
        QuillError::InvalidOption { .. }
        | QuillError::InvalidElementName { .. }
        | QuillError::InvalidPattern { .. } => Error::new(Status::InvalidArg, err.to_string()),
        err if err.is_fatal() => {
            Error::from_reason(format!("Processing aborted: {}", err))
        }
        err => Error::from_reason(err.to_string()),
    }
}
