//! The reusable compiler and its batch entry point.

use crate::batch::{BatchInput, BatchOptions, BatchProcessingResult, BatchResult, BatchStats};
use crate::convert::{convert_error, to_options, to_process_result};
use crate::types::ProcessResult;
use napi::{Error, Status};
use napi_derive::napi;
use quillmark_engine::Engine;
use rayon::prelude::*;
use serde_json::Value as JsonValue;
use std::time::Instant;

/// Compiler exposed to Node callers. Options are read once at construction.
#[napi]
pub struct QuillCompiler {
    pub(crate) engine: Engine,
}

#[napi]
impl QuillCompiler {
    #[napi(constructor)]
    /// Creates a compiler that can be reused for any number of documents.
    pub fn new(options: Option<JsonValue>) -> napi::Result<Self> {
        let engine = Engine::new(to_options(options)?).map_err(convert_error)?;
        Ok(Self { engine })
    }

    /// Converts a document to HTML.
    #[napi]
    pub fn process(&self, source: String) -> napi::Result<ProcessResult> {
        self.engine
            .process_document(&source)
            .map(to_process_result)
            .map_err(convert_error)
    }

    /// Converts a single line: inline constructs only, no paragraph.
    #[napi(js_name = "processLine")]
    pub fn process_line(&self, source: String) -> napi::Result<ProcessResult> {
        self.engine
            .process_line(&source)
            .map(to_process_result)
            .map_err(convert_error)
    }

    /// Converts multiple documents in parallel using Rayon.
    ///
    /// Every document gets its own parse context; the engine is shared
    /// read-only across worker threads. Results keep the input order.
    #[napi(js_name = "processBatch")]
    pub fn process_batch(
        &self,
        inputs: Vec<BatchInput>,
        options: Option<BatchOptions>,
    ) -> napi::Result<BatchProcessingResult> {
        process_batch_with(&self.engine, inputs, options.unwrap_or_default())
    }
}

/// Converts one batch entry. Warnings fail the entry when `strict` is set.
fn process_entry(engine: &Engine, input: BatchInput, strict: bool) -> BatchResult {
    let (result, error, warning_count) = match engine.process_document(&input.source) {
        Ok(rendered) => {
            let count = rendered.diagnostics.count() as u32;
            if strict && rendered.diagnostics.has_warnings() {
                let first = rendered
                    .diagnostics
                    .iter()
                    .next()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                (None, Some(format!("{count} warning(s), first: {first}")), count)
            } else {
                (Some(to_process_result(rendered)), None, count)
            }
        }
        Err(e) => (None, Some(e.to_string()), 0),
    };
    BatchResult {
        id: input.id,
        result,
        error,
        warning_count,
    }
}

fn process_batch_with(
    engine: &Engine,
    inputs: Vec<BatchInput>,
    opts: BatchOptions,
) -> napi::Result<BatchProcessingResult> {
    let start = Instant::now();
    let total = inputs.len();
    let strict = opts.fail_on_warnings.unwrap_or(false);

    let results: Vec<BatchResult> = if opts.continue_on_error.unwrap_or(true) {
        let run = || -> Vec<BatchResult> {
            inputs
                .into_par_iter()
                .map(|input| process_entry(engine, input, strict))
                .collect()
        };
        match opts.max_threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads as usize)
                .build()
                .map_err(|e| Error::new(Status::GenericFailure, format!("Thread pool: {e}")))?
                .install(run),
            None => run(),
        }
    } else {
        // In order, up to and including the first failure
        let mut results = Vec::with_capacity(total);
        for input in inputs {
            let entry = process_entry(engine, input, strict);
            let failed = entry.error.is_some();
            results.push(entry);
            if failed {
                break;
            }
        }
        results
    };

    let stats = BatchStats::tally(&results, total, start.elapsed().as_secs_f64() * 1000.0);
    Ok(BatchProcessingResult { results, stats })
}
