//! Batch processing types for parallel conversion.

use crate::types::ProcessResult;
use napi_derive::napi;

/// Input for batch processing - one document to convert.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct BatchInput {
    /// Document identifier (typically a file path).
    pub id: String,
    /// Markup source.
    pub source: String,
}

/// Result for a single document in a batch.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Document identifier matching the input.
    pub id: String,
    /// Processing result (present on success).
    pub result: Option<ProcessResult>,
    /// Error message (present on failure).
    pub error: Option<String>,
    /// Number of non-fatal warnings raised while processing.
    pub warning_count: u32,
}

/// Statistics for batch processing.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct BatchStats {
    /// Total number of documents processed.
    pub total: u32,
    /// Number of successfully converted documents.
    pub succeeded: u32,
    /// Number of failed documents.
    pub failed: u32,
    /// Number of converted documents that raised at least one warning.
    pub with_warnings: u32,
    /// Total processing time in milliseconds.
    pub processing_time_ms: f64,
}

/// Options for batch processing.
#[napi(object)]
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Maximum number of threads to use. Defaults to number of CPU cores.
    pub max_threads: Option<u32>,
    /// Whether to continue processing after an error. Defaults to true.
    pub continue_on_error: Option<bool>,
    /// Treat any warning as a failure of that document. Defaults to false.
    pub fail_on_warnings: Option<bool>,
}

/// Result of batch processing containing all results and statistics.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct BatchProcessingResult {
    /// Individual results for each input document.
    pub results: Vec<BatchResult>,
    /// Processing statistics.
    pub stats: BatchStats,
}

impl BatchStats {
    /// Tallies the per-document results.
    pub(crate) fn tally(results: &[BatchResult], total: usize, elapsed_ms: f64) -> Self {
        let failed = results.iter().filter(|r| r.error.is_some()).count();
        let with_warnings = results
            .iter()
            .filter(|r| r.result.is_some() && r.warning_count > 0)
            .count();
        Self {
            total: total as u32,
            succeeded: (results.len() - failed) as u32,
            failed: failed as u32,
            with_warnings: with_warnings as u32,
            processing_time_ms: elapsed_ms,
        }
    }
}
