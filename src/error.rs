//! Error types for the accessibility-hub library.
//!
//! The rewriting stages themselves are total: they always return text and
//! never surface an error. Errors exist only at the edges:
//!
//! * [`AccessError`] — **Fatal** for one call: the surrounding I/O or
//!   configuration layer failed (file missing, not UTF-8, bad config JSON).
//!   Returned as `Err(AccessError)` from the `process_file*` functions and
//!   from [`crate::config::PipelineConfigBuilder::build`].
//!
//! * [`DocumentError`] — **Non-fatal** for a batch: one document could not be
//!   read or written, but every other document is fine. Stored in the batch
//!   results so callers can inspect partial success.
//!
//! * [`MathParseError`] and [`TranslationError`] are absorbed inside the
//!   pipeline and downgraded to fallback output plus a `warn!` log line.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the accessibility-hub library.
#[derive(Debug, Error)]
pub enum AccessError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was read but is not valid UTF-8 text.
    #[error("Input '{path}' is not UTF-8 text: {detail}\nExtract the text first, then pass the .txt file.")]
    NotUtf8 { path: PathBuf, detail: String },

    /// Any other read failure.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A JSON configuration or image manifest could not be parsed.
    #[error("Failed to parse '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document in a batch.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The document could not be read.
    #[error("Document {index} ('{path}'): read failed: {detail}")]
    ReadFailed {
        index: usize,
        path: String,
        detail: String,
    },

    /// The document was processed but its outputs could not be written.
    #[error("Document {index} ('{path}'): write failed: {detail}")]
    WriteFailed {
        index: usize,
        path: String,
        detail: String,
    },

    /// The blocking worker running the pipeline panicked or was cancelled.
    #[error("Document {index} ('{path}'): worker failed: {detail}")]
    WorkerFailed {
        index: usize,
        path: String,
        detail: String,
    },
}

impl DocumentError {
    /// Position of the failed document in the batch input (0-indexed).
    pub fn index(&self) -> usize {
        match self {
            DocumentError::ReadFailed { index, .. }
            | DocumentError::WriteFailed { index, .. }
            | DocumentError::WorkerFailed { index, .. } => *index,
        }
    }
}

/// Why a math span could not be rendered as structured markup.
///
/// Never leaves [`crate::pipeline::math::normalize`]: the span degrades to a
/// marked raw-LaTeX fallback instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathParseError {
    #[error("unbalanced braces at byte {0}")]
    UnbalancedBraces(usize),

    #[error("unknown command '\\{0}'")]
    UnknownCommand(String),

    #[error("command '\\{0}' is missing an argument")]
    MissingArgument(String),

    #[error("unexpected '{0}' at byte {1}")]
    UnexpectedToken(char, usize),

    #[error("empty expression")]
    Empty,

    #[error("nesting too deep at byte {0}")]
    TooDeep(usize),
}

/// A failure reported by an external [`crate::pipeline::translate::Translator`].
#[derive(Debug, Clone, Error)]
pub enum TranslationError {
    /// The translation backend rejected or failed the request.
    #[error("translation to '{lang}' failed: {detail}")]
    Backend { lang: String, detail: String },

    /// The requested language is not supported by the backend.
    #[error("unsupported target language '{0}'")]
    UnsupportedLanguage(String),
}
