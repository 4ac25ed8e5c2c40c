//! Eager (whole-document) processing entry points.
//!
//! [`process`] is the pure core: text in, simplified text + HTML + report
//! out, no I/O and no failure path. The async functions around it add file
//! reading, atomic output writing and bounded-concurrency batches. Use
//! [`crate::stream::process_stream`] to receive batch results as each
//! document finishes.

use crate::config::PipelineConfig;
use crate::error::{AccessError, DocumentError};
use crate::output::{
    AccessibilityReport, BatchOutput, BatchStats, DocumentInput, DocumentOutcome, ImageEntry,
    ProcessedDocument, ProcessingStats,
};
use crate::pipeline::{clutter, headings, math, render, report, simplify, translate};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run the full pipeline over one document.
///
/// Total: every input, including empty text and malformed math, yields a
/// document and a report.
pub fn process(input: &DocumentInput, config: &PipelineConfig) -> ProcessedDocument {
    let total_start = Instant::now();
    let mut stats = ProcessingStats::default();

    // ── Step 1: Math ─────────────────────────────────────────────────────
    let t = Instant::now();
    let (text, math_stats) = math::normalize_with_stats(&input.raw_text, config);
    stats.math_spans_converted = math_stats.converted;
    stats.math_spans_skipped = math_stats.skipped;
    stats.math_fallbacks = math_stats.fallbacks;
    stats.math_duration_ms = elapsed_ms(t);

    // ── Step 2: Clutter ──────────────────────────────────────────────────
    let t = Instant::now();
    let text = clutter::declutter(&text, config);
    stats.clutter_duration_ms = elapsed_ms(t);

    // ── Step 3: Headings ─────────────────────────────────────────────────
    let t = Instant::now();
    let (text, inserted) = headings::reconstruct_headings_counted(&text, config);
    stats.headings_inserted = inserted;
    stats.headings_duration_ms = elapsed_ms(t);

    // ── Step 4: Sentences ────────────────────────────────────────────────
    let t = Instant::now();
    let (text, splits) = simplify::simplify_sentences_counted(&text, config.sentence_word_limit);
    stats.sentences_split = splits;
    stats.simplify_duration_ms = elapsed_ms(t);

    // ── Step 5: Translation (optional) ───────────────────────────────────
    let t = Instant::now();
    let (simplified_text, translated) = translate::translate_text(&text, config);
    stats.translated = translated;
    stats.translate_duration_ms = elapsed_ms(t);

    // ── Step 6: Render + images ──────────────────────────────────────────
    let t = Instant::now();
    let html = render::render_html(&simplified_text, &input.image_manifest, &config.heading_tag);
    stats.render_duration_ms = elapsed_ms(t);

    // ── Step 7: Report ───────────────────────────────────────────────────
    let t = Instant::now();
    let report = report::generate_report_with_threshold(
        &simplified_text,
        &html,
        input.expected_image_count,
        config.ari_threshold,
    );
    stats.report_duration_ms = elapsed_ms(t);
    stats.total_duration_ms = elapsed_ms(total_start);

    info!(
        "Processed document: {} math span(s), {} heading(s), {} split(s), {} in {}ms",
        stats.math_spans_converted,
        stats.headings_inserted,
        stats.sentences_split,
        report.summary_score,
        stats.total_duration_ms
    );

    ProcessedDocument {
        simplified_text,
        html,
        report,
        stats,
    }
}

/// [`process`] for text with no images.
pub fn process_text(raw_text: &str, config: &PipelineConfig) -> ProcessedDocument {
    process(&DocumentInput::from_text(raw_text), config)
}

/// Read an extracted-text file into a [`DocumentInput`].
///
/// The file must be UTF-8; a leading byte-order mark is dropped.
pub async fn read_input(path: impl AsRef<Path>) -> Result<DocumentInput, AccessError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AccessError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => AccessError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => AccessError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let text = String::from_utf8(bytes).map_err(|e| AccessError::NotUtf8 {
        path: path.to_path_buf(),
        detail: e.utf8_error().to_string(),
    })?;
    debug!("Read {} bytes from {}", text.len(), path.display());
    Ok(DocumentInput::from_text(
        text.strip_prefix('\u{feff}').unwrap_or(&text),
    ))
}

/// Load an image manifest: a JSON array of `{filename, alt_text}`.
pub async fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<ImageEntry>, AccessError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AccessError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    serde_json::from_str(&raw).map_err(|e| AccessError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read a text file and process it.
///
/// The pipeline runs on the blocking thread pool.
pub async fn process_file(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ProcessedDocument, AccessError> {
    let input = read_input(path).await?;
    process_blocking(input, config)
        .await
        .map_err(|e| AccessError::Internal(format!("pipeline worker failed: {e}")))
}

/// Files written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub html: PathBuf,
    pub text: PathBuf,
    pub report: PathBuf,
}

/// Write `<stem>_simplified.html`, `<stem>_simplified.txt` and
/// `<stem>_report.json` into `out_dir`.
///
/// Each file is written atomically (temp file + rename).
pub async fn write_outputs(
    document: &ProcessedDocument,
    stem: &str,
    out_dir: impl AsRef<Path>,
) -> Result<WrittenFiles, AccessError> {
    let out_dir = out_dir.as_ref();
    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|e| AccessError::OutputWriteFailed {
            path: out_dir.to_path_buf(),
            source: e,
        })?;

    let files = WrittenFiles {
        html: out_dir.join(format!("{stem}_simplified.html")),
        text: out_dir.join(format!("{stem}_simplified.txt")),
        report: out_dir.join(format!("{stem}_report.json")),
    };
    write_atomic(&files.html, &document.html).await?;
    write_atomic(&files.text, &document.simplified_text).await?;
    write_atomic(&files.report, &document.report.to_json_pretty()).await?;
    debug!("Wrote outputs for '{}' to {}", stem, out_dir.display());
    Ok(files)
}

/// Process a text file and write its outputs into `out_dir`.
pub async fn process_to_dir(
    path: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<AccessibilityReport, AccessError> {
    let path = path.as_ref();
    let document = process_file(path, config).await?;
    write_outputs(&document, &file_stem(path), out_dir).await?;
    Ok(document.report)
}

/// Synchronous wrapper around [`process_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_sync(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ProcessedDocument, AccessError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AccessError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_file(path, config))
}

/// Process many text files, at most `config.concurrency` at a time.
///
/// Per-document failures are collected, not fatal. Documents and errors are
/// both returned in input order.
pub async fn process_batch(paths: &[PathBuf], config: &PipelineConfig) -> BatchOutput {
    run_batch(paths, None, config).await
}

/// [`process_batch`], also writing each document's outputs into `out_dir`.
pub async fn process_batch_to_dir(
    paths: &[PathBuf],
    out_dir: impl AsRef<Path>,
    config: &PipelineConfig,
) -> BatchOutput {
    run_batch(paths, Some(out_dir.as_ref()), config).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_batch(paths: &[PathBuf], out_dir: Option<&Path>, config: &PipelineConfig) -> BatchOutput {
    let start = Instant::now();
    let total = paths.len();
    info!("Starting batch of {} document(s)", total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut results: Vec<Result<DocumentOutcome, DocumentError>> =
        stream::iter(paths.iter().cloned().enumerate().map(|(index, path)| {
            process_indexed(index, path, total, out_dir, config)
        }))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;
    results.sort_by_key(|r| match r {
        Ok(outcome) => outcome.index,
        Err(e) => e.index(),
    });

    let mut documents = Vec::new();
    let mut errors = Vec::new();
    for r in results {
        match r {
            Ok(outcome) => documents.push(outcome),
            Err(e) => errors.push(e),
        }
    }

    let stats = BatchStats {
        total_documents: total,
        processed_documents: documents.len(),
        failed_documents: errors.len(),
        passed_documents: documents.iter().filter(|d| d.document.report.is_pass()).count(),
        total_duration_ms: elapsed_ms(start),
    };
    info!(
        "Batch complete: {}/{} processed, {} PASS, {}ms",
        stats.processed_documents, total, stats.passed_documents, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, stats.processed_documents);
    }

    BatchOutput {
        documents,
        errors,
        stats,
    }
}

/// Read, process and optionally write one batch member, firing callbacks.
pub(crate) async fn process_indexed(
    index: usize,
    path: PathBuf,
    total: usize,
    out_dir: Option<&Path>,
    config: &PipelineConfig,
) -> Result<DocumentOutcome, DocumentError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(index, total);
    }

    let result = process_member(index, &path, out_dir, config).await;

    match &result {
        Ok(outcome) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_complete(index, total, outcome.document.report.is_pass());
            }
        }
        Err(e) => {
            warn!("{}", e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_error(index, total, &e.to_string());
            }
        }
    }
    result
}

async fn process_member(
    index: usize,
    path: &Path,
    out_dir: Option<&Path>,
    config: &PipelineConfig,
) -> Result<DocumentOutcome, DocumentError> {
    let display = path.display().to_string();

    let input = read_input(path)
        .await
        .map_err(|e| DocumentError::ReadFailed {
            index,
            path: display.clone(),
            detail: e.to_string(),
        })?;

    let document = process_blocking(input, config)
        .await
        .map_err(|e| DocumentError::WorkerFailed {
            index,
            path: display.clone(),
            detail: e.to_string(),
        })?;

    if let Some(dir) = out_dir {
        write_outputs(&document, &file_stem(path), dir)
            .await
            .map_err(|e| DocumentError::WriteFailed {
                index,
                path: display,
                detail: e.to_string(),
            })?;
    }

    Ok(DocumentOutcome {
        index,
        path: path.to_path_buf(),
        document,
    })
}

/// Run [`process`] on the blocking pool; the stages are CPU-bound.
async fn process_blocking(
    input: DocumentInput,
    config: &PipelineConfig,
) -> Result<ProcessedDocument, tokio::task::JoinError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || process(&input, &config)).await
}

async fn write_atomic(path: &Path, contents: &str) -> Result<(), AccessError> {
    let tmp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|e| e.to_str()).unwrap_or("out")
    ));
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| AccessError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| AccessError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Output file stem for an input path; `"document"` if it has none.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string())
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
