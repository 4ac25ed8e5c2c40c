//! Input and output types for the accessibility pipeline.
//!
//! [`AccessibilityReport`] serialises to a fixed JSON shape consumed by
//! downstream tools; its field names must not change.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Input ────────────────────────────────────────────────────────────────

/// One image found by the upstream extraction step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub filename: String,
    /// Description to expose to assistive technology. May be empty.
    #[serde(default)]
    pub alt_text: String,
}

/// Everything the pipeline needs for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInput {
    pub raw_text: String,
    #[serde(default)]
    pub image_manifest: Vec<ImageEntry>,
    /// How many images the source document is known to contain.
    #[serde(default)]
    pub expected_image_count: usize,
}

impl DocumentInput {
    /// Text-only input: no images expected.
    pub fn from_text(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            ..Default::default()
        }
    }

    /// Attach an image manifest. The expected count defaults to its length
    /// unless set explicitly afterwards.
    pub fn with_images(mut self, manifest: Vec<ImageEntry>) -> Self {
        self.expected_image_count = manifest.len();
        self.image_manifest = manifest;
        self
    }

    pub fn with_expected_images(mut self, n: usize) -> Self {
        self.expected_image_count = n;
        self
    }
}

// ── Report ───────────────────────────────────────────────────────────────

/// Verdict, readability metrics and structural checks for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityReport {
    pub summary_score: String,
    pub readability_metrics: ReadabilityMetrics,
    pub structure_analysis: StructureAnalysis,
}

impl AccessibilityReport {
    /// `true` for a PASS verdict.
    pub fn is_pass(&self) -> bool {
        self.summary_score.starts_with("PASS")
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> String {
        // A struct of strings and integers always serialises.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Rendered readability figures. Each is a number or a sentinel
/// (`"N/A"`, `"Error"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadabilityMetrics {
    pub flesch_kincaid_grade: String,
    pub automated_readability_index: String,
    pub average_sentence_length: String,
}

/// Heading presence and image-description accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureAnalysis {
    pub heading_structure_status: HeadingStatus,
    pub alt_text_status: String,
    pub alt_missing_count: usize,
    pub note: String,
}

/// Whether the rendered markup contains at least one heading element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadingStatus {
    Found,
    Missing,
}

// ── Results ──────────────────────────────────────────────────────────────

/// The result of running the pipeline over one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    /// Simplified text, with heading markup, after optional translation.
    pub simplified_text: String,
    /// Complete HTML document including image placeholders.
    pub html: String,
    pub report: AccessibilityReport,
    pub stats: ProcessingStats,
}

/// Counters and per-stage timings for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub math_spans_converted: usize,
    pub math_spans_skipped: usize,
    /// Spans that failed to render as MathML and were kept as raw LaTeX.
    pub math_fallbacks: usize,
    pub headings_inserted: usize,
    pub sentences_split: usize,
    /// Whether the translation step changed the text.
    pub translated: bool,

    pub math_duration_ms: u64,
    pub clutter_duration_ms: u64,
    pub headings_duration_ms: u64,
    pub simplify_duration_ms: u64,
    pub translate_duration_ms: u64,
    pub render_duration_ms: u64,
    pub report_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// One successfully processed document from a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// Position in the batch input (0-indexed).
    pub index: usize,
    pub path: PathBuf,
    pub document: ProcessedDocument,
}

/// Aggregate result of [`crate::convert::process_batch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    /// Successful documents, in input order.
    pub documents: Vec<DocumentOutcome>,
    /// Failed documents, in input order.
    pub errors: Vec<crate::error::DocumentError>,
    pub stats: BatchStats,
}

/// Summary statistics for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_documents: usize,
    pub processed_documents: usize,
    pub failed_documents: usize,
    pub passed_documents: usize,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_wire_shape() {
        let report = AccessibilityReport {
            summary_score: "PASS (Meets baseline for structure/readability)".into(),
            readability_metrics: ReadabilityMetrics {
                flesch_kincaid_grade: "5.1 (Target: Grade 8 or below)".into(),
                automated_readability_index: "4.20".into(),
                average_sentence_length: "9.00".into(),
            },
            structure_analysis: StructureAnalysis {
                heading_structure_status: HeadingStatus::Found,
                alt_text_status: "1/1 Expected ALT Placeholders Found".into(),
                alt_missing_count: 0,
                note: "n".into(),
            },
        };
        let v: serde_json::Value = serde_json::from_str(&report.to_json_pretty()).unwrap();
        assert_eq!(v["structure_analysis"]["heading_structure_status"], "Found");
        assert_eq!(v["structure_analysis"]["alt_missing_count"], 0);
        assert_eq!(v["readability_metrics"]["automated_readability_index"], "4.20");
        assert_eq!(v.as_object().unwrap().len(), 3);
        assert!(report.is_pass());
    }

    #[test]
    fn test_input_defaults_from_json() {
        let input: DocumentInput = serde_json::from_str(r#"{"raw_text": "hi"}"#).unwrap();
        assert_eq!(input, DocumentInput::from_text("hi"));
    }

    #[test]
    fn test_with_images_sets_expected_count() {
        let input = DocumentInput::from_text("x").with_images(vec![
            ImageEntry::default(),
            ImageEntry::default(),
        ]);
        assert_eq!(input.expected_image_count, 2);
        assert_eq!(input.with_expected_images(5).expected_image_count, 5);
    }
}
