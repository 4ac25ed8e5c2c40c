//! # accessibility-hub
//!
//! Turn extracted document text into a simpler, more accessible rendition
//! with an accessibility report attached.
//!
//! Text pulled out of PDFs and slides arrives flat: formulae as raw LaTeX,
//! headings as bare capitalised lines, table captions and list numbers
//! scattered through the prose, and long compound sentences. This crate
//! repairs what it can and measures what is left.
//!
//! ## Pipeline Overview
//!
//! ```text
//! raw text
//!  │
//!  ├─ 1. Math      $…$, $$…$$, \[…\] → spoken English or MathML
//!  ├─ 2. Clutter   drop layout noise and stray list numbering
//!  ├─ 3. Headings  `Label:` and ALL-CAPS line starts → <h2>
//!  ├─ 4. Simplify  split long sentences at the first " and "
//!  ├─ 5. Translate optional, via a caller-supplied backend
//!  ├─ 6. Render    HTML document + accessible image placeholders
//!  └─ 7. Report    readability, heading/ALT checks, PASS/REVIEW
//! ```
//!
//! Every stage is a pure function; [`process`] never fails.
//!
//! ## Quick Start
//!
//! ```rust
//! use accessibility_hub::{process, DocumentInput, ImageEntry, PipelineConfig};
//!
//! let input = DocumentInput::from_text("Introduction: The area is $x^2$.")
//!     .with_images(vec![ImageEntry {
//!         filename: "triangle.png".into(),
//!         alt_text: "A right triangle".into(),
//!     }]);
//! let doc = process(&input, &PipelineConfig::default());
//! println!("{}", doc.report.to_json_pretty());
//! assert_eq!(doc.report.structure_analysis.alt_missing_count, 0);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `a11y-hub` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! accessibility-hub = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClutterRule, DelimiterPolicy, MathMode, PipelineConfig, PipelineConfigBuilder};
pub use convert::{
    load_manifest, process, process_batch, process_batch_to_dir, process_file, process_sync,
    process_text, process_to_dir, read_input, write_outputs, WrittenFiles,
};
pub use error::{AccessError, DocumentError, MathParseError, TranslationError};
pub use output::{
    AccessibilityReport, BatchOutput, BatchStats, DocumentInput, DocumentOutcome, HeadingStatus,
    ImageEntry, ProcessedDocument, ProcessingStats, ReadabilityMetrics, StructureAnalysis,
};
pub use pipeline::report::generate_report;
pub use pipeline::translate::Translator;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{process_stream, DocumentStream};
