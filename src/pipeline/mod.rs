//! Pipeline stages for the accessibility transform.
//!
//! Each submodule implements exactly one transformation step. Every stage is
//! a pure function of its input text and a borrowed [`crate::PipelineConfig`]:
//! no I/O, no shared mutable state, no failure path.
//!
//! ## Data Flow
//!
//! ```text
//! raw ──▶ math ──▶ clutter ──▶ headings ──▶ simplify ──▶ translate ──▶ render ──▶ report
//!        (LaTeX)   (noise)    (<h2>)       (split)      (optional)    (HTML)     (metrics)
//! ```
//!
//! 1. [`math`]      — rewrite `$…$`, `$$…$$`, `\[…\]` spans (spoken English or MathML)
//! 2. [`clutter`]   — drop layout/OCR noise and stray list numbering
//! 3. [`headings`]  — promote `Label:` and ALL-CAPS line starts to heading markup
//! 4. [`simplify`]  — split long compound sentences at the first " and "
//! 5. [`translate`] — hand the text to an external [`translate::Translator`]
//! 6. [`render`]    — assemble HTML and inject accessible image placeholders
//! 7. [`report`]    — readability metrics, structural checks, PASS/REVIEW verdict
//!
//! Paragraphs are separated by a blank line (`"\n\n"`) throughout; no stage
//! reorders them.

pub mod clutter;
pub mod headings;
pub mod math;
pub mod mathml;
pub mod readability;
pub mod render;
pub mod report;
pub mod simplify;
pub mod translate;

use once_cell::sync::Lazy;
use regex::Regex;

/// Paragraph separator used by every stage.
pub const PARAGRAPH_BREAK: &str = "\n\n";

static RE_INLINE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());
static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Collapse whitespace without losing paragraph structure.
///
/// Runs of spaces/tabs become one space, every line is trimmed, and any run
/// of blank lines becomes a single paragraph break. Single line breaks are
/// kept so line-start heading detection still has something to anchor on.
pub fn collapse_whitespace(input: &str) -> String {
    let normalised = input.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<String> = normalised
        .lines()
        .map(|line| RE_INLINE_WS.replace_all(line, " ").trim().to_string())
        .collect();
    let joined = lines.join("\n");
    RE_BLANK_RUN
        .replace_all(&joined, PARAGRAPH_BREAK)
        .trim()
        .to_string()
}

/// Split on the paragraph separator. Always yields at least one item.
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.split(PARAGRAPH_BREAK).collect()
}
