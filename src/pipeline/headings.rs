//! Heading reconstruction from capitalisation and punctuation.
//!
//! Extracted text loses its heading styles. Two shapes reliably mark a
//! section title in the material this pipeline sees:
//!
//! 1. A capitalised phrase immediately followed by a colon: `Introduction:`
//! 2. An ALL-CAPS run at the start of a line: `CONCLUSION`
//!
//! Rules run in that order against the evolving string, so text wrapped by
//! rule 1 starts with `<` and can never be re-wrapped by rule 2. Rule 2 is
//! guarded by a minimum word/character count (see
//! [`crate::PipelineConfig::heading_min_caps_words`]) so acronyms and
//! sentence-initial capitals such as `A` or `NASA` are left alone.

use crate::config::PipelineConfig;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

static RE_LABEL_COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z][a-zA-Z ]+):").unwrap());

static RE_CAPS_LINE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([A-Z]+(?: [A-Z]+)*)\b").unwrap());

/// Wrap heading candidates in `<{heading_tag}>` markup.
pub fn reconstruct_headings(text: &str, config: &PipelineConfig) -> String {
    reconstruct_headings_counted(text, config).0
}

/// [`reconstruct_headings`], also returning how many headings were inserted.
pub fn reconstruct_headings_counted(text: &str, config: &PipelineConfig) -> (String, usize) {
    let tag = config.heading_tag.as_str();
    let mut inserted = 0usize;

    // ── Rule 1: `Label:` ─────────────────────────────────────────────────────
    let s = RE_LABEL_COLON.replace_all(text, |caps: &Captures<'_>| {
        let label = caps[1].trim();
        if config
            .heading_excluded_labels
            .iter()
            .any(|excluded| excluded == label)
        {
            return caps[0].to_string();
        }
        inserted += 1;
        format!("<{tag}>{label}</{tag}>")
    });

    // ── Rule 2: ALL-CAPS run at a line start ─────────────────────────────────
    let s = RE_CAPS_LINE_START.replace_all(&s, |caps: &Captures<'_>| {
        let run = &caps[1];
        if !is_caps_heading(run, config) {
            return run.to_string();
        }
        inserted += 1;
        format!("<{tag}>{run}</{tag}>")
    });

    let out = trim_breaks_around_headings(&s, tag);
    debug!("Headings: {} inserted", inserted);
    (out, inserted)
}

fn is_caps_heading(run: &str, config: &PipelineConfig) -> bool {
    let words = run.split_whitespace().count();
    words >= config.heading_min_caps_words || run.chars().count() >= config.heading_min_caps_chars
}

/// Drop a single line break directly before an opening or after a closing
/// heading tag. Paragraph breaks (`"\n\n"`) are left alone.
fn trim_breaks_around_headings(text: &str, tag: &str) -> String {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let after_close = Regex::new(&format!(r"{}\n([^\n])", regex::escape(&close)));
    let before_open = Regex::new(&format!(r"([^\n])\n{}", regex::escape(&open)));

    let (Ok(after_close), Ok(before_open)) = (after_close, before_open) else {
        return text.to_string();
    };

    let s = after_close.replace_all(text, format!("{close}${{1}}").as_str());
    before_open
        .replace_all(&s, format!("${{1}}{open}").as_str())
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[test]
    fn test_label_colon_rule() {
        let out = reconstruct_headings("Introduction: This chapter covers basics.", &config());
        assert_eq!(out, "<h2>Introduction</h2> This chapter covers basics.");
    }

    #[test]
    fn test_label_with_spaces() {
        let out = reconstruct_headings("Key Ideas: one, two.", &config());
        assert_eq!(out, "<h2>Key Ideas</h2> one, two.");
    }

    #[test]
    fn test_label_inside_word_ignored() {
        let out = reconstruct_headings("Buy an iPhone: now", &config());
        assert!(!out.contains("<h2>Phone"), "got: {out}");
    }

    #[test]
    fn test_math_wrapper_not_promoted() {
        let input = "Area is (Mathematical Formula: x to the power of 2).";
        assert_eq!(reconstruct_headings(input, &config()), input);
    }

    #[test]
    fn test_caps_line_start() {
        let out = reconstruct_headings("CONCLUSION\nWe are done.", &config());
        assert_eq!(out, "<h2>CONCLUSION</h2>We are done.");
    }

    #[test]
    fn test_caps_multi_word() {
        let out = reconstruct_headings("KEY TERMS and more", &config());
        assert_eq!(out, "<h2>KEY TERMS</h2> and more");
    }

    #[test]
    fn test_caps_run_stops_before_capitalised_word() {
        let out = reconstruct_headings("SUMMARY Some text", &config());
        assert_eq!(out, "<h2>SUMMARY</h2> Some text");
    }

    #[test]
    fn test_short_acronym_and_sentence_start_ignored() {
        let input = "A triangle has three sides.\nNASA uses it.";
        assert_eq!(reconstruct_headings(input, &config()), input);
    }

    #[test]
    fn test_caps_guard_is_configurable() {
        let config = PipelineConfig::builder()
            .heading_min_caps_chars(4)
            .build()
            .unwrap();
        let out = reconstruct_headings("NASA uses it.", &config);
        assert_eq!(out, "<h2>NASA</h2> uses it.");
    }

    #[test]
    fn test_no_double_wrapping() {
        let (out, n) = reconstruct_headings_counted("SUMMARY: all good", &config());
        assert_eq!(out, "<h2>SUMMARY</h2> all good");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_caps_mid_line_ignored() {
        let input = "We met the WORLD HEALTH group.";
        assert_eq!(reconstruct_headings(input, &config()), input);
    }

    #[test]
    fn test_stray_breaks_removed_but_paragraphs_kept() {
        let out = reconstruct_headings("Intro text\nOVERVIEW\nBody.\n\nNext: para", &config());
        assert_eq!(out, "Intro text<h2>OVERVIEW</h2>Body.\n\n<h2>Next</h2> para");
    }

    #[test]
    fn test_custom_tag() {
        let config = PipelineConfig::builder().heading_tag("h3").build().unwrap();
        let out = reconstruct_headings("Methods: we measured.", &config);
        assert_eq!(out, "<h3>Methods</h3> we measured.");
    }

    #[test]
    fn test_empty_and_plain_text() {
        assert_eq!(reconstruct_headings("", &config()), "");
        assert_eq!(reconstruct_headings("just words", &config()), "just words");
    }
}
