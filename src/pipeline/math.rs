//! Math normaliser: find LaTeX-like spans and rewrite them for readers.
//!
//! ## Span grammar
//!
//! ```text
//! opener  := "$" | "$$" | "\["
//! closer  := "$" | "$$" | "\]"
//! span    := opener <content, lazy, may cross lines> closer
//! ```
//!
//! Opener and closer are matched independently, so `$x\]` is a span under
//! [`DelimiterPolicy::Permissive`]. Spans with more than
//! `max_math_lines` lines are skipped: they are almost always two unrelated
//! dollar signs around prose, not a formula.
//!
//! ## Strategies
//!
//! [`MathMode::Spoken`] paraphrases each span through an ordered rule table
//! and then runs a second cleanup pass over the whole text to strip orphaned
//! LaTeX structure. [`MathMode::Markup`] renders MathML via
//! [`super::mathml`] and falls back to a `<code class="latex-raw">` block when
//! the span cannot be parsed. Neither strategy can fail.

use crate::config::{DelimiterPolicy, MathMode, PipelineConfig};
use crate::pipeline::{collapse_whitespace, mathml, render::escape_html};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Label wrapped around every spoken formula.
pub const SPOKEN_LABEL: &str = "Mathematical Formula";

/// Which delimiter opened or closed a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `$`
    Inline,
    /// `$$`
    Display,
    /// `\[` or `\]`
    Bracket,
}

impl Delimiter {
    fn parse(raw: &str) -> Self {
        match raw {
            "$" => Delimiter::Inline,
            "$$" => Delimiter::Display,
            _ => Delimiter::Bracket,
        }
    }

    /// Inline spans render inside the sentence; the others as blocks.
    pub fn is_block(self) -> bool {
        !matches!(self, Delimiter::Inline)
    }
}

/// A detected math span. Lives only for the duration of one [`normalize`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathSpan<'a> {
    /// Byte offset of the opener.
    pub start: usize,
    /// Byte offset one past the closer.
    pub end: usize,
    pub open: Delimiter,
    pub close: Delimiter,
    /// Raw text between the delimiters.
    pub content: &'a str,
}

impl MathSpan<'_> {
    pub fn is_symmetric(&self) -> bool {
        self.open == self.close
    }

    pub fn line_count(&self) -> usize {
        self.content.split('\n').count()
    }
}

/// Counters reported back to [`crate::output::ProcessingStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MathStats {
    /// Spans rewritten by the active strategy.
    pub converted: usize,
    /// Spans left verbatim (too long, or rejected by the delimiter policy).
    pub skipped: usize,
    /// Markup-mode spans that fell back to raw LaTeX.
    pub fallbacks: usize,
}

// ── Detection ────────────────────────────────────────────────────────────────

static RE_MATH_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\$\$?|\\\[)(.*?)(\$\$?|\\\])").unwrap());

/// Find every candidate span, left to right, non-overlapping.
pub fn find_spans(text: &str) -> Vec<MathSpan<'_>> {
    RE_MATH_SPAN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(MathSpan {
                start: whole.start(),
                end: whole.end(),
                open: Delimiter::parse(caps.get(1)?.as_str()),
                close: Delimiter::parse(caps.get(3)?.as_str()),
                content: caps.get(2)?.as_str(),
            })
        })
        .collect()
}

// ── Entry points ─────────────────────────────────────────────────────────────

/// Rewrite every math span in `text` with the configured strategy.
pub fn normalize(text: &str, config: &PipelineConfig) -> String {
    normalize_with_stats(text, config).0
}

/// [`normalize`], also returning what happened to each span.
///
/// Each detected span is replaced exactly once, at its own offset, so two
/// identical formulae in the same document are rewritten independently.
pub fn normalize_with_stats(text: &str, config: &PipelineConfig) -> (String, MathStats) {
    let mut stats = MathStats::default();
    let mut out = String::with_capacity(text.len() + 64);
    let mut cursor = 0;

    for span in find_spans(text) {
        out.push_str(&text[cursor..span.start]);
        cursor = span.end;

        let rejected = span.line_count() > config.max_math_lines
            || (config.delimiter_policy == DelimiterPolicy::Symmetric && !span.is_symmetric());
        if rejected {
            stats.skipped += 1;
            out.push_str(&text[span.start..span.end]);
            continue;
        }

        match config.math_mode {
            MathMode::Spoken => out.push_str(&spoken_replacement(span.content)),
            MathMode::Markup => match mathml::render(span.content, span.open.is_block()) {
                Ok(markup) => out.push_str(&markup),
                Err(e) => {
                    warn!(
                        "Math span at byte {} kept as raw LaTeX: {}",
                        span.start, e
                    );
                    stats.fallbacks += 1;
                    out.push_str(&raw_latex_fallback(&text[span.start..span.end]));
                }
            },
        }
        stats.converted += 1;
    }
    out.push_str(&text[cursor..]);

    debug!(
        "Math: {} converted, {} skipped, {} fallbacks",
        stats.converted, stats.skipped, stats.fallbacks
    );

    let out = match config.math_mode {
        MathMode::Spoken => strip_latex_structure(&out),
        MathMode::Markup => out,
    };
    (out, stats)
}

/// Marked, non-executable form of a span that could not be rendered.
pub fn raw_latex_fallback(snippet: &str) -> String {
    format!("<code class=\"latex-raw\">{}</code>", escape_html(snippet))
}

fn spoken_replacement(content: &str) -> String {
    format!(" ({SPOKEN_LABEL}: {}) ", speak_latex(content))
}

// ── Spoken strategy ──────────────────────────────────────────────────────────

/// Ordered `(matcher, rewrite)` rules. Fractions and roots come first: a
/// wrapping command must be resolved before its arguments are flattened.
static SPOKEN_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\\[dt]?frac\{([^{}]+)\}\{([^{}]+)\}", "the fraction ${1} over ${2}"),
        (r"\\sqrt\{([^{}]+)\}", "the square root of ${1}"),
        (r"\^\{([^{}]*)\}", " to the power of ${1}"),
        (r"\^([A-Za-z0-9])", " to the power of ${1}"),
        (r"_\{([^{}]*)\}", " sub ${1}"),
        (r"_([A-Za-z0-9])", " sub ${1}"),
    ]
    .into_iter()
    .map(|(p, r)| (Regex::new(p).unwrap(), r))
    .collect()
});

/// Literal symbol table, applied after the structural rules.
const SPOKEN_SYMBOLS: &[(&str, &str)] = &[
    (r"\sum", "the sum of"),
    (r"\int", "the integral of"),
    (r"\alpha", "alpha"),
    (r"\beta", "beta"),
    (r"\cdot", " times "),
    (r"\times", " times "),
    (r"\pi", "pi"),
    (r"\theta", "theta"),
    (r"\infty", "infinity"),
    (r"\leq", " less than or equal to "),
    (r"\geq", " greater than or equal to "),
    (r"\neq", " not equal to "),
    (r"\pm", " plus or minus "),
];

/// Upper bound on rule-table rounds; each round can only peel one nesting level.
const MAX_SPOKEN_ROUNDS: usize = 8;

/// Paraphrase one span's content into spoken English.
///
/// ```rust
/// use accessibility_hub::pipeline::math::speak_latex;
///
/// assert_eq!(speak_latex(r"\frac{1}{2}"), "the fraction 1 over 2");
/// assert_eq!(speak_latex("x^{2}"), "x to the power of 2");
/// ```
pub fn speak_latex(content: &str) -> String {
    let mut s = content.to_string();
    // Rounds repeat the whole table in order, so `\frac{x^{2}}{2}` resolves the
    // exponent in round one and the fraction in round two.
    for _ in 0..MAX_SPOKEN_ROUNDS {
        let before = s.clone();
        for (re, rewrite) in SPOKEN_RULES.iter() {
            s = re.replace_all(&s, *rewrite).into_owned();
        }
        if s == before {
            break;
        }
    }
    for (symbol, spoken) in SPOKEN_SYMBOLS {
        s = s.replace(symbol, spoken);
    }
    let s = s.replace('$', "");
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Second pass: orphaned LaTeX structure ────────────────────────────────────

static STRUCTURE_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        // Preamble and environment markers, with optional [options] and {arg}.
        (
            r"(?i)\\(?:documentclass|usepackage|geometry|begin|end)(?:\[[^\]]*\])?(?:\{[^{}]*\})?",
            "",
        ),
        (r"\\section\*?\{[^{}]*\}", " "),
        (
            r"(?i)\\(?:itemize|enumerate|tabularx|tabular|array|hline|rowcolor|arraystretch|vspace|hspace|label|caption|rule|item)\b",
            " ",
        ),
        (r"(?i)\\(?:document|center|par)\b", " "),
        // Forced line breaks, optionally with a spacing argument: \\[0.5cm]
        (r"\\\\(?:\[[0-9.]{1,5}cm\])?", " "),
        (r"\\[0-9.]{1,5}cm", " "),
        // Formatting commands keep their text: \textbf{word} → word
        (r"\\\w+\{([^{}]+)\}", "${1}"),
        (r"[\\{}\[\]]", " "),
    ]
    .into_iter()
    .map(|(p, r)| (Regex::new(p).unwrap(), r))
    .collect()
});

/// Remove LaTeX scaffolding the span rewrite left behind, then any stray
/// backslashes/braces/brackets, then collapse whitespace.
pub fn strip_latex_structure(text: &str) -> String {
    let mut s = text.to_string();
    for (re, rewrite) in STRUCTURE_RULES.iter() {
        s = re.replace_all(&s, *rewrite).into_owned();
    }
    collapse_whitespace(&s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spoken() -> PipelineConfig {
        PipelineConfig::default()
    }

    fn markup() -> PipelineConfig {
        PipelineConfig::builder()
            .math_mode(MathMode::Markup)
            .build()
            .unwrap()
    }

    #[test]
    fn test_fraction_round_trip() {
        let out = normalize("$\\frac{1}{2}$", &spoken());
        assert!(
            out.contains("(Mathematical Formula: the fraction 1 over 2)"),
            "got: {out}"
        );
    }

    #[test]
    fn test_exponent_rule() {
        assert!(speak_latex("x^{2}").contains("x to the power of 2"));
        let out = normalize("Area is $x^{2}$.", &spoken());
        assert!(out.contains("x to the power of 2"), "got: {out}");
    }

    #[test]
    fn test_subscript_and_root() {
        assert_eq!(speak_latex("a_{1}"), "a sub 1");
        assert_eq!(speak_latex(r"\sqrt{x}"), "the square root of x");
    }

    #[test]
    fn test_nested_fraction_resolves_after_exponent() {
        assert_eq!(
            speak_latex(r"\frac{x^{2}}{2}"),
            "the fraction x to the power of 2 over 2"
        );
    }

    #[test]
    fn test_symbol_table() {
        assert_eq!(speak_latex(r"\alpha \cdot \beta"), "alpha times beta");
        assert_eq!(speak_latex(r"\sum x"), "the sum of x");
        assert_eq!(speak_latex(r"\int f"), "the integral of f");
    }

    #[test]
    fn test_all_three_delimiters() {
        let spans = find_spans(r"a $x$ b $$y$$ c \[z\] d");
        let kinds: Vec<_> = spans.iter().map(|s| (s.open, s.close)).collect();
        assert_eq!(
            kinds,
            vec![
                (Delimiter::Inline, Delimiter::Inline),
                (Delimiter::Display, Delimiter::Display),
                (Delimiter::Bracket, Delimiter::Bracket),
            ]
        );
        assert_eq!(spans[2].content, "z");
    }

    #[test]
    fn test_mismatched_delimiters_permissive() {
        let out = normalize(r"see $a+b\] here", &spoken());
        assert!(out.contains("(Mathematical Formula: a+b)"), "got: {out}");
    }

    #[test]
    fn test_mismatched_delimiters_symmetric_left_alone() {
        let config = PipelineConfig::builder()
            .delimiter_policy(DelimiterPolicy::Symmetric)
            .math_mode(MathMode::Markup)
            .build()
            .unwrap();
        let (out, stats) = normalize_with_stats(r"see $a+b\] here", &config);
        assert_eq!(out, r"see $a+b\] here");
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.converted, 0);
    }

    #[test]
    fn test_long_span_skipped() {
        let body = (0..11).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let input = format!("${body}$");
        let (out, stats) = normalize_with_stats(&input, &markup());
        assert_eq!(out, input);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_ten_line_span_converted() {
        let body = (0..10).map(|i| format!("x{i}")).collect::<Vec<_>>().join("\n");
        let (_, stats) = normalize_with_stats(&format!("${body}$"), &spoken());
        assert_eq!(stats.converted, 1);
    }

    #[test]
    fn test_identical_spans_each_replaced_once() {
        let (out, stats) = normalize_with_stats("$x$ and $x$", &spoken());
        assert_eq!(stats.converted, 2);
        assert_eq!(out.matches("Mathematical Formula: x").count(), 2);
        assert!(!out.contains('$'));
    }

    #[test]
    fn test_structure_cleanup() {
        let input = "\\documentclass{article}\n\\usepackage[utf8]{inputenc}\n\\begin{document}\n\\textbf{Right} triangles \\\\[0.5cm] are \\emph{neat}.\n\\end{document}";
        let out = normalize(input, &spoken());
        assert_eq!(out, "Right triangles are neat.");
        assert_eq!(normalize("{a} [b]", &spoken()), "a b");
    }

    #[test]
    fn test_cleanup_preserves_paragraph_breaks() {
        let out = normalize("First   para.\n\n\n\nSecond\tpara.", &spoken());
        assert_eq!(out, "First para.\n\nSecond para.");
    }

    #[test]
    fn test_markup_mode_renders_mathml() {
        let (out, stats) = normalize_with_stats("Half is $\\frac{1}{2}$.", &markup());
        assert!(out.contains("<mfrac>"), "got: {out}");
        assert!(out.contains("display=\"inline\""));
        assert_eq!(stats.fallbacks, 0);
    }

    #[test]
    fn test_markup_mode_fallback_is_marked_and_escaped() {
        let (out, stats) = normalize_with_stats("Bad $\\frobnicate{x<y}$ span", &markup());
        assert_eq!(stats.fallbacks, 1);
        assert!(
            out.contains("<code class=\"latex-raw\">$\\frobnicate{x&lt;y}$</code>"),
            "got: {out}"
        );
    }

    #[test]
    fn test_unmatched_delimiter_passthrough() {
        let out = normalize("Costs $5 total", &spoken());
        assert_eq!(out, "Costs $5 total");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize("", &spoken()), "");
        assert_eq!(normalize("", &markup()), "");
    }
}
