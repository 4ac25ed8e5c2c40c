//! Clutter filter: remove layout and OCR noise before heading inference.
//!
//! The noise table is data ([`crate::config::ClutterRule`]), not code: the
//! defaults cover column headers and captions that table/figure environments
//! leave behind, and callers extend it per corpus. After the table, stray
//! list numbering (`1. `, `2. ` left behind by `enumerate`) is dropped and
//! whitespace collapsed.
//!
//! The filter is run to a fixpoint so that `declutter(declutter(x)) ==
//! declutter(x)`; a removal can expose a new numbering token (`"1. 2. item"`).

use crate::config::{ClutterRule, PipelineConfig};
use crate::pipeline::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Upper bound on fixpoint passes, for tables whose replacements re-create
/// their own patterns.
const MAX_PASSES: usize = 8;

static RE_LIST_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(^|[ \t])\d\.[ \t]+").unwrap());

/// Apply the configured noise table, strip list numbering, collapse whitespace.
pub fn declutter(text: &str, config: &PipelineConfig) -> String {
    declutter_with_rules(text, &config.clutter_rules)
}

/// [`declutter`] with an explicit rule table.
pub fn declutter_with_rules(text: &str, rules: &[ClutterRule]) -> String {
    let mut current = collapse_whitespace(text);
    for pass in 1..=MAX_PASSES {
        let next = declutter_once(&current, rules);
        if next == current {
            debug!("Clutter filter settled after {} pass(es)", pass);
            break;
        }
        current = next;
    }
    current
}

fn declutter_once(text: &str, rules: &[ClutterRule]) -> String {
    let mut s = text.to_string();
    for rule in rules.iter().filter(|r| !r.pattern.is_empty()) {
        if s.contains(&rule.pattern) {
            s = s.replace(&rule.pattern, &rule.replacement);
        }
    }
    let s = RE_LIST_NUMBER.replace_all(&s, "${1}");
    collapse_whitespace(&s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[test]
    fn test_removes_table_headers() {
        let out = declutter(
            "Sides Label Formula Perpendicular a Base b Hypotenuse c The longest side.",
            &default_config(),
        );
        assert_eq!(out, "The longest side.");
    }

    #[test]
    fn test_rewrites_caption_labels() {
        let out = declutter(
            "Applications of Pythagoras Theorem: navigation. Mathematical Equation: a, b, c.",
            &default_config(),
        );
        assert_eq!(out, "Applications: navigation. If the sides are, a, b, c.");
    }

    #[test]
    fn test_strips_list_numbering() {
        let out = declutter("Steps 1. measure 2. cut", &default_config());
        assert_eq!(out, "Steps measure cut");
    }

    #[test]
    fn test_list_numbering_at_line_start() {
        let out = declutter("1. first\n2. second", &default_config());
        assert_eq!(out, "first\nsecond");
    }

    #[test]
    fn test_decimals_and_sentence_end_numbers_survive() {
        let out = declutter("Pi is 3.14 and the year was 2020. Next.", &default_config());
        assert_eq!(out, "Pi is 3.14 and the year was 2020. Next.");
    }

    #[test]
    fn test_adjacent_numbering_needs_second_pass() {
        let out = declutter("1. 2. item", &default_config());
        assert_eq!(out, "item");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "1. 2. 3. Visual Representation: Base b Hypotenuse c text",
            "Plain text.\n\n\n\nSecond   paragraph 4. here",
            "",
        ];
        for input in inputs {
            let once = declutter(input, &default_config());
            let twice = declutter(&once, &default_config());
            assert_eq!(once, twice, "input: {input:?}");
        }
    }

    #[test]
    fn test_custom_rule_table() {
        let rules = vec![ClutterRule::new("[Page Header]", ""), ClutterRule::new("Fig.", "Figure")];
        let out = declutter_with_rules("[Page Header] See Fig. 2", &rules);
        assert_eq!(out, "See Figure 2");
    }

    #[test]
    fn test_paragraph_breaks_survive() {
        let out = declutter("one\n\ntwo", &default_config());
        assert_eq!(out, "one\n\ntwo");
    }
}
