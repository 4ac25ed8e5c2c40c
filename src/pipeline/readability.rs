//! Readability metrics: Flesch–Kincaid grade, automated readability index,
//! and mean sentence length.
//!
//! Degenerate input never produces a misleading number. Empty or
//! whitespace-only text yields [`Metric::NotApplicable`]; text with no
//! countable words (only punctuation, only markup) yields [`Metric::Error`].

use crate::pipeline::{paragraphs, simplify::split_sentences};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Sentinel rendered for empty input.
pub const NOT_APPLICABLE: &str = "N/A";
/// Sentinel rendered when a metric cannot be computed.
pub const ERROR: &str = "Error";

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").unwrap());

/// One readability figure, or the reason there isn't one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    NotApplicable,
    Error,
}

impl Metric {
    /// The number, if there is one.
    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Render with `decimals` places, or the sentinel string.
    pub fn render(self, decimals: usize) -> String {
        match self {
            Metric::Value(v) => format!("{v:.decimals$}"),
            Metric::NotApplicable => NOT_APPLICABLE.to_string(),
            Metric::Error => ERROR.to_string(),
        }
    }

    fn checked(v: f64) -> Metric {
        if v.is_finite() {
            Metric::Value(v)
        } else {
            Metric::Error
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(2))
    }
}

/// Raw counts the formulas are built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStatistics {
    pub words: usize,
    pub sentences: usize,
    /// Letters and digits inside words.
    pub characters: usize,
    pub syllables: usize,
}

impl TextStatistics {
    /// Count words, sentences, characters and syllables, ignoring markup tags.
    pub fn from_text(text: &str) -> Self {
        let plain = RE_TAG.replace_all(text, " ");
        let mut stats = TextStatistics::default();

        for para in paragraphs(&plain) {
            for sentence in split_sentences(para) {
                let mut sentence_words = 0;
                for token in sentence.split_whitespace() {
                    let chars = token.chars().filter(|c| c.is_alphanumeric()).count();
                    if chars == 0 {
                        continue;
                    }
                    sentence_words += 1;
                    stats.characters += chars;
                    stats.syllables += count_syllables(token);
                }
                if sentence_words > 0 {
                    stats.words += sentence_words;
                    stats.sentences += 1;
                }
            }
        }
        stats
    }
}

/// Heuristic syllable count: vowel groups, minus a silent trailing `e`.
///
/// Numbers and other letterless tokens count as one syllable.
pub fn count_syllables(word: &str) -> usize {
    let letters: Vec<char> = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();
    if letters.is_empty() {
        return 1;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut count = 0;
    let mut prev_vowel = false;
    for &c in &letters {
        let vowel = is_vowel(c);
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }

    let n = letters.len();
    let silent_e = n > 2
        && letters[n - 1] == 'e'
        && !is_vowel(letters[n - 2])
        && !(letters[n - 2] == 'l' && !is_vowel(letters[n - 3]));
    if silent_e && count > 1 {
        count -= 1;
    }
    count.max(1)
}

/// The three readability figures for one text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadabilityScores {
    pub flesch_kincaid_grade: Metric,
    pub automated_readability_index: Metric,
    pub average_sentence_length: Metric,
}

impl ReadabilityScores {
    fn all(metric: Metric) -> Self {
        Self {
            flesch_kincaid_grade: metric,
            automated_readability_index: metric,
            average_sentence_length: metric,
        }
    }
}

/// Compute every readability metric for `text`.
///
/// Values are rounded the way they are reported: the grade to one decimal,
/// the index and sentence length to two.
pub fn analyze(text: &str) -> ReadabilityScores {
    if text.trim().is_empty() {
        return ReadabilityScores::all(Metric::NotApplicable);
    }

    let stats = TextStatistics::from_text(text);
    if stats.words == 0 {
        return ReadabilityScores::all(Metric::Error);
    }

    let words = stats.words as f64;
    let sentences = stats.sentences.max(1) as f64;
    let words_per_sentence = words / sentences;

    let fk = 0.39 * words_per_sentence + 11.8 * (stats.syllables as f64 / words) - 15.59;
    let ari = 4.71 * (stats.characters as f64 / words) + 0.5 * words_per_sentence - 21.43;

    ReadabilityScores {
        flesch_kincaid_grade: Metric::checked(round_to(fk, 1)),
        automated_readability_index: Metric::checked(round_to(ari, 2)),
        average_sentence_length: Metric::checked(round_to(words_per_sentence, 2)),
    }
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (v * factor).round() / factor
}
