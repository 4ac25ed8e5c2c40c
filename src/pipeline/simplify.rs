//! Sentence simplifier: split long compound sentences once.
//!
//! For every sentence longer than `sentence_word_limit` words that contains
//! `" and "`, the sentence is cut at the **first** `" and "`: the head gets a
//! period if it has no terminal punctuation, the tail becomes its own
//! sentence as-is. Fragments are not re-checked, so one pass never splits a
//! sentence more than once.
//!
//! Sentence boundaries are `.`, `?` or `!` followed by whitespace, with no
//! abbreviation awareness (`"Dr. Smith"` splits after `"Dr."`).
//!
//! Markup emitted by earlier stages (headings, `<math>` and raw-LaTeX
//! `<code>` fallbacks) is atomic: it is never cut, its words do not count
//! toward the limit, and punctuation inside it is not a sentence boundary.

use crate::pipeline::{paragraphs, PARAGRAPH_BREAK};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use tracing::debug;

const TERMINAL: [char; 3] = ['.', '?', '!'];
const CONJUNCTION: &str = " and ";

static RE_ATOMIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:h[1-6]|math|code)\b[^>]*>.*?</(?:h[1-6]|math|code)>").unwrap()
});

/// Byte ranges of markup regions that must survive simplification intact.
fn atomic_regions(text: &str) -> Vec<Range<usize>> {
    RE_ATOMIC.find_iter(text).map(|m| m.range()).collect()
}

fn in_regions(regions: &[Range<usize>], at: usize) -> bool {
    regions.iter().any(|r| r.contains(&at))
}

/// Words outside atomic markup.
fn prose_word_count(text: &str, regions: &[Range<usize>]) -> usize {
    let mut count = 0;
    let mut from = 0;
    for r in regions {
        count += text[from..r.start].split_whitespace().count();
        from = r.end;
    }
    count + text[from..].split_whitespace().count()
}

/// Split long compound sentences, paragraph by paragraph.
///
/// The number and order of paragraphs is unchanged.
pub fn simplify_sentences(text: &str, sentence_word_limit: usize) -> String {
    simplify_sentences_counted(text, sentence_word_limit).0
}

/// [`simplify_sentences`], also returning how many sentences were split.
pub fn simplify_sentences_counted(text: &str, sentence_word_limit: usize) -> (String, usize) {
    let mut splits = 0usize;
    let out = paragraphs(text)
        .into_iter()
        .map(|para| {
            let mut parts: Vec<String> = Vec::new();
            for sentence in split_sentences(para) {
                let pieces = split_long_sentence(sentence, sentence_word_limit);
                if pieces.len() > 1 {
                    splits += 1;
                }
                parts.extend(pieces);
            }
            parts.join(" ")
        })
        .collect::<Vec<_>>()
        .join(PARAGRAPH_BREAK);

    debug!("Simplifier: {} sentence(s) split", splits);
    (out, splits)
}

/// Split a paragraph at terminal punctuation followed by whitespace.
///
/// The punctuation stays with its sentence; the whitespace run is dropped.
/// Punctuation inside atomic markup does not end a sentence.
pub fn split_sentences(paragraph: &str) -> Vec<&str> {
    let para = paragraph.trim();
    if para.is_empty() {
        return Vec::new();
    }

    let regions = atomic_regions(para);
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = para.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !TERMINAL.contains(&c) || in_regions(&regions, i) {
            continue;
        }
        let end = i + c.len_utf8();
        if !chars.peek().is_some_and(|&(_, next)| next.is_whitespace()) {
            continue;
        }
        sentences.push(&para[start..end]);
        while chars.peek().is_some_and(|&(_, next)| next.is_whitespace()) {
            chars.next();
        }
        start = chars.peek().map_or(para.len(), |&(j, _)| j);
    }
    if start < para.len() {
        sentences.push(&para[start..]);
    }
    sentences
}

/// Split one sentence at its first `" and "` if it is over the word limit.
///
/// Only prose counts: words and conjunctions inside atomic markup are
/// ignored. Returns one trimmed sentence when no split applies, two
/// otherwise (or one, if the tail after `" and "` is empty).
pub fn split_long_sentence(sentence: &str, sentence_word_limit: usize) -> Vec<String> {
    let trimmed = sentence.trim();
    let regions = atomic_regions(trimmed);
    if prose_word_count(trimmed, &regions) <= sentence_word_limit {
        return vec![trimmed.to_string()];
    }
    let Some(at) = trimmed
        .match_indices(CONJUNCTION)
        .map(|(i, _)| i)
        .find(|&i| !regions.iter().any(|r| i < r.end && r.start < i + CONJUNCTION.len()))
    else {
        return vec![trimmed.to_string()];
    };
    let (head, tail) = (&trimmed[..at], &trimmed[at + CONJUNCTION.len()..]);

    let mut head = head.trim().to_string();
    if !head.ends_with(TERMINAL) {
        head.push('.');
    }
    let tail = tail.trim();
    if tail.is_empty() {
        vec![head]
    } else {
        vec![head, tail.to_string()]
    }
}
