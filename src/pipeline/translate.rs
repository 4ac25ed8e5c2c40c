//! Optional translation through an external backend.
//!
//! The pipeline does not translate anything itself. It owns only the call
//! policy: skip empty text and English targets, send the text in bounded
//! chunks, and keep the untranslated text if any chunk fails.

use crate::config::PipelineConfig;
use crate::error::TranslationError;
use tracing::{debug, warn};

/// A translation backend.
///
/// Implementations are shared across worker threads and must be
/// `Send + Sync`. Calls are blocking; async backends should bridge
/// internally.
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_lang` (an ISO 639-1 code such as `"es"`).
    fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslationError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "translator"
    }
}

/// Translate `text` per the config, or return it unchanged.
///
/// Returns `(text, translated)`.
pub fn translate_text(text: &str, config: &PipelineConfig) -> (String, bool) {
    let (Some(translator), Some(lang)) = (&config.translator, &config.target_language) else {
        if config.target_language.is_some() {
            debug!("Target language set but no translator configured; skipping");
        }
        return (text.to_string(), false);
    };
    if text.trim().is_empty() || lang.trim().is_empty() || lang.eq_ignore_ascii_case("en") {
        return (text.to_string(), false);
    }

    let chunks = chunk_text(text, config.translation_chunk_chars);
    debug!(
        "Translating {} chunk(s) to '{}' via {}",
        chunks.len(),
        lang,
        translator.name()
    );

    let mut out = String::with_capacity(text.len());
    for (i, chunk) in chunks.iter().enumerate() {
        match translator.translate(chunk, lang) {
            Ok(t) => out.push_str(&t),
            Err(e) => {
                warn!(
                    "Translation chunk {}/{} failed, keeping original text: {}",
                    i + 1,
                    chunks.len(),
                    e
                );
                return (text.to_string(), false);
            }
        }
    }
    (out, true)
}

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Cuts after the last whitespace inside the window when there is one, and
/// always on a char boundary. Concatenating the pieces gives back `text`.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        // Byte offset just past the `max_chars`-th char, if the rest is longer.
        let Some((limit, _)) = rest.char_indices().nth(max_chars) else {
            chunks.push(rest);
            break;
        };
        let window = &rest[..limit];
        let cut = window
            .char_indices()
            .filter(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .last()
            .filter(|&i| i > 0)
            .unwrap_or(limit);
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Upper {
        calls: AtomicUsize,
    }

    impl Translator for Upper {
        fn translate(&self, text: &str, _lang: &str) -> Result<String, TranslationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(text.to_uppercase())
        }
    }

    struct FailsOnSecond {
        calls: AtomicUsize,
    }

    impl Translator for FailsOnSecond {
        fn translate(&self, text: &str, lang: &str) -> Result<String, TranslationError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 1 {
                return Err(TranslationError::Backend {
                    lang: lang.to_string(),
                    detail: "quota exceeded".into(),
                });
            }
            Ok(text.to_uppercase())
        }
    }

    fn config_with(t: Arc<dyn Translator>, lang: &str, chunk: usize) -> PipelineConfig {
        PipelineConfig::builder()
            .translator(t)
            .target_language(lang)
            .translation_chunk_chars(chunk)
            .build()
            .unwrap()
    }

    #[test]
    fn test_chunks_reassemble_and_respect_limit() {
        let text = "héllo wörld this is a test of chunking ünïcode text";
        for max in [1, 3, 7, 16, 100] {
            let chunks = chunk_text(text, max);
            assert_eq!(chunks.concat(), text, "max {max}");
            assert!(chunks.iter().all(|c| c.chars().count() <= max), "max {max}");
        }
    }

    #[test]
    fn test_chunks_prefer_whitespace() {
        assert_eq!(chunk_text("aaa bbb ccc", 8), vec!["aaa bbb ", "ccc"]);
        assert_eq!(chunk_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert!(chunk_text("", 5).is_empty());
    }

    #[test]
    fn test_translates_all_chunks() {
        let t = Arc::new(Upper { calls: AtomicUsize::new(0) });
        let config = config_with(t.clone(), "es", 6);
        let (out, translated) = translate_text("one two three", &config);
        assert_eq!(out, "ONE TWO THREE");
        assert!(translated);
        assert!(t.calls.load(Ordering::SeqCst) > 1);
    }

    #[test]
    fn test_english_and_empty_are_skipped() {
        let t = Arc::new(Upper { calls: AtomicUsize::new(0) });
        let config = config_with(t.clone(), "EN", 100);
        assert_eq!(translate_text("hello", &config), ("hello".to_string(), false));
        let config = config_with(t.clone(), "fr", 100);
        assert_eq!(translate_text("  ", &config), ("  ".to_string(), false));
        assert_eq!(t.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_translator_is_passthrough() {
        let config = PipelineConfig::builder().target_language("de").build().unwrap();
        assert_eq!(translate_text("hallo", &config), ("hallo".to_string(), false));
    }

    #[test]
    fn test_failure_returns_original() {
        let t = Arc::new(FailsOnSecond { calls: AtomicUsize::new(0) });
        let config = config_with(t, "es", 4);
        let (out, translated) = translate_text("one two three", &config);
        assert_eq!(out, "one two three");
        assert!(!translated);
    }
}
