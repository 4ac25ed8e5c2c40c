//! Configuration types for the accessibility pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`] or loaded from JSON with
//! [`PipelineConfig::from_json_file`]. Keeping every knob in one struct makes
//! it trivial to share a config across worker threads, serialise it for
//! logging, and diff two runs to understand why their outputs differ.
//!
//! A built config is read-only: every stage borrows it, none mutates it, so a
//! single instance can back any number of concurrent documents.

use crate::error::AccessError;
use crate::pipeline::translate::Translator;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Configuration for one pipeline run.
///
/// # Example
/// ```rust
/// use accessibility_hub::{MathMode, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .math_mode(MathMode::Markup)
///     .sentence_word_limit(20)
///     .ari_threshold(12.0)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How detected math spans are rewritten. Default: [`MathMode::Spoken`].
    pub math_mode: MathMode,

    /// Whether `$…\]`-style mismatched delimiters count as a math span.
    /// Default: [`DelimiterPolicy::Permissive`].
    pub delimiter_policy: DelimiterPolicy,

    /// Spans whose content has more lines than this are left verbatim.
    /// Default: 10.
    ///
    /// Real formulae rarely exceed a handful of lines; a long "span" is almost
    /// always two unrelated dollar signs (prices, shell snippets) enclosing
    /// ordinary prose.
    pub max_math_lines: usize,

    /// Literal noise table applied by the clutter filter, in order.
    pub clutter_rules: Vec<ClutterRule>,

    /// Tag used for reconstructed headings. Default: `h2`.
    pub heading_tag: String,

    /// An ALL-CAPS run at a line start becomes a heading when it has at least
    /// this many words… Default: 2.
    pub heading_min_caps_words: usize,

    /// …or at least this many characters. Default: 5.
    pub heading_min_caps_chars: usize,

    /// `Label:` phrases that are never promoted to headings.
    /// Default: `["Mathematical Formula"]`, the math normaliser's own wrapper.
    pub heading_excluded_labels: Vec<String>,

    /// Sentences longer than this (in words) are split at the first " and ".
    /// Default: 15.
    pub sentence_word_limit: usize,

    /// Highest automated-readability-index score that still passes. Default: 14.0.
    pub ari_threshold: f64,

    /// Target language for the optional translation step. Default: None.
    ///
    /// Ignored unless a [`Translator`] is also configured.
    pub target_language: Option<String>,

    /// Maximum characters per translation request. Default: 4500.
    pub translation_chunk_chars: usize,

    /// Documents processed at once by the batch APIs. Default: 4.
    pub concurrency: usize,

    /// External translation backend.
    #[serde(skip)]
    pub translator: Option<Arc<dyn Translator>>,

    /// Optional per-document progress callback for the batch APIs.
    #[serde(skip)]
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            math_mode: MathMode::default(),
            delimiter_policy: DelimiterPolicy::default(),
            max_math_lines: 10,
            clutter_rules: ClutterRule::default_table(),
            heading_tag: "h2".to_string(),
            heading_min_caps_words: 2,
            heading_min_caps_chars: 5,
            heading_excluded_labels: vec!["Mathematical Formula".to_string()],
            sentence_word_limit: 15,
            ari_threshold: 14.0,
            target_language: None,
            translation_chunk_chars: 4500,
            concurrency: 4,
            translator: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("math_mode", &self.math_mode)
            .field("delimiter_policy", &self.delimiter_policy)
            .field("max_math_lines", &self.max_math_lines)
            .field("clutter_rules", &self.clutter_rules.len())
            .field("heading_tag", &self.heading_tag)
            .field("heading_min_caps_words", &self.heading_min_caps_words)
            .field("heading_min_caps_chars", &self.heading_min_caps_chars)
            .field("sentence_word_limit", &self.sentence_word_limit)
            .field("ari_threshold", &self.ari_threshold)
            .field("target_language", &self.target_language)
            .field("translator", &self.translator.as_ref().map(|_| "<dyn Translator>"))
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AccessError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| AccessError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: PipelineConfig =
            serde_json::from_str(&raw).map_err(|e| AccessError::ConfigParse {
                path: path.to_path_buf(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Re-open a loaded config for further changes.
    pub fn into_builder(self) -> PipelineConfigBuilder {
        PipelineConfigBuilder { config: self }
    }

    fn validate(&self) -> Result<(), AccessError> {
        if self.sentence_word_limit == 0 {
            return Err(AccessError::InvalidConfig(
                "sentence_word_limit must be ≥ 1".into(),
            ));
        }
        if !self.ari_threshold.is_finite() {
            return Err(AccessError::InvalidConfig(format!(
                "ari_threshold must be finite, got {}",
                self.ari_threshold
            )));
        }
        if self.concurrency == 0 {
            return Err(AccessError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if self.translation_chunk_chars == 0 {
            return Err(AccessError::InvalidConfig(
                "translation_chunk_chars must be ≥ 1".into(),
            ));
        }
        let tag = self.heading_tag.as_str();
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AccessError::InvalidConfig(format!(
                "heading_tag must be a bare tag name like 'h2', got '{tag}'"
            )));
        }
        if let Some(rule) = self.clutter_rules.iter().find(|r| r.pattern.is_empty()) {
            return Err(AccessError::InvalidConfig(format!(
                "clutter rule with empty pattern (replacement '{}')",
                rule.replacement
            )));
        }
        Ok(())
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn math_mode(mut self, mode: MathMode) -> Self {
        self.config.math_mode = mode;
        self
    }

    pub fn delimiter_policy(mut self, policy: DelimiterPolicy) -> Self {
        self.config.delimiter_policy = policy;
        self
    }

    pub fn max_math_lines(mut self, n: usize) -> Self {
        self.config.max_math_lines = n;
        self
    }

    /// Replace the whole clutter table.
    pub fn clutter_rules(mut self, rules: Vec<ClutterRule>) -> Self {
        self.config.clutter_rules = rules;
        self
    }

    /// Append one rule after the existing ones.
    pub fn add_clutter_rule(
        mut self,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.config.clutter_rules.push(ClutterRule::new(pattern, replacement));
        self
    }

    pub fn heading_tag(mut self, tag: impl Into<String>) -> Self {
        self.config.heading_tag = tag.into();
        self
    }

    pub fn heading_min_caps_words(mut self, n: usize) -> Self {
        self.config.heading_min_caps_words = n;
        self
    }

    pub fn heading_min_caps_chars(mut self, n: usize) -> Self {
        self.config.heading_min_caps_chars = n;
        self
    }

    pub fn heading_excluded_labels(mut self, labels: Vec<String>) -> Self {
        self.config.heading_excluded_labels = labels;
        self
    }

    pub fn sentence_word_limit(mut self, n: usize) -> Self {
        self.config.sentence_word_limit = n;
        self
    }

    pub fn ari_threshold(mut self, t: f64) -> Self {
        self.config.ari_threshold = t;
        self
    }

    pub fn target_language(mut self, lang: impl Into<String>) -> Self {
        self.config.target_language = Some(lang.into());
        self
    }

    pub fn translation_chunk_chars(mut self, n: usize) -> Self {
        self.config.translation_chunk_chars = n;
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.config.translator = Some(translator);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, AccessError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Rewrite strategy for detected math spans.
///
/// | Mode | Output | Best for |
/// |------|--------|----------|
/// | `Spoken` | ` (Mathematical Formula: the fraction 1 over 2) ` | screen readers, TTS, plain-text exports |
/// | `Markup` | `<math …><mfrac>…</mfrac></math>` | HTML/EPUB renderers with MathML support |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathMode {
    /// Paraphrase into spoken English. (default)
    #[default]
    Spoken,
    /// Render MathML; unparseable spans fall back to marked raw LaTeX.
    Markup,
}

/// Whether the opening and closing delimiter of a math span must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelimiterPolicy {
    /// Any opener pairs with any closer (`$x\]` is a span). (default)
    #[default]
    Permissive,
    /// Mismatched spans are left untouched.
    Symmetric,
}

/// One literal noise substitution for the clutter filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClutterRule {
    /// Exact text to look for.
    pub pattern: String,
    /// What it becomes; empty removes it.
    #[serde(default)]
    pub replacement: String,
}

impl ClutterRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// The reference noise table: column headers and captions left behind
    /// by table/figure environments, plus two caption labels rewritten into
    /// short transition phrases.
    pub fn default_table() -> Vec<ClutterRule> {
        [
            ("Sides Label Formula", ""),
            ("Visual Representation:", ""),
            ("Perpendicular a", ""),
            ("Base b", ""),
            ("Hypotenuse c", ""),
            ("Relation to Formula", ""),
            ("Applications of Pythagoras Theorem:", "Applications:"),
            ("Mathematical Equation:", "If the sides are,"),
        ]
        .into_iter()
        .map(|(p, r)| ClutterRule::new(p, r))
        .collect()
    }
}
