//! CLI binary for accessibility-hub.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig` and prints or writes results.

use accessibility_hub::{
    load_manifest, process, process_batch, process_batch_to_dir, read_input, write_outputs,
    BatchProgressCallback, DelimiterPolicy, DocumentInput, MathMode, PipelineConfig,
    ProcessedDocument, ProgressCallback,
};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress bar for multi-file runs. Documents complete out of
/// order, so each line names the input it belongs to.
struct CliProgressCallback {
    bar: ProgressBar,
    names: Vec<String>,
    reviews: AtomicUsize,
}

impl CliProgressCallback {
    fn new(names: Vec<String>) -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(names.len() as u64);
        bar.set_style(style);
        bar.set_prefix("Processing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            names,
            reviews: AtomicUsize::new(0),
        })
    }

    fn name(&self, index: usize) -> &str {
        self.names.get(index).map_or("?", String::as_str)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_document_start(&self, index: usize, _total: usize) {
        self.bar.set_message(self.name(index).to_string());
    }

    fn on_document_complete(&self, index: usize, _total: usize, passed: bool) {
        let verdict = if passed {
            green("PASS")
        } else {
            self.reviews.fetch_add(1, Ordering::SeqCst);
            yellow("REVIEW")
        };
        self.bar
            .println(format!("  {} {:<40} {}", green("✓"), self.name(index), verdict));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, _total: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {:<40} {}", red("✗"), self.name(index), red(&msg)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total.saturating_sub(success_count);
        let reviews = self.reviews.load(Ordering::SeqCst);
        eprintln!(
            "{} {}/{} documents processed  ({} need review, {} failed)",
            if failed == 0 { green("✔") } else { red("✘") },
            bold(&success_count.to_string()),
            total,
            reviews,
            failed,
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Simplified text to stdout, report summary to stderr
  a11y-hub lesson.txt

  # Full outputs (HTML, text, JSON report) into a directory
  a11y-hub lesson.txt -o out/

  # Read from stdin, print the report as JSON
  cat lesson.txt | a11y-hub - --json

  # Attach extracted images; expect 3 in the source
  a11y-hub lesson.txt --images images.json --expected-images 3 --html

  # MathML instead of spoken formulae, stricter readability
  a11y-hub --math-mode markup --ari-threshold 10 lesson.txt -o out/

  # Batch
  a11y-hub chapters/*.txt -o out/ -c 8

IMAGE MANIFEST (--images):
  [{"filename": "fig1.png", "alt_text": "A right triangle with sides a, b, c"}]

CONFIG FILE (--config):
  JSON with any PipelineConfig field; missing fields take defaults. CLI flags
  override file values. Example:
  {"sentence_word_limit": 20, "clutter_rules": [{"pattern": "[Header]"}]}
"#;

/// Make extracted document text more accessible and report on it.
#[derive(Parser, Debug)]
#[command(
    name = "a11y-hub",
    version,
    about = "Simplify extracted document text and produce an accessibility report",
    long_about = "Rewrite LaTeX math as spoken English or MathML, strip layout clutter, \
reconstruct headings, split long sentences, inject accessible image placeholders, and \
score the result for readability and structure.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// UTF-8 text files to process, or `-` for stdin.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Write `<stem>_simplified.html`, `<stem>_simplified.txt` and
    /// `<stem>_report.json` into this directory.
    #[arg(short, long, env = "A11Y_HUB_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// JSON image manifest for a single input.
    #[arg(long, env = "A11Y_HUB_IMAGES")]
    images: Option<PathBuf>,

    /// Number of images the source document contains (default: manifest length).
    #[arg(long, env = "A11Y_HUB_EXPECTED_IMAGES")]
    expected_images: Option<usize>,

    /// How math spans are rewritten.
    #[arg(long, env = "A11Y_HUB_MATH_MODE", value_enum)]
    math_mode: Option<MathModeArg>,

    /// Only accept math spans whose opening and closing delimiters match.
    #[arg(long, env = "A11Y_HUB_STRICT_DELIMITERS")]
    strict_delimiters: bool,

    /// Split sentences longer than this many words.
    #[arg(long, env = "A11Y_HUB_WORD_LIMIT")]
    word_limit: Option<usize>,

    /// Highest readability index that still passes.
    #[arg(long, env = "A11Y_HUB_ARI_THRESHOLD")]
    ari_threshold: Option<f64>,

    /// JSON pipeline configuration file.
    #[arg(long, env = "A11Y_HUB_CONFIG")]
    config: Option<PathBuf>,

    /// Print the accessibility report as JSON.
    #[arg(long, env = "A11Y_HUB_JSON")]
    json: bool,

    /// Print the rendered HTML document.
    #[arg(long, env = "A11Y_HUB_HTML")]
    html: bool,

    /// Documents processed at once.
    #[arg(short, long, env = "A11Y_HUB_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Disable progress bar.
    #[arg(long, env = "A11Y_HUB_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "A11Y_HUB_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "A11Y_HUB_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MathModeArg {
    Spoken,
    Markup,
}

impl From<MathModeArg> for MathMode {
    fn from(v: MathModeArg) -> Self {
        match v {
            MathModeArg::Spoken => MathMode::Spoken,
            MathModeArg::Markup => MathMode::Markup,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let batch = cli.inputs.len() > 1;

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs on multi-file runs.
    let show_progress = batch && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new(cli.inputs.clone());
        Some(cb as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    if batch {
        run_batch(&cli, &config).await
    } else {
        run_single(&cli, &config).await
    }
}

/// One input: print to stdout and/or write into the output directory.
async fn run_single(cli: &Cli, config: &PipelineConfig) -> Result<()> {
    let source = cli.inputs[0].as_str();
    let mut input = if source == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        DocumentInput::from_text(text)
    } else {
        read_input(source)
            .await
            .with_context(|| format!("Failed to read {source}"))?
    };

    if let Some(ref path) = cli.images {
        let manifest = load_manifest(path)
            .await
            .context("Failed to load image manifest")?;
        input = input.with_images(manifest);
    }
    if let Some(n) = cli.expected_images {
        input = input.with_expected_images(n);
    }

    let document = process(&input, config);

    if let Some(ref dir) = cli.output_dir {
        let stem = if source == "-" {
            "stdin".to_string()
        } else {
            accessibility_hub::convert::file_stem(Path::new(source))
        };
        let files = write_outputs(&document, &stem, dir)
            .await
            .context("Failed to write outputs")?;
        if !cli.quiet {
            eprintln!("   {}", dim(&files.html.display().to_string()));
            eprintln!("   {}", dim(&files.text.display().to_string()));
            eprintln!("   {}", dim(&files.report.display().to_string()));
        }
    }

    print_document(cli, &document)?;
    if !cli.quiet {
        print_summary(source, &document);
    }
    Ok(())
}

/// Many inputs: process concurrently, report per document.
async fn run_batch(cli: &Cli, config: &PipelineConfig) -> Result<()> {
    if cli.images.is_some() {
        anyhow::bail!("--images applies to a single input; got {}", cli.inputs.len());
    }
    if cli.inputs.iter().any(|i| i == "-") {
        anyhow::bail!("stdin ('-') cannot be combined with other inputs");
    }

    let paths: Vec<PathBuf> = cli.inputs.iter().map(PathBuf::from).collect();
    let output = match cli.output_dir {
        Some(ref dir) => process_batch_to_dir(&paths, dir, config).await,
        None => process_batch(&paths, config).await,
    };

    if cli.json {
        let reports: Vec<_> = output
            .documents
            .iter()
            .map(|d| {
                serde_json::json!({
                    "path": d.path,
                    "report": d.document.report,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).context("Failed to serialise reports")?
        );
    }

    if !cli.quiet && config.progress_callback.is_none() {
        for d in &output.documents {
            print_summary(&d.path.display().to_string(), &d.document);
        }
        for e in &output.errors {
            eprintln!("{} {}", red("✗"), e);
        }
    }

    if !output.errors.is_empty() {
        anyhow::bail!(
            "{}/{} documents failed",
            output.stats.failed_documents,
            output.stats.total_documents
        );
    }
    Ok(())
}

fn print_document(cli: &Cli, document: &ProcessedDocument) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    let mut body = Vec::new();
    if cli.html {
        body.push(document.html.clone());
    }
    if cli.json {
        body.push(document.report.to_json_pretty());
    }
    if body.is_empty() && cli.output_dir.is_none() {
        body.push(document.simplified_text.clone());
    }

    for part in body {
        handle
            .write_all(part.as_bytes())
            .context("Failed to write to stdout")?;
        if !part.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }
    Ok(())
}

fn print_summary(name: &str, document: &ProcessedDocument) {
    let report = &document.report;
    let verdict = if report.is_pass() {
        green("PASS")
    } else {
        yellow("REVIEW")
    };
    eprintln!(
        "{}  {}  ARI {}  grade {}  {} missing ALT  {}ms",
        verdict,
        bold(name),
        report.readability_metrics.automated_readability_index,
        report.readability_metrics.flesch_kincaid_grade,
        report.structure_analysis.alt_missing_count,
        document.stats.total_duration_ms,
    );
}

/// Map CLI args (over an optional config file) to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let base = match cli.config {
        Some(ref path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => PipelineConfig::default(),
    };

    let mut builder = base.into_builder();
    if let Some(mode) = cli.math_mode {
        builder = builder.math_mode(mode.into());
    }
    if cli.strict_delimiters {
        builder = builder.delimiter_policy(DelimiterPolicy::Symmetric);
    }
    if let Some(n) = cli.word_limit {
        builder = builder.sentence_word_limit(n);
    }
    if let Some(t) = cli.ari_threshold {
        builder = builder.ari_threshold(t);
    }
    if let Some(c) = cli.concurrency {
        builder = builder.concurrency(c);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
