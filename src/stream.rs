//! Streaming batch API: emit documents as they complete.
//!
//! Unlike [`crate::convert::process_batch`], which returns after every
//! document finishes, [`process_stream`] yields each result as soon as its
//! document is done. Results arrive in completion order; sort by
//! [`DocumentOutcome::index`] / [`DocumentError::index`] if order matters.

use crate::config::PipelineConfig;
use crate::convert::process_indexed;
use crate::error::DocumentError;
use crate::output::DocumentOutcome;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-document results.
pub type DocumentStream =
    Pin<Box<dyn Stream<Item = Result<DocumentOutcome, DocumentError>> + Send>>;

/// Process text files concurrently, streaming results as they are ready.
///
/// At most `config.concurrency` documents are in flight. Progress callbacks
/// fire per document; `on_batch_start` fires immediately, and there is no
/// `on_batch_complete` since the caller decides when the stream is drained.
///
/// # Example
/// ```rust,no_run
/// use accessibility_hub::{process_stream, PipelineConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let paths = vec!["a.txt".into(), "b.txt".into()];
/// let mut stream = process_stream(paths, &PipelineConfig::default());
/// while let Some(result) = stream.next().await {
///     match result {
///         Ok(d) => println!("{}: {}", d.path.display(), d.document.report.summary_score),
///         Err(e) => eprintln!("{e}"),
///     }
/// }
/// # }
/// ```
pub fn process_stream(paths: Vec<PathBuf>, config: &PipelineConfig) -> DocumentStream {
    let total = paths.len();
    info!("Starting streaming batch of {} document(s)", total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let concurrency = config.concurrency;
    let config = config.clone();
    let s = stream::iter(paths.into_iter().enumerate())
        .map(move |(index, path)| {
            let cfg = config.clone();
            async move { process_indexed(index, path, total, None, &cfg).await }
        })
        .buffer_unordered(concurrency);

    Box::pin(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stream() {
        let mut s = process_stream(Vec::new(), &PipelineConfig::default());
        assert!(tokio_test::block_on(s.next()).is_none());
    }

    #[tokio::test]
    async fn test_stream_yields_every_document() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        std::fs::write(&good, "Overview: Short text.").unwrap();
        let missing = dir.path().join("missing.txt");

        let results: Vec<_> = process_stream(vec![good, missing], &PipelineConfig::default())
            .collect()
            .await;
        assert_eq!(results.len(), 2);
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let err: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(ok, 1);
        assert_eq!(err.len(), 1);
        assert_eq!(err[0].index(), 1);
        assert!(matches!(err[0], DocumentError::ReadFailed { .. }));
    }
}
