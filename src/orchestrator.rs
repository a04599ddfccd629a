//! Threads ChunkSource → Framer → RecordParser → Validator → BatchCommitter,
//! tracking totals and honoring cooperative cancellation.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{DownloadError, SinkError};
use crate::framer::GzipLineFramer;
use crate::record::RawRecord;
use crate::sink::EntrySink;
use crate::source::ChunkSource;
use crate::validator::convert_entry;
use crate::batch::BatchCommitter;

/// Totals reported at end of stream: lines consumed vs. entries persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub total: u64,
    pub valid: u64,
}

/// Drives one end-to-end ingestion run: pulls chunks, frames lines, parses
/// and validates each, and commits survivors in batches.
pub async fn import_url(
    source: &mut dyn ChunkSource,
    sink: &mut dyn EntrySink,
    commit_interval: usize,
    cancellation: CancellationToken,
) -> Result<Counters, DownloadErrorOrSink> {
    let mut framer = GzipLineFramer::new();
    let mut committer = BatchCommitter::new(commit_interval);
    let mut counters = Counters::default();

    loop {
        if cancellation.is_cancelled() {
            info!("ingestion cancelled, flushing current batch");
            committer.flush(sink).await.map_err(DownloadErrorOrSink::Sink)?;
            return Ok(counters);
        }

        let chunk = source.next_chunk().await.map_err(DownloadErrorOrSink::Download)?;
        let lines = match chunk {
            Some((bytes, progress)) => framer.push(bytes, progress),
            None => {
                let tail = framer.finish();
                process_lines(tail, &mut committer, sink, &mut counters).await?;
                break;
            }
        };
        process_lines(lines, &mut committer, sink, &mut counters).await?;
    }

    committer.flush(sink).await.map_err(DownloadErrorOrSink::Sink)?;
    info!(total = counters.total, valid = counters.valid, "ingestion complete");
    Ok(counters)
}

async fn process_lines(
    lines: Vec<(Vec<u8>, Option<f64>)>,
    committer: &mut BatchCommitter,
    sink: &mut dyn EntrySink,
    counters: &mut Counters,
) -> Result<(), DownloadErrorOrSink> {
    for (line, progress) in lines {
        counters.total += 1;
        debug!(progress, total = counters.total, "processing line");

        let record = match RawRecord::parse_line(&line) {
            Ok(r) => r,
            Err(e) => {
                warn!(reason = %e, "rejected record");
                continue;
            }
        };

        match convert_entry(&record) {
            Ok(entry) => {
                committer.push(entry, sink).await.map_err(DownloadErrorOrSink::Sink)?;
                counters.valid += 1;
            }
            Err(e) => {
                warn!(reason = %e, "rejected record");
            }
        }
    }
    Ok(())
}

/// Thin union so `import_url` can surface either collaborator's failure
/// without forcing both into one error enum.
#[derive(Debug, thiserror::Error)]
pub enum DownloadErrorOrSink {
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl From<DownloadErrorOrSink> for crate::errors::IngestError {
    fn from(e: DownloadErrorOrSink) -> Self {
        match e {
            DownloadErrorOrSink::Download(d) => crate::errors::IngestError::Download(d),
            DownloadErrorOrSink::Sink(s) => crate::errors::IngestError::Sink(s),
        }
    }
}
