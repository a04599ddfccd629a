//! `ChunkSource`: the abstract HTTP-fetch collaborator.

mod jitter;
mod ranged;
mod streaming;

pub use ranged::RangedChunkSource;
pub use streaming::StreamingChunkSource;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::DownloadError;

/// Retryable HTTP statuses and backoff policy shared by both strategies.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub max_redirects: u32,
    pub backoff_factor_secs: f64,
    pub retryable_statuses: &'static [u16],
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            max_redirects: 5,
            backoff_factor_secs: 1.0,
            retryable_statuses: &[413, 429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Backoff delay before attempt number `attempt` (1-indexed), following
    /// the conventional `backoff_factor * 2^(attempt-1)` curve plus a small
    /// jitter so many failing clients don't retry in lockstep.
    pub fn delay_for_attempt(&self, attempt: u32) -> std::time::Duration {
        let base_ms = (self.backoff_factor_secs * 1000.0) * 2f64.powi(attempt.saturating_sub(1) as i32);
        let jitter_ms = jitter::generate_jitter_percent(base_ms as u64, 25);
        std::time::Duration::from_millis(base_ms as u64 + jitter_ms)
    }
}

/// A lazy, finite sequence of `(chunk, progress)` pairs pulled over HTTP.
/// `progress` is `None` until the content length is known, `Some(1.0)` on
/// the final chunk when it is.
#[async_trait]
pub trait ChunkSource: Send {
    async fn next_chunk(&mut self) -> Result<Option<(Bytes, Option<f64>)>, DownloadError>;
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    /// An in-memory `ChunkSource` used by framer/orchestrator tests, so they
    /// don't need a real HTTP server.
    pub struct FixedChunkSource {
        chunks: std::vec::IntoIter<Bytes>,
        total: usize,
        emitted: usize,
    }

    impl FixedChunkSource {
        pub fn new(chunks: Vec<Bytes>) -> Self {
            let total = chunks.len();
            Self { chunks: chunks.into_iter(), total, emitted: 0 }
        }
    }

    #[async_trait]
    impl ChunkSource for FixedChunkSource {
        async fn next_chunk(&mut self) -> Result<Option<(Bytes, Option<f64>)>, DownloadError> {
            match self.chunks.next() {
                Some(chunk) => {
                    self.emitted += 1;
                    let progress = Some(self.emitted as f64 / self.total as f64);
                    Ok(Some((chunk, progress)))
                }
                None => Ok(None),
            }
        }
    }
}
