use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::{Client, Response};
use tracing::{debug, warn};

use crate::errors::DownloadError;

use super::{ChunkSource, RetryPolicy};

/// Strategy A: a single streamed `GET`, re-chunked to at most `chunk_size`
/// bytes per yielded piece.
pub struct StreamingChunkSource {
    client: Client,
    url: String,
    chunk_size: usize,
    retry_policy: RetryPolicy,
    response: Option<Response>,
    content_length: Option<u64>,
    bytes_read: u64,
    pending: BytesMut,
    exhausted: bool,
}

impl StreamingChunkSource {
    pub fn new(client: Client, url: impl Into<String>, chunk_size: usize, retry_policy: RetryPolicy) -> Self {
        Self {
            client,
            url: url.into(),
            chunk_size,
            retry_policy,
            response: None,
            content_length: None,
            bytes_read: 0,
            pending: BytesMut::new(),
            exhausted: false,
        }
    }

    async fn ensure_started(&mut self) -> Result<(), DownloadError> {
        if self.response.is_some() {
            return Ok(());
        }
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.client.get(&self.url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    self.content_length = resp.content_length();
                    self.response = Some(resp);
                    return Ok(());
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if self.retry_policy.is_retryable(status) && attempt < self.retry_policy.max_attempts {
                        let delay = self.retry_policy.delay_for_attempt(attempt);
                        warn!(%status, attempt, ?delay, "retryable HTTP status, backing off");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(DownloadError::Http {
                        status,
                        message: resp.status().canonical_reason().unwrap_or("unknown").to_string(),
                    });
                }
                Err(e) => {
                    if attempt >= self.retry_policy.max_attempts {
                        return Err(DownloadError::RetriesExhausted(e.to_string()));
                    }
                    let delay = self.retry_policy.delay_for_attempt(attempt);
                    warn!(error = %e, attempt, ?delay, "transport error, backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn progress(&self) -> Option<f64> {
        self.content_length.map(|len| {
            if len == 0 {
                1.0
            } else {
                (self.bytes_read as f64 / len as f64).min(1.0)
            }
        })
    }
}

#[async_trait]
impl ChunkSource for StreamingChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<(Bytes, Option<f64>)>, DownloadError> {
        loop {
            if self.pending.len() >= self.chunk_size {
                let chunk = self.pending.split_to(self.chunk_size).freeze();
                return Ok(Some((chunk, self.progress())));
            }

            if self.exhausted {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let chunk = std::mem::take(&mut self.pending).freeze();
                return Ok(Some((chunk, self.progress())));
            }

            self.ensure_started().await?;
            let response = self.response.as_mut().expect("started above");
            match response.chunk().await {
                Ok(Some(bytes)) => {
                    self.bytes_read += bytes.len() as u64;
                    self.pending.extend_from_slice(&bytes);
                    debug!(bytes = bytes.len(), total = self.bytes_read, "received streaming chunk");
                }
                Ok(None) => self.exhausted = true,
                Err(e) => return Err(DownloadError::Transport(e)),
            }
        }
    }
}
