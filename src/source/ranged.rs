use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::warn;

use crate::errors::DownloadError;

use super::{ChunkSource, RetryPolicy};

/// Strategy B: `HEAD` to learn `Content-Length`, then successive ranged
/// `GET`s sized to `chunk_size`.
pub struct RangedChunkSource {
    client: Client,
    url: String,
    chunk_size: u64,
    retry_policy: RetryPolicy,
    content_length: Option<u64>,
    position: u64,
}

impl RangedChunkSource {
    pub fn new(client: Client, url: impl Into<String>, chunk_size: u64, retry_policy: RetryPolicy) -> Self {
        Self {
            client,
            url: url.into(),
            chunk_size,
            retry_policy,
            content_length: None,
            position: 0,
        }
    }

    async fn content_length(&mut self) -> Result<u64, DownloadError> {
        if let Some(len) = self.content_length {
            return Ok(len);
        }
        let resp = self.client.head(&self.url).send().await?;
        let len = resp.content_length().ok_or(DownloadError::NoContentLength)?;
        self.content_length = Some(len);
        Ok(len)
    }

    async fn fetch_range(&self, start: u64, end: u64) -> Result<Bytes, DownloadError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = self
                .client
                .get(&self.url)
                .header("Range", format!("bytes={start}-{end}"))
                .send()
                .await;
            match result {
                Ok(resp) if resp.status().is_success() => return Ok(resp.bytes().await?),
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if self.retry_policy.is_retryable(status) && attempt < self.retry_policy.max_attempts {
                        let delay = self.retry_policy.delay_for_attempt(attempt);
                        warn!(%status, attempt, ?delay, "retryable HTTP status on ranged GET, backing off");
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
                    warn!(error = %e, attempt, ?delay, "transport error on ranged GET, backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl ChunkSource for RangedChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<(Bytes, Option<f64>)>, DownloadError> {
        let len = self.content_length().await?;
        if self.position >= len {
            return Ok(None);
        }
        let end = (self.position + self.chunk_size - 1).min(len - 1);
        let bytes = self.fetch_range(self.position, end).await?;
        self.position = end + 1;
        let progress = (self.position as f64 / len as f64).min(1.0);
        Ok(Some((bytes, Some(progress))))
    }
}
