//! Buffers accepted entries and flushes them to an `EntrySink` every
//! `commit_interval` records and at end-of-stream.

use crate::entry::ProductEntry;
use crate::errors::SinkError;
use crate::sink::EntrySink;

pub struct BatchCommitter {
    commit_interval: usize,
    buffer: Vec<ProductEntry>,
}

impl BatchCommitter {
    pub fn new(commit_interval: usize) -> Self {
        Self { commit_interval, buffer: Vec::with_capacity(commit_interval) }
    }

    /// Adds an entry to the buffer, flushing if it has reached
    /// `commit_interval`. Returns `true` if a commit happened.
    pub async fn push(&mut self, entry: ProductEntry, sink: &mut dyn EntrySink) -> Result<bool, SinkError> {
        self.buffer.push(entry);
        if self.buffer.len() >= self.commit_interval {
            self.flush(sink).await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Commits whatever is currently buffered, if anything.
    pub async fn flush(&mut self, sink: &mut dyn EntrySink) -> Result<(), SinkError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        sink.put_all(&self.buffer).await?;
        sink.commit().await?;
        self.buffer.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::tests_support::InMemorySink;

    fn entry(code: &str) -> ProductEntry {
        ProductEntry { code: code.to_string(), name: code.to_string(), ..Default::default() }
    }

    #[tokio::test]
    async fn flushes_at_commit_interval() {
        let mut sink = InMemorySink::default();
        let mut committer = BatchCommitter::new(2);

        assert!(!committer.push(entry("A"), &mut sink).await.unwrap());
        assert!(committer.push(entry("B"), &mut sink).await.unwrap());
        assert_eq!(sink.commit_count, 1);
        assert_eq!(sink.committed.len(), 2);
    }

    #[tokio::test]
    async fn final_flush_commits_partial_batch() {
        let mut sink = InMemorySink::default();
        let mut committer = BatchCommitter::new(100);
        committer.push(entry("A"), &mut sink).await.unwrap();
        committer.flush(&mut sink).await.unwrap();
        assert_eq!(sink.commit_count, 1);
        assert_eq!(sink.committed.len(), 1);
    }

    #[tokio::test]
    async fn two_hundred_records_at_interval_hundred_commits_twice_plus_final() {
        let mut sink = InMemorySink::default();
        let mut committer = BatchCommitter::new(100);
        for i in 0..200 {
            committer.push(entry(&format!("E{i}")), &mut sink).await.unwrap();
        }
        assert_eq!(sink.commit_count, 2);
        committer.flush(&mut sink).await.unwrap();
        assert_eq!(sink.commit_count, 2, "final flush on an empty buffer is a no-op");
        assert_eq!(sink.committed.len(), 200);
    }
}
