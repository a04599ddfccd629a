//! End-to-end `import_url` scenarios driven through the public API only
//! (own fakes, since the library's internal test doubles aren't visible
//! across the crate boundary).

use std::collections::BTreeMap;
use std::io::Write;

use async_trait::async_trait;
use bytes::Bytes;
use off_catalog_ingest::entry::ProductEntry;
use off_catalog_ingest::errors::{DownloadError, SinkError};
use off_catalog_ingest::orchestrator::import_url;
use off_catalog_ingest::sink::EntrySink;
use off_catalog_ingest::source::ChunkSource;
use tokio_util::sync::CancellationToken;

struct OneShotChunkSource {
    chunk: Option<Bytes>,
}

#[async_trait]
impl ChunkSource for OneShotChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<(Bytes, Option<f64>)>, DownloadError> {
        Ok(self.chunk.take().map(|c| (c, Some(1.0))))
    }
}

#[derive(Default)]
struct RecordingSink {
    staged: Vec<ProductEntry>,
    committed: BTreeMap<String, ProductEntry>,
    commit_count: usize,
}

#[async_trait]
impl EntrySink for RecordingSink {
    async fn put_all(&mut self, batch: &[ProductEntry]) -> Result<(), SinkError> {
        self.staged.extend(batch.iter().cloned());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), SinkError> {
        for entry in self.staged.drain(..) {
            self.committed.insert(entry.code.clone(), entry);
        }
        self.commit_count += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), SinkError> {
        self.staged.clear();
        Ok(())
    }
}

fn gzip_lines(lines: &[String]) -> Vec<u8> {
    let joined = lines.join("\n");
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(joined.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn record(code: &str, extra: &str) -> String {
    format!(
        r#"{{"id":"1","code":"{code}","created_t":1609459200,"product_name":"Test product","codes_tags":["code-13"],"nutriments":{{{extra}}}}}"#
    )
}

#[tokio::test]
async fn skips_malformed_lines_and_rejected_records_but_persists_the_rest() {
    let lines = vec![
        record("4006381333931", r#""energy-kj":100"#),
        "this is not json at all".to_string(),
        // no nutriments at all -> all_nutrients_null rejection
        r#"{"id":"2","code":"4017100290008","created_t":1609459200,"product_name":"No nutrients","codes_tags":["code-13"],"nutriments":{}}"#.to_string(),
        record("4005500106099", r#""energy-kj":200,"fat":5,"fat_unit":"g""#),
    ];
    let compressed = gzip_lines(&lines);

    let mut source = OneShotChunkSource { chunk: Some(Bytes::from(compressed)) };
    let mut sink = RecordingSink::default();

    let counters = import_url(&mut source, &mut sink, 10, CancellationToken::new())
        .await
        .expect("import should succeed");

    assert_eq!(counters.total, 4);
    assert_eq!(counters.valid, 2);
    assert_eq!(sink.committed.len(), 2);
    assert!(sink.committed.contains_key("4006381333931"));
    assert!(sink.committed.contains_key("4005500106099"));
    assert!(!sink.committed.contains_key("4017100290008"));
}

#[tokio::test]
async fn cancellation_flushes_whatever_was_staged_so_far() {
    let lines = vec![record("4006381333931", r#""energy-kj":100"#)];
    let compressed = gzip_lines(&lines);

    let mut source = OneShotChunkSource { chunk: Some(Bytes::from(compressed)) };
    let mut sink = RecordingSink::default();

    let cancellation = CancellationToken::new();
    cancellation.cancel();

    let counters = import_url(&mut source, &mut sink, 10_000, cancellation)
        .await
        .expect("import should succeed even when cancelled up front");

    assert_eq!(counters.total, 0);
    assert_eq!(counters.valid, 0);
}
