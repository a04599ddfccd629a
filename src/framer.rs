//! Gzip-aware streaming decoder that frames newline-delimited records across
//! arbitrary chunk boundaries.
//!
//! Built on [`flate2::Decompress`], the low-level streaming inflate API,
//! rather than `GzDecoder<R: Read>` — the latter needs a full `Read` source
//! up front, which defeats the point of decoding chunk-by-chunk as bytes
//! arrive off the wire.

use bytes::Bytes;
use flate2::{Decompress, FlushDecompress, Status};

/// Minimum number of input bytes to accumulate before feeding the
/// decompressor — shorter than this and a chunk may not even contain a
/// complete gzip header.
const MIN_BLOCK_SIZE: usize = 42;

/// Progress fraction attached to a chunk or line, `None` when the total
/// length is unknown.
pub type Progress = Option<f64>;

/// Splits a decompressed, gzip-wrapped byte stream into lines, fed one
/// chunk at a time.
///
/// `flate2::Decompress` only speaks raw deflate / zlib, not the gzip
/// container (magic bytes, optional filename/comment/CRC16, footer), so the
/// gzip member header is parsed and stripped here before anything is handed
/// to the decompressor — the same division of labor `flate2::read::GzDecoder`
/// does internally, just incremental rather than over a full `Read`.
pub struct GzipLineFramer {
    decompressor: Decompress,
    partial_input: Vec<u8>,
    partial_output: Option<Vec<u8>>,
    header_stripped: bool,
    finished: bool,
    last_progress: Progress,
}

impl Default for GzipLineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl GzipLineFramer {
    pub fn new() -> Self {
        Self {
            decompressor: Decompress::new(false),
            partial_input: Vec::new(),
            partial_output: None,
            header_stripped: false,
            finished: false,
            last_progress: None,
        }
    }

    /// Feeds one chunk of compressed bytes, returning the complete lines it
    /// produced (trailing `\n` stripped), each tagged with `progress`.
    pub fn push(&mut self, chunk: Bytes, progress: Progress) -> Vec<(Vec<u8>, Progress)> {
        self.last_progress = progress;
        self.partial_input.extend_from_slice(&chunk);
        if self.partial_input.len() < MIN_BLOCK_SIZE {
            return Vec::new();
        }
        self.drain(progress, FlushDecompress::None)
    }

    /// Signals end-of-input: flushes any remaining buffered input through
    /// the decompressor and emits the final buffered line exactly once,
    /// tagged with whatever progress the last `push` carried rather than a
    /// fabricated completion fraction.
    pub fn finish(&mut self) -> Vec<(Vec<u8>, Progress)> {
        if self.finished {
            return Vec::new();
        }
        let progress = self.last_progress;
        let mut lines = self.drain(progress, FlushDecompress::Finish);
        self.finished = true;
        if let Some(tail) = self.partial_output.take() {
            lines.push((tail, progress));
        }
        lines
    }

    fn drain(&mut self, progress: Progress, flush: FlushDecompress) -> Vec<(Vec<u8>, Progress)> {
        if !self.header_stripped {
            match gzip_header_len(&self.partial_input) {
                Some(header_len) => {
                    self.partial_input.drain(..header_len);
                    self.header_stripped = true;
                }
                None => return Vec::new(),
            }
        }

        let mut decompressed = Vec::new();
        let mut buf = [0u8; 64 * 1024];
        let mut offset = 0;
        loop {
            let before_in = self.decompressor.total_in();
            let before_out = self.decompressor.total_out();
            let status = self
                .decompressor
                .decompress(&self.partial_input[offset..], &mut buf, flush)
                .unwrap_or(Status::StreamEnd);
            let consumed = (self.decompressor.total_in() - before_in) as usize;
            let produced = (self.decompressor.total_out() - before_out) as usize;
            decompressed.extend_from_slice(&buf[..produced]);
            offset += consumed;

            match status {
                Status::Ok if consumed == 0 && produced == 0 => break,
                Status::BufError => break,
                Status::StreamEnd => break,
                _ => {
                    if offset >= self.partial_input.len() {
                        break;
                    }
                }
            }
        }
        self.partial_input.drain(..offset);

        split_lines(decompressed, &mut self.partial_output, progress)
    }
}

const FHCRC: u8 = 1 << 1;
const FEXTRA: u8 = 1 << 2;
const FNAME: u8 = 1 << 3;
const FCOMMENT: u8 = 1 << 4;

/// Parses an RFC 1952 gzip member header and returns its length in bytes, or
/// `None` if `buf` doesn't yet hold a complete header.
fn gzip_header_len(buf: &[u8]) -> Option<usize> {
    if buf.len() < 10 || buf[0] != 0x1f || buf[1] != 0x8b {
        return None;
    }
    let flags = buf[3];
    let mut pos = 10;

    if flags & FEXTRA != 0 {
        let xlen = *buf.get(pos)? as usize | (*buf.get(pos + 1)? as usize) << 8;
        pos += 2 + xlen;
    }
    if flags & FNAME != 0 {
        pos += find_nul(buf, pos)? + 1;
    }
    if flags & FCOMMENT != 0 {
        pos += find_nul(buf, pos)? + 1;
    }
    if flags & FHCRC != 0 {
        pos += 2;
    }

    if pos > buf.len() {
        None
    } else {
        Some(pos)
    }
}

/// Returns the offset of the next `0x00` byte at or after `start`, relative
/// to `start`, or `None` if the terminator hasn't arrived yet.
fn find_nul(buf: &[u8], start: usize) -> Option<usize> {
    buf.get(start..)?.iter().position(|&b| b == 0)
}

fn split_lines(decompressed: Vec<u8>, partial_output: &mut Option<Vec<u8>>, progress: Progress) -> Vec<(Vec<u8>, Progress)> {
    if decompressed.is_empty() {
        return Vec::new();
    }

    let mut pieces: Vec<&[u8]> = decompressed.split(|&b| b == b'\n').collect();
    let last = pieces.pop().expect("split always yields at least one piece");

    let mut lines = Vec::new();

    if pieces.is_empty() {
        // No newline in this chunk: extend the running partial line.
        let mut extended = partial_output.take().unwrap_or_default();
        extended.extend_from_slice(last);
        *partial_output = Some(extended);
        return lines;
    }

    let mut first = partial_output.take().unwrap_or_default();
    first.extend_from_slice(pieces[0]);
    lines.push((first, progress));

    for piece in &pieces[1..] {
        lines.push((piece.to_vec(), progress));
    }

    *partial_output = Some(last.to_vec());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn run(compressed: &[u8], chunk_size: usize) -> Vec<Vec<u8>> {
        let mut framer = GzipLineFramer::new();
        let mut out = Vec::new();
        for chunk in compressed.chunks(chunk_size.max(1)) {
            for (line, _) in framer.push(Bytes::copy_from_slice(chunk), None) {
                out.push(line);
            }
        }
        for (line, _) in framer.finish() {
            out.push(line);
        }
        out
    }

    #[test]
    fn round_trip_simple() {
        let compressed = gzip(b"a\nbb\nccc");
        let lines = run(&compressed, 8192);
        assert_eq!(lines, vec![b"a".to_vec(), b"bb".to_vec(), b"ccc".to_vec()]);
    }

    #[test]
    fn trailing_newline_yields_final_empty_line() {
        let compressed = gzip(b"a\nb\n");
        let lines = run(&compressed, 8192);
        assert_eq!(lines, vec![b"a".to_vec(), b"b".to_vec(), b"".to_vec()]);
    }

    #[test]
    fn no_newline_yields_one_line() {
        let compressed = gzip(b"nosplithere");
        let lines = run(&compressed, 8192);
        assert_eq!(lines, vec![b"nosplithere".to_vec()]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let compressed = gzip(b"");
        let lines = run(&compressed, 8192);
        assert!(lines.is_empty());
    }

    #[test]
    fn survives_chunks_smaller_than_gzip_header() {
        let data: Vec<u8> = (0..5000).map(|i| if i % 37 == 0 { b'\n' } else { b'x' }).collect();
        let compressed = gzip(&data);
        let expected: Vec<Vec<u8>> = data.split(|&b| b == b'\n').map(|s| s.to_vec()).collect();

        for chunk_size in [1usize, 2, 4, 16] {
            let lines = run(&compressed, chunk_size);
            assert_eq!(lines, expected, "mismatch at chunk_size={chunk_size}");
        }
    }

    fn run_with_progress(compressed: &[u8], chunk_size: usize) -> Vec<(Vec<u8>, Progress)> {
        let mut framer = GzipLineFramer::new();
        let mut out = Vec::new();
        let total = compressed.len();
        let mut sent = 0;
        for chunk in compressed.chunks(chunk_size.max(1)) {
            sent += chunk.len();
            let progress = Some(sent as f64 / total as f64);
            out.extend(framer.push(Bytes::copy_from_slice(chunk), progress));
        }
        out.extend(framer.finish());
        out
    }

    proptest::proptest! {
        /// Whatever text goes in, however it's chunked, the lines that come
        /// back out rejoin (with `\n`) to the original text.
        #[test]
        fn round_trip_any_text(text in ".{0,2000}", chunk_size in 1usize..64) {
            let compressed = gzip(text.as_bytes());
            let lines = run(&compressed, chunk_size);
            let rejoined = lines.join(&b'\n');
            proptest::prop_assert_eq!(rejoined, text.into_bytes());
        }

        /// The progress fraction attached to each emitted line never
        /// decreases across the stream.
        #[test]
        fn progress_is_monotonic(text in ".{0,2000}", chunk_size in 1usize..64) {
            let compressed = gzip(text.as_bytes());
            let lines = run_with_progress(&compressed, chunk_size);
            let mut last = 0.0;
            for (_, progress) in lines {
                if let Some(p) = progress {
                    proptest::prop_assert!(p >= last);
                    last = p;
                }
            }
        }
    }
}
