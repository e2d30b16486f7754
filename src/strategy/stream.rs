//! Pull-based streaming decompression.
//!
//! A [`DecoderStream`] wraps the same `Read` decoder that buffered
//! decompression drains with `read_to_end`, and hands out the output in
//! fixed-size pieces as the consumer polls. Length verification against the
//! chunk's `original_size` happens at end-of-stream; a mismatch or decoder
//! error is yielded as a stream item rather than dropped.

use std::io::{ErrorKind, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::Stream;

use crate::error::{AdaptiveError, Result};

/// Default piece size emitted per poll
pub const STREAM_PIECE_SIZE: usize = 64 * 1024;

/// Upper bound on the buffer reserved up front from a chunk's declared size
pub const PREALLOC_LIMIT: usize = 16 * 1024 * 1024;

/// Boxed stream of decompressed pieces
pub type DecompressStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Stream adapter over a blocking in-memory decoder
pub struct DecoderStream {
    reader: Box<dyn Read + Send>,
    algorithm: String,
    expected: usize,
    produced: usize,
    piece_size: usize,
    finished: bool,
}

impl DecoderStream {
    /// Wrap a decoder expected to yield exactly `expected` bytes
    pub fn new(
        reader: impl Read + Send + 'static,
        algorithm: impl Into<String>,
        expected: usize,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            algorithm: algorithm.into(),
            expected,
            produced: 0,
            piece_size: STREAM_PIECE_SIZE,
            finished: false,
        }
    }

    /// Override the piece size (minimum 1)
    pub fn with_piece_size(mut self, piece_size: usize) -> Self {
        self.piece_size = piece_size.max(1);
        self
    }

    /// Box into a [`DecompressStream`]
    pub fn boxed(self) -> DecompressStream {
        Box::pin(self)
    }

    fn fail(&mut self, message: String) -> Option<Result<Bytes>> {
        self.finished = true;
        Some(Err(AdaptiveError::Decompression(format!(
            "{}: {message}",
            self.algorithm
        ))))
    }

    fn next_piece(&mut self) -> Option<Result<Bytes>> {
        if self.finished {
            return None;
        }

        let mut buf = BytesMut::zeroed(self.piece_size);
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => {
                    self.finished = true;
                    if self.produced != self.expected {
                        let message = format!(
                            "decoded {} bytes, expected {}",
                            self.produced, self.expected
                        );
                        return self.fail(message);
                    }
                    return None;
                },
                Ok(n) => {
                    self.produced += n;
                    if self.produced > self.expected {
                        let message = format!(
                            "decoded more than the expected {} bytes",
                            self.expected
                        );
                        return self.fail(message);
                    }
                    buf.truncate(n);
                    return Some(Ok(buf.freeze()));
                },
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return self.fail(e.to_string()),
            }
        }
    }
}

impl Stream for DecoderStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // Decoding is in-memory, so every poll completes immediately.
        Poll::Ready(self.get_mut().next_piece())
    }
}

/// Drain a decoder fully, verifying the decoded length.
///
/// Reading stops one byte past `expected`, so an oversized payload is
/// rejected without being fully inflated.
pub(crate) fn decode_all(reader: impl Read, algorithm: &str, expected: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected.min(PREALLOC_LIMIT));
    let limit = u64::try_from(expected).unwrap_or(u64::MAX).saturating_add(1);
    reader
        .take(limit)
        .read_to_end(&mut out)
        .map_err(|e| AdaptiveError::Decompression(format!("{algorithm}: {e}")))?;

    if out.len() > expected {
        return Err(AdaptiveError::Decompression(format!(
            "{algorithm}: decoded more than the expected {expected} bytes"
        )));
    }
    if out.len() != expected {
        return Err(AdaptiveError::Decompression(format!(
            "{algorithm}: decoded {} bytes, expected {expected}",
            out.len()
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_stream_emits_all_pieces() {
        let data = vec![7u8; 10_000];
        let stream = DecoderStream::new(Cursor::new(data.clone()), "raw", data.len())
            .with_piece_size(4096);

        let pieces: Vec<_> = stream.collect().await;
        assert_eq!(pieces.len(), 3);

        let joined: Vec<u8> = pieces
            .into_iter()
            .flat_map(|p| p.unwrap().to_vec())
            .collect();
        assert_eq!(joined, data);
    }

    #[tokio::test]
    async fn test_stream_reports_short_output() {
        let mut stream = DecoderStream::new(Cursor::new(vec![1u8; 10]), "raw", 20);

        assert!(stream.next().await.unwrap().is_ok());
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, AdaptiveError::Decompression(_)));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_stream_ends_immediately() {
        let mut stream = DecoderStream::new(Cursor::new(Vec::new()), "raw", 0);
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_decode_all_length_check() {
        assert_eq!(decode_all(Cursor::new(vec![1u8, 2]), "raw", 2).unwrap(), vec![1, 2]);
        assert!(decode_all(Cursor::new(vec![1u8, 2]), "raw", 3).is_err());
    }

    #[test]
    fn test_decode_all_rejects_oversized_declared_length() {
        for declared in [usize::MAX, 1 << 46] {
            let err = decode_all(Cursor::new(vec![1u8; 32]), "raw", declared).unwrap_err();
            assert!(matches!(err, AdaptiveError::Decompression(_)));
        }
    }

    #[test]
    fn test_decode_all_stops_past_expected() {
        // Endless source; the read must stop instead of draining it
        let err = decode_all(std::io::repeat(0), "raw", 1024).unwrap_err();
        assert!(err.to_string().contains("more than the expected 1024"));
    }
}
