//! Streaming line assembly over raw byte streams.
//!
//! Container output arrives as arbitrarily chunked bytes; the splitter
//! reassembles it into discrete lines no matter where the chunk boundaries
//! fall, so a line broken across two reads comes out whole.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Read-buffer size used by [`read_lines`].
const READ_BUF: usize = 1024;

/// Splits a sequence of byte chunks into lines, carrying any partial line
/// across chunk boundaries.
///
/// A line is a byte run terminated by `\n`. Trailing `\r` bytes are stripped
/// at emission, so CRLF input behaves like LF input; carriage returns
/// elsewhere in a line are left alone.
#[derive(Debug, Default)]
pub struct LineSplitter {
    leftover: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next chunk and returns the lines it completed, in order.
    ///
    /// A chunk without a line feed only grows the carried partial line.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        let mut pieces = chunk.split(|&b| b == b'\n');
        // split always yields at least one piece, even for an empty chunk
        let first = pieces.next().unwrap_or_default();
        self.leftover.extend_from_slice(first);

        let mut pending = match pieces.next() {
            Some(piece) => piece,
            None => return Vec::new(),
        };

        let mut lines = vec![trim_trailing_cr(std::mem::take(&mut self.leftover))];
        for piece in pieces {
            lines.push(trim_trailing_cr(pending.to_vec()));
            pending = piece;
        }
        self.leftover = pending.to_vec();
        lines
    }

    /// Flushes the final unterminated line, if any.
    pub fn finish(&mut self) -> Option<Bytes> {
        if self.leftover.is_empty() {
            None
        } else {
            Some(trim_trailing_cr(std::mem::take(&mut self.leftover)))
        }
    }
}

fn trim_trailing_cr(mut line: Vec<u8>) -> Bytes {
    while line.last() == Some(&b'\r') {
        line.pop();
    }
    Bytes::from(line)
}

/// Turns a raw byte stream into a lazy, ordered sequence of lines.
///
/// A background task reads `reader` in fixed-size chunks and sends every
/// completed line over the returned stream. The sequence ends once the
/// reader hits end-of-stream, emitting the carried partial line last, and is
/// not restartable. A read error also ends the sequence the same way; the
/// error itself is only logged, never surfaced to line consumers, because
/// log following is best-effort rather than authoritative.
pub fn read_lines<R>(mut reader: R) -> ReceiverStream<Bytes>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(async move {
        let mut buffer = [0u8; READ_BUF];
        let mut splitter = LineSplitter::new();
        loop {
            match reader.read(&mut buffer).await {
                Ok(0) => break,
                Ok(n) => {
                    for line in splitter.push(&buffer[..n]) {
                        if tx.send(line).await.is_err() {
                            // receiver gone, stop following
                            return;
                        }
                    }
                }
                Err(err) => {
                    log::error!("Unexpected error while reading stream: {err}");
                    break;
                }
            }
        }
        if let Some(line) = splitter.finish() {
            let _ = tx.send(line).await;
        }
    });
    ReceiverStream::new(rx)
}
