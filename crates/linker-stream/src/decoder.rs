//! Line framing for the assistant response stream.
//!
//! The service writes one frame per line, `data: <payload>\n`. Reads may end
//! anywhere, including inside a multi-byte character, so the buffer holds raw
//! bytes and only complete lines are decoded.

use futures::Stream;
use tokio_stream::StreamExt;
use tracing::debug;

pub const FRAME_PREFIX: &str = "data: ";

/// One `data:` line with the prefix stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFrame {
    pub raw: String,
}

/// Incremental frame decoder. Owns the partial trailing line of one stream.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every frame it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete[..last_newline]
            .split(|&b| b == b'\n')
            .filter_map(|line| {
                let line = String::from_utf8_lossy(line);
                let line = line.strip_suffix('\r').unwrap_or(&line);
                line.strip_prefix(FRAME_PREFIX).map(|raw| StreamFrame {
                    raw: raw.to_string(),
                })
            })
            .collect()
    }

    /// Bytes held for a line that has not been terminated yet.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// End of stream. An unterminated trailing line is dropped, never emitted.
    /// Returns the number of bytes discarded.
    pub fn finish(self) -> usize {
        self.buffer.len()
    }
}

/// Turn a chunk stream into a frame stream.
///
/// A transport error is yielded once and ends the stream; whatever was
/// buffered at that point is dropped.
pub fn decode_frames<S, B, E>(chunks: S) -> impl Stream<Item = Result<StreamFrame, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    async_stream::stream! {
        let mut decoder = FrameDecoder::new();
        tokio::pin!(chunks);

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    for frame in decoder.push(bytes.as_ref()) {
                        yield Ok(frame);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        let dropped = decoder.finish();
        if dropped > 0 {
            debug!("Discarding {} bytes of unterminated trailing frame", dropped);
        }
    }
}
