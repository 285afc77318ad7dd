//! Incremental decoder for the analysis event stream.
//!
//! The backend answers `POST /api/prepare` with newline-delimited frames:
//!
//! ```text
//! data: {"type":"steps","steps":[...]}
//!
//! data: {"type":"progress","stepIndex":0,"status":"active","progress":10}
//! ```
//!
//! Chunks arrive with arbitrary boundaries. Bytes are buffered undecoded and
//! split on `\n`; a line is only turned into text once it is complete, so a
//! multi-byte character split across two chunks is never decoded in halves.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::event::StreamEvent;

/// Prefix marking a frame line.
pub const FRAME_PREFIX: &str = "data: ";

/// Splits a chunked byte stream into decoded frame payloads.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the frames completed by it, in order.
    ///
    /// The trailing incomplete line stays buffered for the next chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            if let Some(frame) = parse_line(&self.buffer[start..end]) {
                frames.push(frame);
            }
            start = end + 1;
        }
        self.buffer.drain(..start);

        frames
    }

    /// Flushes the leftover buffer at end of stream.
    pub fn finish(self) -> Option<Value> {
        parse_line(&self.buffer)
    }
}

/// Parses one complete line. Non-frame lines and frames with invalid JSON
/// yield `None`.
fn parse_line(raw: &[u8]) -> Option<Value> {
    let line = String::from_utf8_lossy(raw);
    let payload = line.trim().strip_prefix(FRAME_PREFIX)?;

    match serde_json::from_str(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "Dropping malformed frame");
            None
        }
    }
}

struct DecodeState {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>,
    decoder: Option<FrameDecoder>,
    pending: VecDeque<StreamEvent>,
}

/// Turns a response body into a lazy stream of typed events.
///
/// Events come out in the order their frames complete. A read error is
/// yielded once as an `Err` item and ends the stream; frames already decoded
/// before the error are yielded first.
pub fn decode_events<S>(bytes: S) -> impl Stream<Item = Result<StreamEvent>> + Send
where
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    let state = DecodeState {
        inner: Box::pin(bytes),
        decoder: Some(FrameDecoder::new()),
        pending: VecDeque::new(),
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((Ok(event), state));
            }
            // Decoder is gone once the body ended or failed
            state.decoder.as_ref()?;

            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    if let Some(decoder) = state.decoder.as_mut() {
                        let frames = decoder.push(&chunk);
                        state
                            .pending
                            .extend(frames.into_iter().filter_map(StreamEvent::from_frame));
                    }
                }
                Some(Err(e)) => {
                    state.decoder = None;
                    return Some((Err(e), state));
                }
                None => {
                    let last = state.decoder.take().and_then(FrameDecoder::finish);
                    state
                        .pending
                        .extend(last.and_then(StreamEvent::from_frame));
                }
            }
        }
    })
}
