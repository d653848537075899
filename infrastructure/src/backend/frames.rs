//! Streaming chat frame decoding.
//!
//! The chat endpoint answers with newline-delimited frames:
//!
//! ```text
//! data: {"content": "Hel"}
//!
//! data: {"content": "lo"}
//!
//! data: [DONE]
//! ```
//!
//! [`FrameDecoder`] turns raw byte chunks, split at arbitrary boundaries,
//! into content deltas. [`decode_deltas`] wraps a byte stream into the
//! application's [`DeltaStream`].

use chatline_application::ports::chat_api::{ApiError, DeltaStream};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;
use std::pin::Pin;
use tracing::{debug, trace};

/// Prefix of every content-bearing line.
pub const DATA_PREFIX: &str = "data: ";

/// Payload of the terminal frame.
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct ContentFrame {
    content: Option<String>,
}

/// What a single complete line means.
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Delta(String),
    Done,
    Skip,
}

fn parse_line(line: &str) -> Frame {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Skip;
    };
    if payload == DONE_SENTINEL {
        return Frame::Done;
    }

    match serde_json::from_str::<ContentFrame>(payload) {
        Ok(ContentFrame {
            content: Some(content),
        }) => Frame::Delta(content),
        Ok(_) => {
            trace!("Frame without content field: {}", payload);
            Frame::Skip
        }
        Err(e) => {
            debug!("Dropping malformed frame ({}): {}", e, payload);
            Frame::Skip
        }
    }
}

/// Incremental decoder for one chat response.
///
/// Keeps undecoded UTF-8 bytes and the trailing partial line between calls
/// to [`feed`](Self::feed). Once the `[DONE]` frame is seen the decoder is
/// finished and ignores all further input.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes of a multi-byte character split across chunks.
    undecoded: Vec<u8>,
    /// Decoded text not yet terminated by a newline.
    pending: String,
    done: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the terminal frame has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one raw chunk, returning the deltas of every line it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.decode_utf8(chunk);

        let mut deltas = Vec::new();
        while let Some(newline) = self.pending.find('\n') {
            let raw: String = self.pending.drain(..=newline).collect();
            let line = raw.trim_end_matches('\n').trim_end_matches('\r');

            match parse_line(line) {
                Frame::Delta(content) => deltas.push(content),
                Frame::Done => {
                    trace!("Terminal frame received");
                    self.done = true;
                    self.pending.clear();
                    self.undecoded.clear();
                    break;
                }
                Frame::Skip => {}
            }
        }
        deltas
    }

    /// Bytes and text still buffered, waiting for more input.
    pub fn buffered_len(&self) -> usize {
        self.undecoded.len() + self.pending.len()
    }

    /// Append `chunk` to the text accumulator, holding back an incomplete
    /// trailing character. Invalid sequences become U+FFFD.
    fn decode_utf8(&mut self, chunk: &[u8]) {
        self.undecoded.extend_from_slice(chunk);

        let Self {
            undecoded, pending, ..
        } = self;
        let mut input: &[u8] = undecoded.as_slice();
        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    pending.push_str(text);
                    input = &[];
                    break;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    pending.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            pending.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                        None => {
                            input = rest;
                            break;
                        }
                    }
                }
            }
        }

        let consumed = undecoded.len() - input.len();
        undecoded.drain(..consumed);
    }
}

/// Decode a raw byte stream into a stream of content deltas.
///
/// The returned stream ends after `[DONE]` or when `bytes` ends; an
/// unterminated trailing line is discarded. A transport error is yielded
/// once and ends the stream.
pub fn decode_deltas<S, B, E>(bytes: S) -> DeltaStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    struct State<S> {
        bytes: Pin<Box<S>>,
        decoder: FrameDecoder,
        ready: VecDeque<String>,
        finished: bool,
    }

    let state = State {
        bytes: Box::pin(bytes),
        decoder: FrameDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(delta) = state.ready.pop_front() {
                return Some((Ok(delta), state));
            }
            if state.finished || state.decoder.is_done() {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let deltas = state.decoder.feed(chunk.as_ref());
                    state.ready.extend(deltas);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e.into()), state));
                }
                None => {
                    if state.decoder.buffered_len() > 0 {
                        debug!(
                            "Stream closed with {} unterminated bytes",
                            state.decoder.buffered_len()
                        );
                    }
                    state.finished = true;
                }
            }
        }
    }))
}
