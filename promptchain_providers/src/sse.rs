//! Server-sent-event decoding for streaming completions.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::{Stream, StreamExt};
use promptchain_core::{EventStream, StreamEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    Event(StreamEvent),
    Done,
}

/// Splits a byte stream into `data:` lines.
///
/// Bytes are buffered until a full line is available so that multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feed one chunk, returning every complete line it finished.
    pub fn push(&mut self, chunk: &[u8]) -> anyhow::Result<Vec<SseLine>> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            if let Some(parsed) = Self::parse_line(&line)? {
                lines.push(parsed);
            }
        }
        Ok(lines)
    }

    /// Flush a trailing line that arrived without a newline.
    pub fn finish(&mut self) -> anyhow::Result<Option<SseLine>> {
        let line = std::mem::take(&mut self.buffer);
        Self::parse_line(&line)
    }

    fn parse_line(raw: &[u8]) -> anyhow::Result<Option<SseLine>> {
        let line = std::str::from_utf8(raw)?.trim();
        // Comments, blank separators and `event:` fields carry nothing for us.
        let Some(data) = line.strip_prefix("data:") else {
            return Ok(None);
        };
        let data = data.trim_start();
        if data == "[DONE]" {
            return Ok(Some(SseLine::Done));
        }
        let event = serde_json::from_str(data)
            .map_err(|e| anyhow::anyhow!("Invalid stream event {data:?}: {e}"))?;
        Ok(Some(SseLine::Event(event)))
    }
}

struct DecodeState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<anyhow::Result<StreamEvent>>,
    done: bool,
}

/// Turn a raw body stream into a stream of decoded events.
///
/// The stream ends at `data: [DONE]` or when the body ends. A transport or
/// decode error is yielded once and ends the stream.
pub fn event_stream<S, B, E>(bytes: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<anyhow::Error> + Send + 'static,
{
    let state = DecodeState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => match state.decoder.push(chunk.as_ref()) {
                    Ok(lines) => {
                        for line in lines {
                            match line {
                                SseLine::Event(event) => state.pending.push_back(Ok(event)),
                                SseLine::Done => {
                                    state.done = true;
                                    break;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        state.done = true;
                        state.pending.push_back(Err(e));
                    }
                },
                Some(Err(e)) => {
                    state.done = true;
                    state.pending.push_back(Err(e.into()));
                }
                None => {
                    state.done = true;
                    match state.decoder.finish() {
                        Ok(Some(SseLine::Event(event))) => state.pending.push_back(Ok(event)),
                        Ok(_) => {}
                        Err(e) => state.pending.push_back(Err(e)),
                    }
                }
            }
        }
    })
    .boxed()
}
