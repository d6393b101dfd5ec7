//! Incremental decoder for upstream server-sent events
//!
//! Bytes arrive in arbitrary chunks. Complete lines are split off at `\n`
//! and only `data:` lines are decoded; everything else (`event:` names,
//! comments, blank separators) is ignored because every provider frame
//! repeats its type inside the JSON payload.

use serde_json::Value;

/// Upstream sentinel some providers send after the last frame
const DONE_SENTINEL: &str = "[DONE]";

/// Buffers partial input and yields decoded JSON frames
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    discarded: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and drain every complete frame
    ///
    /// Bytes are buffered rather than decoded eagerly so a multi-byte
    /// character split across two reads survives intact.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(frame) = self.decode_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Decode whatever is left once the byte stream has ended
    pub fn finish(&mut self) -> Option<Value> {
        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line)
    }

    /// Number of malformed payloads skipped so far
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<Value> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches(['\n', '\r']);
        let payload = line.strip_prefix("data:")?.trim();

        if payload.is_empty() || payload == DONE_SENTINEL {
            return None;
        }

        match serde_json::from_str(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                self.discarded += 1;
                tracing::debug!(error = %e, payload = %payload, "Skipping malformed upstream frame");
                None
            }
        }
    }
}
