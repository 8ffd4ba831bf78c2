// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newline framing for the byte-stream transport.
//!
//! Input arrives in arbitrary chunks. Complete lines are parsed as JSON and
//! yielded in arrival order; the trailing fragment stays buffered until its
//! delimiter arrives. Blank lines are dropped. Lines that fail to parse become
//! [`Frame::Invalid`] so the caller can answer with a parse error and keep going.

use bytes::BytesMut;
use serde_json::Value;
use tokio_util::codec::Decoder;
use tracing::warn;

use crate::error::ErrorDetail;

/// Longest line accepted before the framer starts discarding.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// One complete line from the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Message(Value),
    Invalid(ErrorDetail),
}

#[derive(Debug)]
pub struct LineFramer {
    max_frame_bytes: usize,
    /// Bytes of the buffer already searched for a delimiter.
    scanned: usize,
    /// Dropping the remainder of an over-long line.
    discarding: bool,
    /// Buffer used by [`LineFramer::push`].
    pending: BytesMut,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl LineFramer {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes, scanned: 0, discarding: false, pending: BytesMut::new() }
    }

    /// Feed one chunk and collect every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.pending.extend_from_slice(chunk);
        let mut pending = std::mem::take(&mut self.pending);
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame(&mut pending) {
            frames.push(frame);
        }
        self.pending = pending;
        frames
    }

    /// Bytes buffered while waiting for a delimiter.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    fn next_frame(&mut self, buf: &mut BytesMut) -> Option<Frame> {
        loop {
            let newline = buf[self.scanned..].iter().position(|b| *b == b'\n');
            let Some(offset) = newline else {
                if self.discarding {
                    buf.clear();
                    self.scanned = 0;
                    return None;
                }
                if buf.len() > self.max_frame_bytes {
                    buf.clear();
                    self.scanned = 0;
                    self.discarding = true;
                    return Some(self.oversized());
                }
                self.scanned = buf.len();
                return None;
            };

            let end = self.scanned + offset;
            let line = buf.split_to(end + 1);
            self.scanned = 0;

            if self.discarding {
                self.discarding = false;
                continue;
            }
            if end > self.max_frame_bytes {
                return Some(self.oversized());
            }
            if let Some(frame) = parse_line(&line[..end]) {
                return Some(frame);
            }
        }
    }

    fn oversized(&self) -> Frame {
        Frame::Invalid(ErrorDetail::parse_error(format!(
            "message exceeds {} bytes",
            self.max_frame_bytes
        )))
    }
}

/// Parse one delimiter-free line. Blank lines yield nothing.
fn parse_line(line: &[u8]) -> Option<Frame> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text,
        Err(e) => return Some(Frame::Invalid(ErrorDetail::parse_error(e))),
    };
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(match serde_json::from_str::<Value>(text) {
        Ok(value) => Frame::Message(value),
        Err(e) => Frame::Invalid(ErrorDetail::parse_error(e)),
    })
}

impl Decoder for LineFramer {
    type Item = Frame;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, Self::Error> {
        Ok(self.next_frame(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, Self::Error> {
        if let Some(frame) = self.next_frame(buf) {
            return Ok(Some(frame));
        }
        if !buf.iter().all(u8::is_ascii_whitespace) {
            warn!(bytes = buf.len(), "discarding incomplete message at end of input");
        }
        buf.clear();
        self.scanned = 0;
        self.discarding = false;
        Ok(None)
    }
}

#[cfg(test)]
#[path = "framer_tests.rs"]
mod tests;
