// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line encoding for worker messages.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::envelope::WorkerMessage;

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed")]
    ConnectionClosed,
}

/// Encode a message as one newline-terminated JSON line.
///
/// serde_json escapes control characters inside strings, so the only raw
/// newline in the output is the terminator.
pub fn encode(message: &WorkerMessage) -> Result<Vec<u8>, ProtocolError> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    Ok(line)
}

/// Decode one line (with or without its terminator).
pub fn decode(line: &str) -> Result<WorkerMessage, ProtocolError> {
    Ok(serde_json::from_str(line.trim_end())?)
}

/// Write a message and flush it.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &WorkerMessage,
) -> Result<(), ProtocolError> {
    let line = encode(message)?;
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

/// Read the next non-blank line as a worker message (driver side).
pub async fn read_message<R: AsyncBufRead + Unpin>(
    reader: &mut R,
) -> Result<WorkerMessage, ProtocolError> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Err(ProtocolError::ConnectionClosed);
        }
        if !line.trim().is_empty() {
            return decode(&line);
        }
    }
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
