// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-delimited JSON over a byte stream (stdio in the binary).

use async_trait::async_trait;
use futures_util::StreamExt;
use orb_wire::{write_message, Frame, LineFramer, WorkerMessage};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, Stdin, Stdout};
use tokio_util::codec::FramedRead;

use super::{EndOfInput, Sink, Source, Transport, TransportError};

/// Byte-stream transport over any tokio reader/writer pair.
pub struct StreamTransport<R, W> {
    reader: R,
    writer: W,
    max_frame_bytes: usize,
}

impl<R, W> StreamTransport<R, W>
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    pub fn new(reader: R, writer: W, max_frame_bytes: usize) -> Self {
        Self { reader, writer, max_frame_bytes }
    }
}

impl StreamTransport<Stdin, Stdout> {
    pub fn stdio(max_frame_bytes: usize) -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout(), max_frame_bytes)
    }
}

impl<R, W> Transport for StreamTransport<R, W>
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    type Source = StreamSource<R>;
    type Sink = StreamSink<W>;

    fn split(self) -> (Self::Source, Self::Sink) {
        let framer = LineFramer::new(self.max_frame_bytes);
        (
            StreamSource { frames: FramedRead::new(self.reader, framer) },
            StreamSink { writer: self.writer },
        )
    }
}

pub struct StreamSource<R> {
    frames: FramedRead<R, LineFramer>,
}

#[async_trait]
impl<R> Source for StreamSource<R>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        self.frames.next().await.map(|frame| frame.map_err(TransportError::from))
    }

    fn end_of_input(&self) -> EndOfInput {
        EndOfInput::StreamEnded
    }
}

pub struct StreamSink<W> {
    writer: W,
}

#[async_trait]
impl<W> Sink for StreamSink<W>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    async fn send(&mut self, message: &WorkerMessage) -> Result<(), TransportError> {
        write_message(&mut self.writer, message).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
