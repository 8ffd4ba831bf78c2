// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Physical channels between the driving process and the bridge.
//!
//! A [`Transport`] splits into a [`Source`] of inbound frames and a [`Sink`]
//! for outbound messages. The dispatcher and lifecycle only see these two
//! halves, so the byte-stream and message-port channels share everything
//! above this module.

pub mod port;
mod stream;

pub use port::{DriverPort, PortTransport};
pub use stream::{StreamSink, StreamSource, StreamTransport};

use async_trait::async_trait;
use orb_wire::{Frame, ProtocolError, WorkerMessage};
use thiserror::Error;

/// Errors from the channel itself.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("channel closed")]
    Closed,
}

/// Why inbound traffic stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfInput {
    /// The byte stream reached EOF.
    StreamEnded,
    /// The driver closed its end of the message port.
    PortClosed,
}

/// Inbound half.
#[async_trait]
pub trait Source: Send {
    /// Next frame, or `None` once the channel has ended.
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>>;

    fn end_of_input(&self) -> EndOfInput;
}

/// Outbound half. Only the outbound writer task holds one.
#[async_trait]
pub trait Sink: Send {
    async fn send(&mut self, message: &WorkerMessage) -> Result<(), TransportError>;

    /// Flush and release the channel.
    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// A channel that can be split into its two halves.
pub trait Transport: Send {
    type Source: Source + 'static;
    type Sink: Sink + 'static;

    fn split(self) -> (Self::Source, Self::Sink);
}
