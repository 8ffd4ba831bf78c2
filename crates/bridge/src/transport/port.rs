// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process message port: structured values, no textual framing.
//!
//! [`pair`] returns the bridge's end and the driver's end. Dropping or
//! closing the [`DriverPort`] is the port's close event.

use async_trait::async_trait;
use orb_wire::{Frame, RequestEnvelope, WorkerMessage};
use serde_json::Value;
use tokio::sync::mpsc;

use super::{EndOfInput, Sink, Source, Transport, TransportError};

/// Create a connected port pair.
pub fn pair() -> (PortTransport, DriverPort) {
    let (to_bridge, from_driver) = mpsc::unbounded_channel();
    let (to_driver, from_bridge) = mpsc::unbounded_channel();
    (
        PortTransport { inbound: from_driver, outbound: to_driver },
        DriverPort { outbound: to_bridge, inbound: from_bridge },
    )
}

/// The bridge's end of a message port.
pub struct PortTransport {
    inbound: mpsc::UnboundedReceiver<Value>,
    outbound: mpsc::UnboundedSender<Value>,
}

impl Transport for PortTransport {
    type Source = PortSource;
    type Sink = PortSink;

    fn split(self) -> (Self::Source, Self::Sink) {
        (PortSource { inbound: self.inbound }, PortSink { outbound: self.outbound })
    }
}

pub struct PortSource {
    inbound: mpsc::UnboundedReceiver<Value>,
}

#[async_trait]
impl Source for PortSource {
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        self.inbound.recv().await.map(|value| Ok(Frame::Message(value)))
    }

    fn end_of_input(&self) -> EndOfInput {
        EndOfInput::PortClosed
    }
}

pub struct PortSink {
    outbound: mpsc::UnboundedSender<Value>,
}

#[async_trait]
impl Sink for PortSink {
    async fn send(&mut self, message: &WorkerMessage) -> Result<(), TransportError> {
        let value = serde_json::to_value(message)?;
        self.outbound.send(value).map_err(|_| TransportError::Closed)
    }
}

/// The driving side of a message port.
pub struct DriverPort {
    outbound: mpsc::UnboundedSender<Value>,
    inbound: mpsc::UnboundedReceiver<Value>,
}

impl DriverPort {
    /// Post a raw value; `false` once the bridge side is gone.
    pub fn post(&self, value: Value) -> bool {
        self.outbound.send(value).is_ok()
    }

    pub fn request(&self, request: &RequestEnvelope) -> bool {
        match serde_json::to_value(request) {
            Ok(value) => self.post(value),
            Err(_) => false,
        }
    }

    /// Next message from the bridge, `None` once the bridge has terminated.
    ///
    /// Values that are not worker messages are skipped.
    pub async fn recv(&mut self) -> Option<WorkerMessage> {
        loop {
            let value = self.inbound.recv().await?;
            match serde_json::from_value(value) {
                Ok(message) => return Some(message),
                Err(e) => tracing::warn!(error = %e, "driver port dropped malformed message"),
            }
        }
    }

    /// Close the port. The bridge treats this as end of input.
    pub fn close(self) {
        drop(self);
    }
}
