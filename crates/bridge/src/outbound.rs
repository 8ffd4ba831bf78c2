// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single writer for everything the bridge emits.
//!
//! Responses and notifications go through one unbounded queue drained by one
//! task that owns the [`Sink`]. Enqueue order is wire order, so a
//! notification sent before a response from the same operation is written
//! before it.

use orb_delegate::QueryLog;
use orb_wire::{
    CorrelationId, ErrorDetail, Notification, ProtocolError, ResponseEnvelope, WorkerMessage,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::transport::{Sink, TransportError};

enum Command {
    Send(WorkerMessage),
    /// Write everything queued before this, close the sink, then stop.
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable handle to the writer task. Sending never fails for the caller.
#[derive(Clone)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<Command>,
}

impl Outbound {
    /// Spawn the writer task that owns `sink`.
    pub fn spawn<S: Sink + 'static>(sink: S) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(write_loop(sink, rx));
        (Self { tx }, handle)
    }

    pub fn send(&self, message: impl Into<WorkerMessage>) {
        if self.tx.send(Command::Send(message.into())).is_err() {
            debug!("outbound closed, dropping message");
        }
    }

    pub fn respond(&self, response: ResponseEnvelope) {
        self.send(response);
    }

    pub fn notifier(&self) -> Notifier {
        Notifier { outbound: self.clone() }
    }

    /// Flush queued messages and close the sink. Later sends are dropped.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Shutdown(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn write_loop<S: Sink>(mut sink: S, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Send(message) => {
                if let Err(e) = write(&mut sink, message).await {
                    warn!(error = %e, "outbound channel failed, stopping writer");
                    break;
                }
            }
            Command::Shutdown(ack) => {
                if let Err(e) = sink.close().await {
                    debug!(error = %e, "error closing outbound channel");
                }
                let _ = ack.send(());
                return;
            }
        }
    }
    // Writer stopped early: release anyone waiting on a shutdown ack.
    rx.close();
    while let Some(command) = rx.recv().await {
        if let Command::Shutdown(ack) = command {
            let _ = ack.send(());
        }
    }
}

/// Write one message. A message that cannot be serialized is replaced by an
/// internal error carrying the same id; a notification is dropped instead.
async fn write<S: Sink>(sink: &mut S, message: WorkerMessage) -> Result<(), TransportError> {
    match sink.send(&message).await {
        Err(TransportError::Serialize(e))
        | Err(TransportError::Protocol(ProtocolError::Json(e))) => {
            match message.id() {
                Some(id) => {
                    warn!(%id, error = %e, "response not serializable, sending error instead");
                    let fallback = ResponseEnvelope::failure(
                        id.clone(),
                        ErrorDetail::internal(format!("Failed to serialize response: {e}")),
                    );
                    sink.send(&fallback.into()).await
                }
                None => {
                    warn!(error = %e, "notification not serializable, dropped");
                    Ok(())
                }
            }
        }
        other => other,
    }
}

/// Fire-and-forget channel for unsolicited messages.
#[derive(Clone)]
pub struct Notifier {
    outbound: Outbound,
}

impl Notifier {
    pub fn notify(&self, notification: Notification) {
        self.outbound.send(notification);
    }

    pub fn log(&self, level: &str, message: impl Into<String>) {
        self.notify(Notification::log(level, message));
    }

    /// Report a failure no request correlates to.
    pub fn uncaught(&self, error: &dyn std::error::Error) {
        let detail = ErrorDetail::internal(format!("Uncaught exception: {error}"))
            .with_name("UncaughtException");
        self.outbound.respond(ResponseEnvelope::failure(CorrelationId::Null, detail));
    }
}

impl QueryLog for Notifier {
    fn statement(&self, sql: &str) {
        self.notify(Notification::sql_log(sql));
    }
}

#[cfg(test)]
#[path = "outbound_tests.rs"]
mod tests;
