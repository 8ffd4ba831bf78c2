// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridge lifecycle.
//!
//! `Starting -> Ready -> Active -> Closing -> Terminated`. Readiness is the
//! first thing written. Closing is entered once, from whichever trigger fires
//! first: end of input, a signal, or a failed transport. In-flight requests
//! are cancelled rather than drained, then the connection is released and the
//! outbound queue flushed.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use orb_delegate::Delegate;
use orb_wire::{ResponseEnvelope, DEFAULT_MAX_FRAME_BYTES};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::env;
use crate::outbound::Outbound;
use crate::registry::{Context, Operation, Registry};
use crate::session::Session;
use crate::transport::{EndOfInput, Source, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    /// Readiness sent, nothing received yet.
    Ready,
    Active,
    Closing,
    Terminated,
}

/// What ended the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    EndOfInput(EndOfInput),
    Signal(&'static str),
    /// Reading the transport failed; reported to the driver before closing.
    TransportFailed,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfInput(EndOfInput::StreamEnded) => f.write_str("end of input"),
            Self::EndOfInput(EndOfInput::PortClosed) => f.write_str("port closed"),
            Self::Signal(name) => write!(f, "signal {name}"),
            Self::TransportFailed => f.write_str("transport failure"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),

    #[error("outbound writer task failed: {0}")]
    Writer(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// How long `close` waits for other requests, and how long shutdown
    /// waits for the connection to close.
    pub close_drain: Duration,
    /// Longest accepted input line on byte-stream transports.
    pub max_frame_bytes: usize,
    /// Write the readiness envelope on start.
    pub announce_ready: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            close_drain: Duration::from_secs(2),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            announce_ready: true,
        }
    }
}

impl BridgeConfig {
    pub fn from_env() -> Self {
        Self {
            close_drain: env::close_drain(),
            max_frame_bytes: env::max_frame_bytes(),
            ..Self::default()
        }
    }
}

pub struct Bridge {
    delegate: Arc<dyn Delegate>,
    registry: Registry,
    config: BridgeConfig,
    phase: watch::Sender<Phase>,
}

impl Bridge {
    /// Bridge over `delegate` with the built-in operations.
    pub fn new(delegate: Arc<dyn Delegate>) -> Self {
        let (phase, _) = watch::channel(Phase::Starting);
        Self { delegate, registry: Registry::builtin(), config: BridgeConfig::default(), phase }
    }

    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Add or override an operation.
    pub fn register(
        mut self,
        name: impl Into<String>,
        operation: impl Operation + 'static,
    ) -> Self {
        self.registry.register(name, operation);
        self
    }

    /// Watch phase transitions.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    fn enter(&self, phase: Phase) {
        let previous = self.phase.send_replace(phase);
        if previous != phase {
            debug!(from = ?previous, to = ?phase, "phase change");
        }
    }

    /// Run until input ends, `shutdown` resolves, or the transport fails.
    pub async fn serve<T, F>(
        self,
        transport: T,
        shutdown: F,
    ) -> Result<ShutdownReason, LifecycleError>
    where
        T: Transport,
        F: Future<Output = ShutdownReason>,
    {
        let (mut source, sink) = transport.split();
        let (outbound, writer) = Outbound::spawn(sink);
        let session = Arc::new(Session::new());
        let ctx = Arc::new(Context {
            session: Arc::clone(&session),
            notifier: outbound.notifier(),
            delegate: Arc::clone(&self.delegate),
            close_drain: self.config.close_drain,
        });
        let dispatcher = Dispatcher::new(self.registry.clone(), ctx, outbound.clone());

        if self.config.announce_ready {
            outbound.respond(ResponseEnvelope::ready());
        }
        self.enter(Phase::Ready);
        info!("bridge ready");

        tokio::pin!(shutdown);
        let reason = loop {
            tokio::select! {
                biased;
                reason = &mut shutdown => break reason,
                frame = source.recv() => match frame {
                    Some(Ok(frame)) => {
                        if *self.phase.borrow() == Phase::Ready {
                            self.enter(Phase::Active);
                        }
                        dispatcher.dispatch(frame);
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "transport read failed");
                        outbound.notifier().uncaught(&e);
                        break ShutdownReason::TransportFailed;
                    }
                    None => break ShutdownReason::EndOfInput(source.end_of_input()),
                },
            }
        };

        self.enter(Phase::Closing);
        info!(%reason, pending = dispatcher.pending(), "shutting down");
        dispatcher.shutdown().await;

        if let Some(connection) = session.take() {
            match tokio::time::timeout(self.config.close_drain, connection.close()).await {
                Ok(Ok(())) => debug!("connection closed"),
                Ok(Err(e)) => warn!(error = %e, "failed to close connection"),
                Err(_) => warn!("timed out closing connection"),
            }
        }

        outbound.shutdown().await;
        writer.await?;
        self.enter(Phase::Terminated);
        info!("bridge terminated");
        Ok(reason)
    }
}

/// SIGTERM and SIGINT, installed up front so a signal that arrives while the
/// bridge starts is not lost.
#[cfg(unix)]
pub struct Signals {
    term: tokio::signal::unix::Signal,
    int: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    pub fn install() -> Result<Self, LifecycleError> {
        use tokio::signal::unix::{signal, SignalKind};

        let term = signal(SignalKind::terminate()).map_err(LifecycleError::Signal)?;
        let int = signal(SignalKind::interrupt()).map_err(LifecycleError::Signal)?;
        Ok(Self { term, int })
    }

    pub async fn recv(mut self) -> ShutdownReason {
        tokio::select! {
            _ = self.term.recv() => ShutdownReason::Signal("SIGTERM"),
            _ = self.int.recv() => ShutdownReason::Signal("SIGINT"),
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
