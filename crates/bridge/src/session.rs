// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-bridge session state: the active connection and its models.
//!
//! Handlers fetch what they need once at their start and keep those handles
//! for their whole run, so a concurrent `close` never pulls a connection out
//! from under a statement already in progress.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use orb_delegate::{Connection, ModelHandle};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::BridgeError;

/// Options taken from the `connect` config that shape how the bridge
/// prepares requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeOptions {
    pub dialect: Option<String>,
    pub hoist_include_options: bool,
    pub logging: bool,
}

#[derive(Default)]
struct State {
    connection: Option<Arc<dyn Connection>>,
    models: HashMap<String, Arc<dyn ModelHandle>>,
    options: BridgeOptions,
}

#[derive(Default)]
pub struct Session {
    state: Mutex<State>,
    in_flight: InFlight,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connection.is_some()
    }

    pub fn connection(&self) -> Result<Arc<dyn Connection>, BridgeError> {
        self.state.lock().connection.clone().ok_or(BridgeError::NotConnected)
    }

    /// Model by name, checking the connection first.
    pub fn model(&self, name: &str) -> Result<Arc<dyn ModelHandle>, BridgeError> {
        let state = self.state.lock();
        if state.connection.is_none() {
            return Err(BridgeError::NotConnected);
        }
        state.models.get(name).cloned().ok_or_else(|| BridgeError::ModelNotFound(name.to_string()))
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn ModelHandle>> {
        self.state.lock().models.get(name).cloned()
    }

    pub fn options(&self) -> BridgeOptions {
        self.state.lock().options.clone()
    }

    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().models.keys().cloned().collect();
        names.sort();
        names
    }

    /// Make `connection` current, clearing models. Returns the connection it
    /// replaced so the caller can close it.
    pub fn install(
        &self,
        connection: Arc<dyn Connection>,
        options: BridgeOptions,
    ) -> Option<Arc<dyn Connection>> {
        let mut state = self.state.lock();
        state.models.clear();
        state.options = options;
        state.connection.replace(connection)
    }

    pub fn insert_model(&self, name: String, model: Arc<dyn ModelHandle>) {
        self.state.lock().models.insert(name, model);
    }

    /// Clear everything, handing back the connection if there was one.
    pub fn take(&self) -> Option<Arc<dyn Connection>> {
        let mut state = self.state.lock();
        state.models.clear();
        state.options = BridgeOptions::default();
        state.connection.take()
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }
}

/// Counts dispatched requests that have not finished, and how many of them
/// are `close` requests waiting for the rest.
pub struct InFlight {
    load: Arc<watch::Sender<Load>>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Load {
    active: usize,
    closing: usize,
}

impl Default for InFlight {
    fn default() -> Self {
        let (load, _) = watch::channel(Load::default());
        Self { load: Arc::new(load) }
    }
}

impl InFlight {
    pub fn enter(&self) -> InFlightGuard {
        self.load.send_modify(|l| l.active += 1);
        InFlightGuard { load: Arc::clone(&self.load) }
    }

    /// Mark the caller, already counted by [`enter`](Self::enter), as a close
    /// that [`drain`](Self::drain) should not wait for.
    pub fn closing(&self) -> ClosingGuard {
        self.load.send_modify(|l| l.closing += 1);
        ClosingGuard { load: Arc::clone(&self.load) }
    }

    pub fn current(&self) -> usize {
        self.load.borrow().active
    }

    /// Requests in flight that are not closes.
    pub fn others(&self) -> usize {
        let load = *self.load.borrow();
        load.active.saturating_sub(load.closing)
    }

    /// Wait until only closes remain, up to `timeout`.
    /// Returns whether the count got there in time.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let mut rx = self.load.subscribe();
        let settled = rx.wait_for(|l| l.active <= l.closing);
        let settled = matches!(tokio::time::timeout(timeout, settled).await, Ok(Ok(_)));
        settled
    }
}

pub struct InFlightGuard {
    load: Arc<watch::Sender<Load>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.load.send_modify(|l| l.active = l.active.saturating_sub(1));
    }
}

pub struct ClosingGuard {
    load: Arc<watch::Sender<Load>>,
}

impl Drop for ClosingGuard {
    fn drop(&mut self) {
        self.load.send_modify(|l| l.closing = l.closing.saturating_sub(1));
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
