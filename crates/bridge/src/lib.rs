// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orb bridge: a worker that answers JSON requests from a driving process
//! over stdio or an in-process message port, forwarding each operation to a
//! data-store delegate.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod dispatcher;
pub mod env;
mod error;
mod lifecycle;
mod ops;
mod outbound;
mod registry;
mod session;
pub mod telemetry;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use error::BridgeError;
#[cfg(unix)]
pub use lifecycle::Signals;
pub use lifecycle::{Bridge, BridgeConfig, LifecycleError, Phase, ShutdownReason};
pub use outbound::{Notifier, Outbound};
pub use registry::{Context, OpFuture, Operation, Registry};
pub use session::{BridgeOptions, ClosingGuard, InFlight, InFlightGuard, Session};
