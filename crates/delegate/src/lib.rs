// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-store delegate: the library the bridge forwards model operations to.
//!
//! [`Delegate`], [`Connection`] and [`ModelHandle`] are the seam; the bridge
//! only ever talks to trait objects. [`MemoryDelegate`] is the bundled
//! implementation.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod delegate;
mod error;
mod memory;
pub mod numeric;
mod query;
mod schema;

pub use config::{ConnectConfig, PoolConfig, SyncOptions};
pub use delegate::{Connection, Delegate, ModelHandle, QueryLog, Row};
pub use error::{DelegateError, DelegateErrorKind, DriverError};
pub use memory::{MemoryConnection, MemoryDelegate, MemoryModel, DIALECT as MEMORY_DIALECT};
pub use query::{strip_nulls, OrderTerm, QueryOptions};
pub use schema::{
    Aggregate, AssociationKind, AttributeSpec, DataType, ModelDefinition, ModelOptions,
};

#[cfg(any(test, feature = "test-support"))]
pub use delegate::RecordingQueryLog;
