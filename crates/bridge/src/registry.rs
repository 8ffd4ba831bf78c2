// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Method name to operation table.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use orb_delegate::Delegate;
use serde_json::Value;

use crate::error::BridgeError;
use crate::outbound::Notifier;
use crate::session::Session;

/// Everything an operation may touch, passed explicitly to each call.
pub struct Context {
    pub session: Arc<Session>,
    pub notifier: Notifier,
    pub delegate: Arc<dyn Delegate>,
    /// How long `close` waits for other requests to finish.
    pub close_drain: Duration,
}

pub type OpFuture = BoxFuture<'static, Result<Value, BridgeError>>;

/// One method's handler.
///
/// Any `async fn(Arc<Context>, Value) -> Result<Value, BridgeError>` is an
/// operation.
pub trait Operation: Send + Sync {
    fn call(&self, ctx: Arc<Context>, params: Value) -> OpFuture;
}

impl<F, Fut> Operation for F
where
    F: Fn(Arc<Context>, Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, BridgeError>> + Send + 'static,
{
    fn call(&self, ctx: Arc<Context>, params: Value) -> OpFuture {
        Box::pin(self(ctx, params))
    }
}

#[derive(Clone, Default)]
pub struct Registry {
    operations: HashMap<String, Arc<dyn Operation>>,
}

impl Registry {
    /// Empty table; see [`Registry::builtin`] for the standard catalog.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        crate::ops::register_builtins(&mut registry);
        registry
    }

    /// Add an operation, replacing any previous one under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        operation: impl Operation + 'static,
    ) -> &mut Self {
        self.operations.insert(name.into(), Arc::new(operation));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Operation>> {
        self.operations.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
