// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use orb_delegate::MemoryDelegate;
use serde_json::json;

use super::*;
use crate::outbound::Outbound;
use crate::transport::{port, Transport};

async fn echo(_ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    Ok(params)
}

async fn refuse(_ctx: Arc<Context>, _params: Value) -> Result<Value, BridgeError> {
    Err(BridgeError::Usage("refused".into()))
}

fn context() -> Arc<Context> {
    let (transport, _driver) = port::pair();
    let (_source, sink) = transport.split();
    let (outbound, _writer) = Outbound::spawn(sink);
    Arc::new(Context {
        session: Arc::new(Session::new()),
        notifier: outbound.notifier(),
        delegate: Arc::new(MemoryDelegate::new()),
        close_drain: Duration::from_millis(10),
    })
}

#[test]
fn empty_registry_knows_nothing() {
    let registry = Registry::new();
    assert!(registry.get("ready").is_none());
    assert!(registry.methods().is_empty());
}

#[test]
fn builtin_registry_has_ready() {
    assert!(Registry::builtin().contains("ready"));
}

#[tokio::test]
async fn registered_functions_are_operations() {
    let mut registry = Registry::new();
    registry.register("echo", echo).register("refuse", refuse);
    assert_eq!(registry.methods(), vec!["echo", "refuse"]);

    let echoed = registry.get("echo").unwrap().call(context(), json!({"a": 1})).await.unwrap();
    assert_eq!(echoed, json!({"a": 1}));
    let err = registry.get("refuse").unwrap().call(context(), Value::Null).await.unwrap_err();
    assert_eq!(err.to_string(), "refused");
}

#[tokio::test]
async fn register_replaces_existing_operation() {
    let mut registry = Registry::builtin();
    registry.register("ready", |_ctx: Arc<Context>, _params: Value| async {
        Ok::<_, BridgeError>(json!({"ready": "custom"}))
    });
    let result = registry.get("ready").unwrap().call(context(), Value::Null).await.unwrap();
    assert_eq!(result, json!({"ready": "custom"}));
}

#[test]
fn clones_are_independent() {
    let original = Registry::builtin();
    let mut extended = original.clone();
    extended.register("echo", echo);
    assert!(extended.contains("echo"));
    assert!(!original.contains("echo"));
}
