// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use orb_delegate::{ConnectConfig, QueryLog, SyncOptions};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::parse;
use crate::error::BridgeError;
use crate::registry::Context;
use crate::session::BridgeOptions;

#[derive(Debug, Default, Deserialize)]
struct ConnectParams {
    #[serde(default)]
    config: ConnectConfig,
}

pub(super) async fn ready(_ctx: Arc<Context>, _params: Value) -> Result<Value, BridgeError> {
    Ok(json!({ "ready": true }))
}

pub(super) async fn connect(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    let ConnectParams { config } = parse(params)?;
    let options = BridgeOptions {
        dialect: config.dialect(),
        hoist_include_options: config.hoist_include_options(),
        logging: config.logging(),
    };
    let log: Option<Arc<dyn QueryLog>> =
        if options.logging { Some(Arc::new(ctx.notifier.clone())) } else { None };

    let connection = ctx.delegate.connect(&config, log).await?;
    info!(dialect = options.dialect.as_deref().unwrap_or("default"), "connected");

    if let Some(previous) = ctx.session.install(connection, options) {
        if let Err(e) = previous.close().await {
            warn!(error = %e, "failed to close replaced connection");
            ctx.notifier.log("warn", format!("Failed to close previous connection: {e}"));
        }
    }
    Ok(json!({ "connected": true }))
}

pub(super) async fn sync(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    let connection = ctx.session.connection()?;
    let options: SyncOptions = parse(params)?;
    connection.sync(options).await?;
    Ok(json!({ "synced": true }))
}

/// Waits briefly for other requests, then releases the connection. Succeeds
/// when nothing is connected.
///
/// Concurrent closes do not wait for each other; the first to finish
/// draining closes the connection and the rest find nothing to close.
pub(super) async fn close(ctx: Arc<Context>, _params: Value) -> Result<Value, BridgeError> {
    let in_flight = ctx.session.in_flight();
    let _closing = in_flight.closing();
    if !in_flight.drain(ctx.close_drain).await {
        warn!(remaining = in_flight.others(), "closing with requests still in flight");
    }
    if let Some(connection) = ctx.session.take() {
        connection.close().await?;
        info!("connection closed");
    }
    Ok(json!({ "closed": true }))
}
