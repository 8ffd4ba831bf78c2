// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request dispatcher.
//!
//! Every request runs as its own task, so a slow operation never holds up
//! the ones behind it. Responses go out in completion order, each carrying
//! its request's id. On shutdown the pending tasks are cancelled and never
//! answer.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use orb_wire::{decode_request, CorrelationId, ErrorDetail, Frame, ResponseEnvelope};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::error::BridgeError;
use crate::outbound::Outbound;
use crate::registry::{Context, Registry};

pub struct Dispatcher {
    registry: Registry,
    ctx: Arc<Context>,
    outbound: Outbound,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(registry: Registry, ctx: Arc<Context>, outbound: Outbound) -> Self {
        Self {
            registry,
            ctx,
            outbound,
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Requests dispatched and not yet answered.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Route one inbound frame. Never blocks on the operation itself.
    pub fn dispatch(&self, frame: Frame) {
        let value = match frame {
            Frame::Message(value) => value,
            Frame::Invalid(error) => {
                debug!(message = %error.message, "unparseable frame");
                self.outbound.respond(ResponseEnvelope::failure(CorrelationId::Null, error));
                return;
            }
        };
        let request = match decode_request(value) {
            Ok(request) => request,
            Err(rejection) => {
                debug!(id = %rejection.id, message = %rejection.error.message, "rejected request");
                self.outbound.respond(rejection.into_response());
                return;
            }
        };

        let Some(operation) = self.registry.get(&request.method) else {
            let error = BridgeError::UnknownMethod(request.method);
            self.outbound.respond(ResponseEnvelope::failure(
                request.id,
                ErrorDetail::from_failure(&error),
            ));
            return;
        };

        debug!(id = %request.id, method = %request.method, "dispatching");
        let guard = self.ctx.session.in_flight().enter();
        let ctx = Arc::clone(&self.ctx);
        let outbound = self.outbound.clone();
        let cancel = self.cancel.clone();
        let params = request.params.unwrap_or_default();
        let (id, method) = (request.id, request.method);

        self.tracker.spawn(async move {
            let _guard = guard;
            let call = AssertUnwindSafe(operation.call(ctx, params)).catch_unwind();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(%id, %method, "cancelled before completion");
                    return;
                }
                result = call => result,
            };
            let response = match result {
                Ok(Ok(value)) => ResponseEnvelope::success(id, value),
                Ok(Err(error)) => {
                    debug!(%id, %method, error = %error, "operation failed");
                    ResponseEnvelope::failure(id, ErrorDetail::from_failure(&error))
                }
                Err(payload) => {
                    let error = BridgeError::Panic(panic_message(payload.as_ref()));
                    warn!(%id, %method, error = %error, "operation panicked");
                    ResponseEnvelope::failure(id, ErrorDetail::from_failure(&error))
                }
            };
            outbound.respond(response);
        });
    }

    /// Cancel every pending request and wait for their tasks to wind down.
    pub async fn shutdown(&self) {
        let pending = self.tracker.len();
        if pending > 0 {
            debug!(pending, "cancelling in-flight requests");
        }
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
