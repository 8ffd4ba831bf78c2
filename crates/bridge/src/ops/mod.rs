// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in operations.
//!
//! Each operation checks the session, forwards to the delegate, and shapes
//! the result. None of them hold session locks across an await.

mod connection;
mod model;
mod options;
mod query;
mod write;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::BridgeError;
use crate::registry::Registry;

pub(crate) fn register_builtins(registry: &mut Registry) {
    registry
        .register("ready", connection::ready)
        .register("connect", connection::connect)
        .register("sync", connection::sync)
        .register("close", connection::close)
        .register("defineModel", model::define_model)
        .register("associateModel", model::associate_model)
        .register("findAll", query::find_all)
        .register("findOne", query::find_one)
        .register("count", query::count)
        .register("max", query::max)
        .register("min", query::min)
        .register("sum", query::sum)
        .register("increment", query::increment)
        .register("decrement", query::decrement)
        .register("create", write::create)
        .register("update", write::update)
        .register("destroy", write::destroy)
        .register("truncate", write::truncate);
}

/// Deserialize params; absent params read as an empty object.
fn parse<T: DeserializeOwned>(params: Value) -> Result<T, BridgeError> {
    let params = match params {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(params).map_err(BridgeError::invalid_params)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
