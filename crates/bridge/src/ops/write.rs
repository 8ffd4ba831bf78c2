// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use orb_delegate::Row;
use serde::Deserialize;
use serde_json::{json, Value};

use super::query::{resolve, ModelParams};
use super::{options, parse};
use crate::error::BridgeError;
use crate::registry::Context;

#[derive(Debug, Deserialize)]
struct CreateParams {
    model: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    options: Value,
}

#[derive(Debug, Deserialize)]
struct UpdateParams {
    model: String,
    #[serde(default)]
    data: Option<Row>,
    #[serde(default)]
    query: Value,
}

/// An object creates one row and answers with it; an array creates many.
/// Missing data creates a row from column defaults.
pub(super) async fn create(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    let (params, model, _) =
        resolve(&ctx, params, |p: &CreateParams| (p.model.as_str(), &p.options))?;
    let data = match params.data {
        Value::Null => Value::Object(Row::new()),
        data => data,
    };
    match data {
        Value::Object(row) => {
            let created = model.create(vec![row]).await?;
            Ok(created.into_iter().next().map(Value::Object).unwrap_or(Value::Null))
        }
        Value::Array(items) => {
            let rows = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Ok(row),
                    other => Err(BridgeError::Usage(format!(
                        "Each record to create must be an object, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            let created = model.create(rows).await?;
            Ok(Value::Array(created.into_iter().map(Value::Object).collect()))
        }
        _ => Err(BridgeError::Usage("Data is required for create operation".into())),
    }
}

/// Data is checked before the model is looked up.
pub(super) async fn update(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    ctx.session.connection()?;
    let UpdateParams { model, data, query } = parse(params)?;
    let data = data
        .filter(|d| !d.is_empty())
        .ok_or_else(|| BridgeError::Usage("Data is required for update operation".into()))?;
    let model = ctx.session.model(&model)?;
    let query = options::prepare(query, &ctx.session.options())?;
    let affected = model.update(&data, &query).await?;
    Ok(json!(affected))
}

pub(super) async fn destroy(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    let (_, model, query) =
        resolve(&ctx, params, |p: &ModelParams| (p.model.as_str(), &p.options))?;
    let destroyed = model.destroy(&query).await?;
    Ok(json!(destroyed))
}

pub(super) async fn truncate(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    let (_, model, _) = resolve(&ctx, params, |p: &ModelParams| (p.model.as_str(), &p.options))?;
    model.truncate().await?;
    Ok(json!({ "truncated": true }))
}
