// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reads, aggregates, and the arithmetic updates.

use std::sync::Arc;

use orb_delegate::{numeric, Aggregate, ModelHandle, QueryOptions};
use serde::Deserialize;
use serde_json::{Number, Value};

use super::{options, parse};
use crate::error::BridgeError;
use crate::registry::Context;

#[derive(Debug, Deserialize)]
pub(super) struct ModelParams {
    pub model: String,
    #[serde(default)]
    pub options: Value,
}

#[derive(Debug, Deserialize)]
struct AggregateParams {
    model: String,
    #[serde(default)]
    column: Option<String>,
    #[serde(default)]
    options: Value,
}

#[derive(Debug, Deserialize)]
struct IncrementParams {
    model: String,
    fields: Fields,
    #[serde(default)]
    query: Value,
}

/// `"col"`, `["a", "b"]`, or `{"a": 2, "b": -1}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Fields {
    One(String),
    Many(Vec<String>),
    Deltas(serde_json::Map<String, Value>),
}

/// Parse params once the connection is known to exist, then resolve the model
/// and its prepared query options.
pub(super) fn resolve<T>(
    ctx: &Context,
    params: Value,
    split: impl FnOnce(&T) -> (&str, &Value),
) -> Result<(T, Arc<dyn ModelHandle>, QueryOptions), BridgeError>
where
    T: serde::de::DeserializeOwned,
{
    ctx.session.connection()?;
    let params: T = parse(params)?;
    let (name, raw) = split(&params);
    let model = ctx.session.model(name)?;
    let query = options::prepare(raw.clone(), &ctx.session.options())?;
    Ok((params, model, query))
}

pub(super) async fn find_all(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    let (_, model, query) =
        resolve(&ctx, params, |p: &ModelParams| (p.model.as_str(), &p.options))?;
    let rows = model.find_all(&query).await?;
    Ok(Value::Array(rows.into_iter().map(Value::Object).collect()))
}

pub(super) async fn find_one(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    let (_, model, query) =
        resolve(&ctx, params, |p: &ModelParams| (p.model.as_str(), &p.options))?;
    Ok(model.find_one(&query).await?.map(Value::Object).unwrap_or(Value::Null))
}

pub(super) async fn count(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    aggregate(&ctx, params, Aggregate::Count).await
}

pub(super) async fn max(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    aggregate(&ctx, params, Aggregate::Max).await
}

pub(super) async fn min(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    aggregate(&ctx, params, Aggregate::Min).await
}

pub(super) async fn sum(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    aggregate(&ctx, params, Aggregate::Sum).await
}

async fn aggregate(
    ctx: &Context,
    params: Value,
    function: Aggregate,
) -> Result<Value, BridgeError> {
    let (params, model, query) =
        resolve(ctx, params, |p: &AggregateParams| (p.model.as_str(), &p.options))?;
    let column = params.column.as_deref().filter(|c| !c.is_empty());
    if column.is_none() && function != Aggregate::Count {
        return Err(BridgeError::Usage(format!(
            "Column name is required for {} operation",
            function.as_str()
        )));
    }
    Ok(model.aggregate(function, column, &query).await?)
}

pub(super) async fn increment(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    step(&ctx, params, false).await
}

pub(super) async fn decrement(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    step(&ctx, params, true).await
}

async fn step(ctx: &Context, params: Value, negate: bool) -> Result<Value, BridgeError> {
    let (params, model, query) =
        resolve(ctx, params, |p: &IncrementParams| (p.model.as_str(), &p.query))?;
    let by = query.by.clone().unwrap_or_else(|| Number::from(1));
    let mut deltas = deltas(params.fields, &by)?;
    if negate {
        for (column, delta) in &mut deltas {
            let negated = numeric::negate(delta);
            match negated {
                Some(n) => *delta = n,
                None => {
                    return Err(BridgeError::Usage(format!("Cannot decrement {column} by {delta}")))
                }
            }
        }
    }
    let rows = model.increment(&deltas, &query).await?;
    Ok(Value::Array(rows.into_iter().map(Value::Object).collect()))
}

fn deltas(fields: Fields, by: &Number) -> Result<Vec<(String, Number)>, BridgeError> {
    let deltas: Vec<(String, Number)> = match fields {
        Fields::One(column) => vec![(column, by.clone())],
        Fields::Many(columns) => columns.into_iter().map(|c| (c, by.clone())).collect(),
        Fields::Deltas(map) => map
            .into_iter()
            .map(|(column, delta)| match delta {
                Value::Number(n) => Ok((column, n)),
                other => Err(BridgeError::Usage(format!(
                    "Increment amount for {column} must be a number, got {other}"
                ))),
            })
            .collect::<Result<_, _>>()?,
    };
    if deltas.is_empty() {
        return Err(BridgeError::Usage("Fields are required for increment operation".into()));
    }
    Ok(deltas)
}
