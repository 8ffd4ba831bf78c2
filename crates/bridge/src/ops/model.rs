// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use orb_delegate::{AssociationKind, ModelDefinition};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::parse;
use crate::error::BridgeError;
use crate::registry::Context;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssociateParams {
    source_model: String,
    target_model: String,
    association_type: String,
    #[serde(default)]
    options: Value,
}

/// Redefining a name replaces the handle the session hands out.
pub(super) async fn define_model(ctx: Arc<Context>, params: Value) -> Result<Value, BridgeError> {
    let connection = ctx.session.connection()?;
    let definition: ModelDefinition = parse(params)?;
    let name = definition.name.clone();

    let model = connection.define_model(definition).await?;
    let primary_keys = model.primary_keys();
    debug!(model = %name, ?primary_keys, "model defined");
    ctx.session.insert_model(name, model);
    Ok(json!({ "defined": true, "primaryKeys": primary_keys }))
}

pub(super) async fn associate_model(
    ctx: Arc<Context>,
    params: Value,
) -> Result<Value, BridgeError> {
    ctx.session.connection()?;
    let params: AssociateParams = parse(params)?;
    let source = ctx
        .session
        .lookup(&params.source_model)
        .ok_or_else(|| BridgeError::SourceModelNotFound(params.source_model.clone()))?;
    let target = ctx
        .session
        .lookup(&params.target_model)
        .ok_or_else(|| BridgeError::TargetModelNotFound(params.target_model.clone()))?;
    let kind: AssociationKind = params.association_type.parse().map_err(BridgeError::Usage)?;

    source.associate(kind, target.as_ref(), &params.options).await?;
    debug!(source = %params.source_model, target = %params.target_model, %kind, "associated");
    Ok(json!({ "associated": true }))
}
