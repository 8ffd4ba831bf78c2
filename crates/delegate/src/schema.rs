// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Model definitions as declared by `defineModel`.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Column storage class, parsed from the attribute's `type` string.
///
/// Only the base name matters: `STRING(255)`, `string` and `VARCHAR` all
/// resolve to [`DataType::String`]. Unknown names are kept as [`DataType::Other`]
/// and accept any value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Float,
    String,
    Boolean,
    Date,
    Json,
    Other(String),
}

impl DataType {
    pub fn parse(raw: &str) -> Self {
        let base = raw.split('(').next().unwrap_or(raw).trim().to_ascii_uppercase();
        match base.as_str() {
            "INTEGER" | "INT" | "BIGINT" | "SMALLINT" | "TINYINT" | "MEDIUMINT" => Self::Integer,
            "FLOAT" | "DOUBLE" | "REAL" | "DECIMAL" | "NUMBER" => Self::Float,
            "STRING" | "TEXT" | "CHAR" | "VARCHAR" | "CITEXT" | "UUID" | "ENUM" => Self::String,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "DATE" | "DATEONLY" | "TIME" => Self::Date,
            "JSON" | "JSONB" => Self::Json,
            _ => Self::Other(base),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("INTEGER"),
            Self::Float => f.write_str("FLOAT"),
            Self::String => f.write_str("STRING"),
            Self::Boolean => f.write_str("BOOLEAN"),
            Self::Date => f.write_str("DATE"),
            Self::Json => f.write_str("JSON"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// One attribute of a model.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSpec {
    #[serde(rename = "type", default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub allow_null: Option<bool>,
    /// `true` or a named unique index.
    #[serde(default)]
    pub unique: Option<Value>,
    #[serde(default)]
    pub default_value: Option<Value>,
}

impl AttributeSpec {
    pub fn data_type(&self) -> DataType {
        self.data_type.as_deref().map(DataType::parse).unwrap_or(DataType::Other(String::new()))
    }

    /// Primary keys never allow null; other columns allow it unless told otherwise.
    pub fn allows_null(&self) -> bool {
        !self.primary_key && self.allow_null.unwrap_or(true)
    }

    pub fn is_unique(&self) -> bool {
        matches!(self.unique, Some(Value::Bool(true)) | Some(Value::String(_)))
    }
}

/// Model-level options. Unrecognized keys are kept but ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOptions {
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `defineModel` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelDefinition {
    pub name: String,
    pub attributes: IndexMap<String, AttributeSpec>,
    #[serde(default)]
    pub options: Option<ModelOptions>,
}

impl ModelDefinition {
    pub fn table_name(&self) -> &str {
        self.options.as_ref().and_then(|o| o.table_name.as_deref()).unwrap_or(&self.name)
    }

    /// Declared primary keys, in declaration order.
    pub fn declared_primary_keys(&self) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|(_, spec)| spec.primary_key)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Kind of relation between two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    HasOne,
    HasMany,
    BelongsTo,
}

impl FromStr for AssociationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hasOne" => Ok(Self::HasOne),
            "hasMany" => Ok(Self::HasMany),
            "belongsTo" => Ok(Self::BelongsTo),
            other => Err(format!("Unknown association type: {other}")),
        }
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HasOne => "hasOne",
            Self::HasMany => "hasMany",
            Self::BelongsTo => "belongsTo",
        })
    }
}

/// Scalar aggregate over the rows matching a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    Max,
    Min,
    Sum,
}

impl Aggregate {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Max => "max",
            Self::Min => "min",
            Self::Sum => "sum",
        }
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
