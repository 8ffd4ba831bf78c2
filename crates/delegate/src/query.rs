// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query options shared by the read and write operations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options accompanying a model operation.
///
/// `where` is kept as the raw operator tree (`{"age": {"$gt": 18}}`); the
/// delegate evaluates it. `include` is accepted but association resolution is
/// the delegate's concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,
    /// Step for `increment`/`decrement` when `fields` names columns only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<serde_json::Number>,
}

impl QueryOptions {
    /// Parse raw options, treating null members as unset.
    pub fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        match raw {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => serde_json::from_value(Value::Object(strip_nulls(map))),
            other => serde_json::from_value(other),
        }
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// `order` normalized into terms.
    ///
    /// Accepts `"col"`, `["col", "DESC"]`, `[["col", "DESC"], "other"]` and
    /// association paths `["posts", "createdAt", "DESC"]`.
    pub fn order_terms(&self) -> Vec<OrderTerm> {
        let Some(order) = &self.order else {
            return Vec::new();
        };
        match order {
            Value::String(column) => vec![OrderTerm::ascending(column)],
            Value::Array(items) if is_single_term(items) => {
                OrderTerm::parse(order).into_iter().collect()
            }
            Value::Array(items) => items.iter().filter_map(OrderTerm::parse).collect(),
            _ => Vec::new(),
        }
    }

    pub fn distinct(&self) -> bool {
        self.distinct.unwrap_or(false)
    }
}

/// `["col", "ASC"]` as opposed to a list of terms.
fn is_single_term(items: &[Value]) -> bool {
    items.iter().all(Value::is_string)
        && items.last().and_then(Value::as_str).map(is_direction).unwrap_or(items.len() == 1)
}

fn is_direction(s: &str) -> bool {
    let upper = s.to_ascii_uppercase();
    upper == "ASC" || upper == "DESC"
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    /// Association path leading to the column; empty for the model itself.
    pub path: Vec<String>,
    pub column: String,
    pub descending: bool,
}

impl OrderTerm {
    pub fn ascending(column: &str) -> Self {
        Self { path: Vec::new(), column: column.to_string(), descending: false }
    }

    fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(column) => Some(Self::ascending(column)),
            Value::Array(parts) => {
                let mut parts: Vec<&str> = parts.iter().filter_map(Value::as_str).collect();
                let descending = match parts.last() {
                    Some(last) if is_direction(last) => {
                        let descending = last.eq_ignore_ascii_case("DESC");
                        parts.pop();
                        descending
                    }
                    _ => false,
                };
                let column = parts.pop()?.to_string();
                Some(Self {
                    path: parts.into_iter().map(str::to_string).collect(),
                    column,
                    descending,
                })
            }
            _ => None,
        }
    }
}

/// Drop null members so they read as "not set".
pub fn strip_nulls(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
