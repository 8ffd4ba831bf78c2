// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query option preparation.

use orb_delegate::QueryOptions;
use serde_json::{Map, Value};

use crate::error::BridgeError;
use crate::session::BridgeOptions;

/// Raw `options` into typed query options, hoisting include options when the
/// connection asked for it.
pub(super) fn prepare(raw: Value, options: &BridgeOptions) -> Result<QueryOptions, BridgeError> {
    let raw = match raw {
        Value::Object(map) if options.hoist_include_options => {
            Value::Object(hoist_include_options(map))
        }
        other => other,
    };
    QueryOptions::from_value(raw)
        .map_err(|e| BridgeError::InvalidParams(format!("options: {e}")))
}

/// Lift `order` and `group` out of non-`separate` include items into the
/// top-level query, prefixed with the association path that leads to them.
///
/// `{"include": [{"as": "posts", "order": [["createdAt", "DESC"]]}]}` becomes
/// `{"include": [{"as": "posts"}], "order": [["posts", "createdAt", "DESC"]]}`.
fn hoist_include_options(mut options: Map<String, Value>) -> Map<String, Value> {
    let Some(mut include) = options.remove("include") else {
        return options;
    };
    let mut orders = Vec::new();
    let mut groups = Vec::new();
    walk(&mut include, &[], &mut orders, &mut groups);
    options.insert("include".to_string(), include);

    if !orders.is_empty() {
        append(&mut options, "order", orders);
    }
    if !groups.is_empty() {
        append(&mut options, "group", groups);
    }
    options
}

fn walk(include: &mut Value, path: &[Value], orders: &mut Vec<Value>, groups: &mut Vec<Value>) {
    let items: Vec<&mut Value> = match include {
        Value::Array(items) => items.iter_mut().collect(),
        other => vec![other],
    };
    for item in items {
        let Value::Object(entry) = item else {
            continue;
        };
        let association = entry.get("as").or_else(|| entry.get("association")).cloned();
        let Some(association) = association.filter(|a| !a.is_null()) else {
            continue;
        };
        let mut current = path.to_vec();
        current.push(association);

        let separate = entry.get("separate").and_then(Value::as_bool).unwrap_or(false);
        if !separate {
            if let Some(order) = take_set(entry, "order") {
                for term in order_terms(order) {
                    orders.push(prefixed(&current, term));
                }
            }
            if let Some(group) = take_set(entry, "group") {
                let terms = match group {
                    Value::Array(terms) => terms,
                    single => vec![single],
                };
                for term in terms {
                    groups.push(prefixed(&current, term));
                }
            }
        }

        if let Some(nested) = entry.get_mut("include") {
            walk(nested, &current, orders, groups);
        }
    }
}

/// Remove `key` unless it is absent or null; a null stays where it is.
fn take_set(entry: &mut Map<String, Value>, key: &str) -> Option<Value> {
    match entry.get(key) {
        None | Some(Value::Null) => None,
        Some(_) => entry.remove(key),
    }
}

/// `["col", "DESC"]` is one term; `[["a", "ASC"], "b"]` is several.
fn order_terms(order: Value) -> Vec<Value> {
    match order {
        Value::Array(ref terms) if is_single_order(terms) => vec![order],
        Value::Array(terms) => terms,
        single => vec![single],
    }
}

fn is_single_order(terms: &[Value]) -> bool {
    match terms {
        [_, Value::String(dir)] => {
            dir.eq_ignore_ascii_case("ASC") || dir.eq_ignore_ascii_case("DESC")
        }
        _ => false,
    }
}

fn prefixed(path: &[Value], term: Value) -> Value {
    let mut full = path.to_vec();
    match term {
        Value::Array(parts) => full.extend(parts),
        single => full.push(single),
    }
    Value::Array(full)
}

/// Append hoisted terms to an existing top-level list, promoting a scalar.
fn append(options: &mut Map<String, Value>, key: &str, terms: Vec<Value>) {
    let mut existing = match options.remove(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(single) => vec![single],
    };
    existing.extend(terms);
    options.insert(key.to_string(), Value::Array(existing));
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
