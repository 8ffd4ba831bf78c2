// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `where` clause evaluation.
//!
//! Comparisons follow SQL null semantics: a null column never equals,
//! differs from, or orders against anything; only `$is`/`$eq` with a null
//! operand match it.

use std::cmp::Ordering;

use serde_json::Value;

use crate::delegate::Row;
use crate::error::DelegateError;

pub(super) static NULL: Value = Value::Null;

/// Does `row` satisfy `clause`? A null clause matches every row.
pub(super) fn matches(row: &Row, clause: &Value) -> Result<bool, DelegateError> {
    match clause {
        Value::Null => Ok(true),
        Value::Object(entries) => {
            for (key, condition) in entries {
                if !entry_matches(row, key, condition)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        other => Err(invalid_clause(other)),
    }
}

fn entry_matches(row: &Row, key: &str, condition: &Value) -> Result<bool, DelegateError> {
    match key {
        "$and" => all_branches(row, condition),
        "$or" => any_branch(row, condition),
        "$not" => Ok(!all_branches(row, condition)?),
        column => column_matches(row.get(column).unwrap_or(&NULL), condition),
    }
}

fn all_branches(row: &Row, condition: &Value) -> Result<bool, DelegateError> {
    match condition {
        Value::Array(branches) => {
            for branch in branches {
                if !matches(row, branch)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Value::Object(_) => matches(row, condition),
        other => Err(invalid_clause(other)),
    }
}

/// `$or` takes a list of clauses, or an object whose entries are alternatives.
fn any_branch(row: &Row, condition: &Value) -> Result<bool, DelegateError> {
    match condition {
        Value::Array(branches) => {
            for branch in branches {
                if matches(row, branch)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Value::Object(entries) => {
            for (key, value) in entries {
                if entry_matches(row, key, value)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        other => Err(invalid_clause(other)),
    }
}

fn column_matches(actual: &Value, condition: &Value) -> Result<bool, DelegateError> {
    match condition {
        Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => {
            for (op, operand) in ops {
                if !apply(op, actual, operand)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Value::Array(candidates) => Ok(candidates.iter().any(|c| equal(actual, c))),
        Value::Null => Ok(actual.is_null()),
        expected => Ok(equal(actual, expected)),
    }
}

fn apply(op: &str, actual: &Value, operand: &Value) -> Result<bool, DelegateError> {
    let holds = match op {
        "$eq" if operand.is_null() => actual.is_null(),
        "$eq" => equal(actual, operand),
        "$ne" if operand.is_null() => !actual.is_null(),
        "$ne" => !actual.is_null() && !equal(actual, operand),
        "$is" => is(actual, operand)?,
        "$isNot" => !is(actual, operand)?,
        "$not" if operand.is_null() || operand.is_boolean() => !is(actual, operand)?,
        "$not" => !actual.is_null() && !equal(actual, operand),
        "$gt" => ordered(actual, operand, |o| o == Ordering::Greater),
        "$gte" => ordered(actual, operand, |o| o != Ordering::Less),
        "$lt" => ordered(actual, operand, |o| o == Ordering::Less),
        "$lte" => ordered(actual, operand, |o| o != Ordering::Greater),
        "$between" => between(actual, operand)?,
        "$notBetween" => !actual.is_null() && !between(actual, operand)?,
        "$in" => list(op, operand)?.iter().any(|c| equal(actual, c)),
        "$notIn" => !actual.is_null() && !list(op, operand)?.iter().any(|c| equal(actual, c)),
        "$like" => text_op(actual, operand, |t, p| like(t, p))?,
        "$notLike" => text_op(actual, operand, |t, p| !like(t, p))?,
        "$iLike" | "$ilike" => {
            text_op(actual, operand, |t, p| like(&t.to_lowercase(), &p.to_lowercase()))?
        }
        "$notILike" | "$notIlike" => {
            text_op(actual, operand, |t, p| !like(&t.to_lowercase(), &p.to_lowercase()))?
        }
        "$startsWith" => text_op(actual, operand, |t, p| t.starts_with(p))?,
        "$endsWith" => text_op(actual, operand, |t, p| t.ends_with(p))?,
        "$substring" => text_op(actual, operand, |t, p| t.contains(p))?,
        other => return Err(DelegateError::database(format!("Unsupported operator: {other}"))),
    };
    Ok(holds)
}

fn is(actual: &Value, operand: &Value) -> Result<bool, DelegateError> {
    match operand {
        Value::Null => Ok(actual.is_null()),
        Value::Bool(expected) => Ok(actual.as_bool() == Some(*expected)),
        other => Err(DelegateError::database(format!(
            "IS operator expects null or a boolean, got {other}"
        ))),
    }
}

fn ordered(actual: &Value, operand: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    compare(actual, operand).map(accept).unwrap_or(false)
}

fn between(actual: &Value, operand: &Value) -> Result<bool, DelegateError> {
    match operand.as_array().map(Vec::as_slice) {
        Some([low, high]) => Ok(ordered(actual, low, |o| o != Ordering::Less)
            && ordered(actual, high, |o| o != Ordering::Greater)),
        _ => Err(DelegateError::database("BETWEEN expects a [low, high] pair")),
    }
}

fn list<'a>(op: &str, operand: &'a Value) -> Result<&'a Vec<Value>, DelegateError> {
    operand
        .as_array()
        .ok_or_else(|| DelegateError::database(format!("{op} expects an array operand")))
}

fn text_op(
    actual: &Value,
    operand: &Value,
    test: impl Fn(&str, &str) -> bool,
) -> Result<bool, DelegateError> {
    let pattern = operand
        .as_str()
        .ok_or_else(|| DelegateError::database("string operators expect a string operand"))?;
    Ok(actual.as_str().map(|text| test(text, pattern)).unwrap_or(false))
}

/// SQL equality: null equals nothing, numbers compare by value.
pub(super) fn equal(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    match compare(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

/// Ordering between two scalars of the same kind.
pub(super) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Some(x.cmp(&y));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Sort order with nulls after every value.
pub(super) fn sort_key_order(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare(a, b).unwrap_or(Ordering::Equal),
    }
}

/// SQL `LIKE`: `%` matches any run of characters, `_` exactly one.
pub(super) fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(c) if *c == '_' || *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((star, mark)) => {
                    p = star + 1;
                    t = mark + 1;
                    backtrack = Some((star, mark + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

fn invalid_clause(value: &Value) -> DelegateError {
    DelegateError::database(format!("Invalid where clause: {value}"))
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
