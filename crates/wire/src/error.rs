// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serializable error projection carried by error responses.
//!
//! Native error values cannot cross the wire as-is. [`Failure`] is the seam
//! every error type implements so [`ErrorDetail::from_failure`] can flatten it
//! into a stable shape: `{name, message, code, stack, original?, sql?}`.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Malformed JSON text on the byte stream.
pub const PARSE_ERROR: i64 = -32700;
/// Valid JSON that is not a request envelope.
pub const INVALID_REQUEST: i64 = -32600;
/// No operation registered under the requested method name.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Parameters did not match the operation's expected shape.
pub const INVALID_PARAMS: i64 = -32602;
/// Unclassified failure.
pub const INTERNAL_ERROR: i64 = -32603;

/// Lower-level cause wrapped by a delegate error (e.g. a driver error).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalCause {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Flattened, network-stable error shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_code")]
    pub code: i64,
    #[serde(default)]
    pub stack: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<OriginalCause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

fn default_name() -> String {
    "Error".to_string()
}

fn default_code() -> i64 {
    INTERNAL_ERROR
}

/// An error that knows how to describe itself on the wire.
///
/// Every accessor has a fallback, so implementing the trait with an empty body
/// yields `name: "Error"`, `code: -32603` and a stack rendered from the
/// `source()` chain.
pub trait Failure: StdError {
    fn name(&self) -> &str {
        "Error"
    }

    fn code(&self) -> i64 {
        INTERNAL_ERROR
    }

    fn original(&self) -> Option<OriginalCause> {
        None
    }

    fn sql(&self) -> Option<&str> {
        None
    }

    /// Pre-rendered stack. `None` renders one from the `source()` chain.
    fn stack(&self) -> Option<&str> {
        None
    }
}

impl ErrorDetail {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        let name = default_name();
        Self { stack: format!("{name}: {message}"), name, message, code, original: None, sql: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.stack = format!("{}: {}", self.name, self.message);
        self
    }

    pub fn parse_error(reason: impl fmt::Display) -> Self {
        Self::new(PARSE_ERROR, format!("Parse error: {reason}")).with_name("ParseError")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    /// Project any failure into its wire shape.
    ///
    /// Never panics; every field falls back when the failure leaves it empty.
    /// Projecting an `ErrorDetail` yields an equal value.
    pub fn from_failure<F: Failure + ?Sized>(failure: &F) -> Self {
        let name = match failure.name() {
            "" => default_name(),
            name => name.to_string(),
        };
        let mut message = failure.to_string();
        if message.is_empty() {
            message = format!("{failure:?}");
        }
        let stack = match failure.stack() {
            Some(stack) => stack.to_string(),
            None => render_stack(&name, &message, failure.source()),
        };
        Self {
            name,
            message,
            code: failure.code(),
            stack,
            original: failure.original(),
            sql: failure.sql().map(str::to_string),
        }
    }

    /// Project a plain std error with no wire-specific knowledge.
    pub fn from_std(error: &(dyn StdError + 'static)) -> Self {
        let message = error.to_string();
        let name = default_name();
        Self {
            stack: render_stack(&name, &message, error.source()),
            name,
            message,
            code: INTERNAL_ERROR,
            original: None,
            sql: None,
        }
    }
}

fn render_stack(
    name: &str,
    message: &str,
    mut source: Option<&(dyn StdError + 'static)>,
) -> String {
    let mut stack = format!("{name}: {message}");
    while let Some(cause) = source {
        stack.push_str("\n    caused by: ");
        stack.push_str(&cause.to_string());
        source = cause.source();
    }
    stack
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ErrorDetail {}

impl Failure for ErrorDetail {
    fn name(&self) -> &str {
        &self.name
    }

    fn code(&self) -> i64 {
        self.code
    }

    fn original(&self) -> Option<OriginalCause> {
        self.original.clone()
    }

    fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    fn stack(&self) -> Option<&str> {
        Some(&self.stack)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
