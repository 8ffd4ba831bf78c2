// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Opaque token linking a response to the request that caused it.
///
/// Uniqueness across in-flight requests is the driver's responsibility; the
/// bridge only echoes it back. A missing `id` decodes as [`CorrelationId::Null`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrelationId {
    Number(Number),
    Text(String),
    #[default]
    Null,
}

impl CorrelationId {
    /// Id reserved for the unsolicited readiness envelope.
    pub fn ready() -> Self {
        Self::Number(Number::from(0u64))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<u64> for CorrelationId {
    fn from(value: u64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<i64> for CorrelationId {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Null => f.write_str("null"),
        }
    }
}
