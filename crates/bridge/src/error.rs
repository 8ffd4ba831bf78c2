// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use orb_delegate::DelegateError;
use orb_wire::{Failure, OriginalCause, INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};
use thiserror::Error;

/// Failure of a single request, reported in its response.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Not connected. Call connect first.")]
    NotConnected,

    #[error("Model \"{0}\" not found. Define it first.")]
    ModelNotFound(String),

    #[error("Source model \"{0}\" not found. Define it first.")]
    SourceModelNotFound(String),

    #[error("Target model \"{0}\" not found. Define it first.")]
    TargetModelNotFound(String),

    /// Params did not deserialize into the operation's shape.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Params deserialized but are unusable (missing column, empty data...).
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Delegate(#[from] DelegateError),

    #[error("Operation panicked: {0}")]
    Panic(String),
}

impl BridgeError {
    pub fn invalid_params(error: serde_json::Error) -> Self {
        Self::InvalidParams(error.to_string())
    }
}

impl Failure for BridgeError {
    fn name(&self) -> &str {
        match self {
            Self::UnknownMethod(_) => "MethodNotFoundError",
            Self::InvalidParams(_) | Self::Usage(_) => "InvalidParamsError",
            Self::Delegate(e) => e.name(),
            Self::Panic(_) => "PanicError",
            _ => "Error",
        }
    }

    fn code(&self) -> i64 {
        match self {
            Self::UnknownMethod(_) => METHOD_NOT_FOUND,
            Self::InvalidParams(_) | Self::Usage(_) => INVALID_PARAMS,
            _ => INTERNAL_ERROR,
        }
    }

    fn original(&self) -> Option<OriginalCause> {
        match self {
            Self::Delegate(e) => e.original(),
            _ => None,
        }
    }

    fn sql(&self) -> Option<&str> {
        match self {
            Self::Delegate(e) => e.sql(),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
