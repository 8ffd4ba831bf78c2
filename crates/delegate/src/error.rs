// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use orb_wire::{Failure, OriginalCause};
use thiserror::Error;

/// Category of a delegate failure; also its wire `name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegateErrorKind {
    /// Could not open, or lost, the connection.
    Connection,
    /// No pooled connection became free within the acquire timeout.
    AcquireTimeout,
    /// Row values violated a model constraint.
    Validation,
    /// A unique or primary-key constraint was violated.
    UniqueConstraint,
    /// The statement itself was invalid (unknown column, bad operator, ...).
    Database,
}

impl DelegateErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Connection => "ConnectionError",
            Self::AcquireTimeout => "ConnectionAcquireTimeoutError",
            Self::Validation => "ValidationError",
            Self::UniqueConstraint => "UniqueConstraintError",
            Self::Database => "DatabaseError",
        }
    }
}

/// Lower-level failure wrapped by a [`DelegateError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DriverError {
    pub message: String,
    pub code: Option<String>,
}

impl DriverError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self { message: message.into(), code: Some(code.into()) }
    }
}

/// Failure surfaced by the delegate.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DelegateError {
    pub kind: DelegateErrorKind,
    pub message: String,
    #[source]
    pub original: Option<DriverError>,
    /// Statement that was being executed.
    pub sql: Option<String>,
}

impl DelegateError {
    pub fn new(kind: DelegateErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), original: None, sql: None }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(DelegateErrorKind::Connection, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(DelegateErrorKind::Validation, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(DelegateErrorKind::Database, message)
    }

    pub fn with_original(mut self, original: DriverError) -> Self {
        self.original = Some(original);
        self
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }
}

impl Failure for DelegateError {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn original(&self) -> Option<OriginalCause> {
        self.original
            .as_ref()
            .map(|o| OriginalCause { message: o.message.clone(), code: o.code.clone() })
    }

    fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }
}
