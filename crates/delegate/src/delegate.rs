// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seam between the bridge protocol and the data-store library.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Number, Value};

use crate::config::{ConnectConfig, SyncOptions};
use crate::error::DelegateError;
use crate::query::QueryOptions;
use crate::schema::{Aggregate, AssociationKind, ModelDefinition};

/// A row as plain JSON: column name to value.
pub type Row = Map<String, Value>;

/// Receives every statement a connection issues when logging is enabled.
pub trait QueryLog: Send + Sync {
    fn statement(&self, sql: &str);
}

/// Entry point of a data-store library.
#[async_trait]
pub trait Delegate: Send + Sync + 'static {
    /// Open a connection and verify it is usable.
    async fn connect(
        &self,
        config: &ConnectConfig,
        log: Option<Arc<dyn QueryLog>>,
    ) -> Result<Arc<dyn Connection>, DelegateError>;
}

/// An open connection.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn define_model(
        &self,
        definition: ModelDefinition,
    ) -> Result<Arc<dyn ModelHandle>, DelegateError>;

    async fn sync(&self, options: SyncOptions) -> Result<(), DelegateError>;

    /// Release the connection. Idempotent; handles obtained from it fail afterwards.
    async fn close(&self) -> Result<(), DelegateError>;
}

/// A defined model bound to the connection that defined it.
#[async_trait]
pub trait ModelHandle: Send + Sync {
    fn name(&self) -> &str;

    fn primary_keys(&self) -> Vec<String>;

    async fn associate(
        &self,
        kind: AssociationKind,
        target: &dyn ModelHandle,
        options: &Value,
    ) -> Result<(), DelegateError>;

    async fn find_all(&self, query: &QueryOptions) -> Result<Vec<Row>, DelegateError>;

    async fn find_one(&self, query: &QueryOptions) -> Result<Option<Row>, DelegateError>;

    /// Insert rows and return them as stored (defaults and generated keys filled in).
    async fn create(&self, records: Vec<Row>) -> Result<Vec<Row>, DelegateError>;

    async fn aggregate(
        &self,
        function: Aggregate,
        column: Option<&str>,
        query: &QueryOptions,
    ) -> Result<Value, DelegateError>;

    /// Add each `(column, delta)` to the matching rows; returns the updated rows.
    async fn increment(
        &self,
        deltas: &[(String, Number)],
        query: &QueryOptions,
    ) -> Result<Vec<Row>, DelegateError>;

    /// Returns the number of affected rows.
    async fn update(&self, values: &Row, query: &QueryOptions) -> Result<u64, DelegateError>;

    /// Returns the number of destroyed rows.
    async fn destroy(&self, query: &QueryOptions) -> Result<u64, DelegateError>;

    async fn truncate(&self) -> Result<(), DelegateError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::QueryLog;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Query log that keeps every statement for inspection.
    #[derive(Clone, Default)]
    pub struct RecordingQueryLog {
        statements: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingQueryLog {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn statements(&self) -> Vec<String> {
            self.statements.lock().clone()
        }
    }

    impl QueryLog for RecordingQueryLog {
        fn statement(&self, sql: &str) {
            self.statements.lock().push(sql.to_string());
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::RecordingQueryLog;
