// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process delegate backed by tables in memory.
//!
//! Databases are shared by name across connections of the same
//! [`MemoryDelegate`], so a reconnect sees the rows written before it.
//! Each connection bounds concurrent statements with a semaphore sized by
//! `pool.max`, failing with `ConnectionAcquireTimeoutError` after
//! `pool.acquire` milliseconds.

mod filter;
mod table;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Number, Value};
use tokio::sync::{Semaphore, SemaphorePermit};

use self::table::{Association, Schema, Table};
use crate::config::{ConnectConfig, SyncOptions};
use crate::delegate::{Connection, Delegate, ModelHandle, QueryLog, Row};
use crate::error::{DelegateError, DelegateErrorKind};
use crate::query::QueryOptions;
use crate::schema::{Aggregate, AssociationKind, ModelDefinition};

pub const DIALECT: &str = "memory";
const DEFAULT_DATABASE: &str = "main";
const DEFAULT_POOL_MAX: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct Database {
    tables: HashMap<String, Table>,
}

impl Database {
    fn table_mut(&mut self, name: &str) -> Result<&mut Table, DelegateError> {
        self.tables.get_mut(name).ok_or_else(|| missing_table(name))
    }
}

fn missing_table(name: &str) -> DelegateError {
    DelegateError::database(format!("relation \"{name}\" does not exist"))
}

/// Delegate whose connections share named in-memory databases.
#[derive(Default)]
pub struct MemoryDelegate {
    databases: Mutex<HashMap<String, Arc<Mutex<Database>>>>,
}

impl MemoryDelegate {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryDelegate {
    /// Open a connection without boxing it.
    pub fn open(
        &self,
        config: &ConnectConfig,
        log: Option<Arc<dyn QueryLog>>,
    ) -> Result<MemoryConnection, DelegateError> {
        match config.dialect() {
            None => {}
            Some(dialect) if dialect == DIALECT => {}
            Some(other) => {
                return Err(DelegateError::connection(format!(
                    "Dialect \"{other}\" is not supported"
                )))
            }
        }

        let name = config.setting("database").unwrap_or(DEFAULT_DATABASE).to_string();
        let database = self.databases.lock().entry(name.clone()).or_default().clone();
        let pool = config.pool.unwrap_or_default();
        let max = pool.max.unwrap_or(DEFAULT_POOL_MAX).max(1) as usize;

        // Nothing idles or gets evicted in memory; the rest of `pool` is only reported.
        tracing::debug!(
            database = %name,
            pool_max = max,
            pool_min = ?pool.min,
            pool_idle_ms = ?pool.idle,
            pool_evict_ms = ?pool.evict,
            "memory connection opened"
        );
        let session = Session {
            database,
            log,
            permits: Semaphore::new(max),
            acquire_timeout: pool.acquire_timeout().unwrap_or(DEFAULT_ACQUIRE_TIMEOUT),
            closed: AtomicBool::new(false),
        };
        session.log(&format!("connect {}", json!({"database": name})));
        Ok(MemoryConnection { session: Arc::new(session) })
    }
}

#[async_trait]
impl Delegate for MemoryDelegate {
    async fn connect(
        &self,
        config: &ConnectConfig,
        log: Option<Arc<dyn QueryLog>>,
    ) -> Result<Arc<dyn Connection>, DelegateError> {
        Ok(Arc::new(self.open(config, log)?))
    }
}

/// State shared by a connection and every model handle it defined.
struct Session {
    database: Arc<Mutex<Database>>,
    log: Option<Arc<dyn QueryLog>>,
    permits: Semaphore,
    acquire_timeout: Duration,
    closed: AtomicBool,
}

impl Session {
    async fn acquire(&self) -> Result<SemaphorePermit<'_>, DelegateError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(closed());
        }
        match tokio::time::timeout(self.acquire_timeout, self.permits.acquire()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(closed()),
            Err(_) => {
                Err(DelegateError::new(DelegateErrorKind::AcquireTimeout, "Operation timeout"))
            }
        }
    }

    fn log(&self, statement: &str) {
        if let Some(log) = &self.log {
            log.statement(statement);
        }
    }
}

fn closed() -> DelegateError {
    DelegateError::connection("Connection is closed")
}

/// `op "table" {options}`: the statement text for logs and error reports.
fn statement(op: &str, table: &str, detail: &impl Serialize) -> String {
    let detail = serde_json::to_string(detail).unwrap_or_default();
    format!("{op} \"{table}\" {detail}")
}

pub struct MemoryConnection {
    session: Arc<Session>,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn define_model(
        &self,
        definition: ModelDefinition,
    ) -> Result<Arc<dyn ModelHandle>, DelegateError> {
        let _permit = self.session.acquire().await?;
        let schema = Schema::from_definition(&definition);
        let (name, table, primary_keys) =
            (schema.model.clone(), schema.table.clone(), schema.primary_keys.clone());

        let mut database = self.session.database.lock();
        match database.tables.get_mut(&table) {
            // Redefinition replaces the shape but keeps the rows.
            Some(existing) => existing.schema = schema,
            None => {
                database.tables.insert(table.clone(), Table::new(schema));
            }
        }
        Ok(Arc::new(MemoryModel { name, table, primary_keys, session: self.session.clone() }))
    }

    async fn sync(&self, options: SyncOptions) -> Result<(), DelegateError> {
        let _permit = self.session.acquire().await?;
        self.session.log(&format!(
            "sync {}",
            json!({"force": options.force, "alter": options.alter})
        ));
        if options.force {
            for table in self.session.database.lock().tables.values_mut() {
                table.clear();
            }
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), DelegateError> {
        if !self.session.closed.swap(true, Ordering::AcqRel) {
            self.session.permits.close();
            tracing::debug!("memory connection closed");
        }
        Ok(())
    }
}

/// A model bound to its defining connection.
pub struct MemoryModel {
    name: String,
    table: String,
    primary_keys: Vec<String>,
    session: Arc<Session>,
}

impl MemoryModel {
    /// Run `f` against this model's table under a pool permit, logging the
    /// statement first and attaching it to any failure.
    async fn run<T>(
        &self,
        op: &str,
        detail: &impl Serialize,
        f: impl FnOnce(&mut Table) -> Result<T, DelegateError>,
    ) -> Result<T, DelegateError> {
        let sql = statement(op, &self.table, detail);
        let _permit = self.session.acquire().await.map_err(|e| e.with_sql(sql.clone()))?;
        self.session.log(&sql);
        let mut database = self.session.database.lock();
        database.table_mut(&self.table).and_then(f).map_err(|e| e.with_sql(sql))
    }
}

#[async_trait]
impl ModelHandle for MemoryModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn primary_keys(&self) -> Vec<String> {
        self.primary_keys.clone()
    }

    async fn associate(
        &self,
        kind: AssociationKind,
        target: &dyn ModelHandle,
        options: &Value,
    ) -> Result<(), DelegateError> {
        let alias = options.get("as").and_then(Value::as_str).map(str::to_string);
        let association = Association { kind, target: target.name().to_string(), alias };
        let _permit = self.session.acquire().await?;
        let mut database = self.session.database.lock();
        let table = database.table_mut(&self.table)?;
        if !table.associations.contains(&association) {
            table.associations.push(association);
        }
        Ok(())
    }

    async fn find_all(&self, query: &QueryOptions) -> Result<Vec<Row>, DelegateError> {
        self.run("findAll", query, |table| table.find(query)).await
    }

    async fn find_one(&self, query: &QueryOptions) -> Result<Option<Row>, DelegateError> {
        let limited = QueryOptions { limit: Some(1), ..query.clone() };
        let rows = self.run("findOne", &limited, |table| table.find(&limited)).await?;
        Ok(rows.into_iter().next())
    }

    async fn create(&self, records: Vec<Row>) -> Result<Vec<Row>, DelegateError> {
        let detail = json!({"values": records});
        self.run("create", &detail, |table| table.insert(records)).await
    }

    async fn aggregate(
        &self,
        function: Aggregate,
        column: Option<&str>,
        query: &QueryOptions,
    ) -> Result<Value, DelegateError> {
        let op = format!("{}({})", function.as_str(), column.unwrap_or("*"));
        self.run(&op, query, |table| table.aggregate(function, column, query)).await
    }

    async fn increment(
        &self,
        deltas: &[(String, Number)],
        query: &QueryOptions,
    ) -> Result<Vec<Row>, DelegateError> {
        let by: Row = deltas.iter().map(|(c, d)| (c.clone(), Value::Number(d.clone()))).collect();
        let detail = json!({"by": by, "options": query});
        self.run("increment", &detail, |table| table.increment(deltas, query)).await
    }

    async fn update(&self, values: &Row, query: &QueryOptions) -> Result<u64, DelegateError> {
        let detail = json!({"values": values, "options": query});
        self.run("update", &detail, |table| table.update(values, query)).await
    }

    async fn destroy(&self, query: &QueryOptions) -> Result<u64, DelegateError> {
        self.run("destroy", query, |table| table.destroy(query)).await
    }

    async fn truncate(&self) -> Result<(), DelegateError> {
        self.run("truncate", &json!({}), |table| {
            table.clear();
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
