// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection configuration as sent by the driver's `connect` request.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

/// `params.config` of a `connect` request.
///
/// Keys the bridge understands are lifted out; everything else stays in
/// `settings` for the delegate to interpret (database, host, url, storage...).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectConfig {
    #[serde(default)]
    pub dialect: Option<String>,
    /// Push every statement to the driver as a `sql_log` notification.
    #[serde(default)]
    pub logging: Option<bool>,
    #[serde(default)]
    pub pool: Option<PoolConfig>,
    /// Lift `order`/`group` nested in `include` items to the top-level query.
    #[serde(default)]
    pub hoist_include_options: Option<bool>,
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl ConnectConfig {
    /// Lower-cased dialect name, if one was given.
    pub fn dialect(&self) -> Option<String> {
        self.dialect.as_deref().map(str::to_ascii_lowercase)
    }

    pub fn logging(&self) -> bool {
        self.logging.unwrap_or(false)
    }

    pub fn hoist_include_options(&self) -> bool {
        self.hoist_include_options.unwrap_or(false)
    }

    /// String setting, e.g. `database`.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(Value::as_str)
    }
}

/// Pool limits. Absent fields keep the delegate's defaults.
///
/// The memory delegate enforces `max` and `acquire`; `min`, `idle` and
/// `evict` are accepted and logged but have nothing to act on there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub max: Option<u32>,
    #[serde(default)]
    pub min: Option<u32>,
    /// Idle time in milliseconds before a pooled connection is released.
    #[serde(default)]
    pub idle: Option<u64>,
    /// Milliseconds to wait for a free connection.
    #[serde(default)]
    pub acquire: Option<u64>,
    /// Milliseconds between idle-connection sweeps.
    #[serde(default)]
    pub evict: Option<u64>,
}

impl PoolConfig {
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire.map(Duration::from_millis)
    }
}

/// Options of the `sync` operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SyncOptions {
    /// Drop existing data before syncing.
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub alter: bool,
}
