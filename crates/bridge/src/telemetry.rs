// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Diagnostic logging setup.
//!
//! stdout carries the protocol, so every layer writes to stderr or a file.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::env;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("log file path has no file name: {0}")]
    InvalidLogPath(PathBuf),

    #[error("failed to create log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; hold it for the life
/// of the process.
pub fn init(log_file: Option<&Path>) -> Result<Option<WorkerGuard>, TelemetryError> {
    let filter = EnvFilter::try_new(env::log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(filter).with(stderr).try_init()?;
        return Ok(None);
    };

    let file_name =
        path.file_name().ok_or_else(|| TelemetryError::InvalidLogPath(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)
        .map_err(|source| TelemetryError::LogDir { path: dir.clone(), source })?;

    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = fmt::layer().with_writer(writer).with_ansi(false);
    tracing_subscriber::registry().with(filter).with(stderr).with(file).try_init()?;
    Ok(Some(guard))
}
