// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the bridge.

use std::path::PathBuf;
use std::time::Duration;

use orb_wire::DEFAULT_MAX_FRAME_BYTES;

/// Log filter directives: ORB_LOG > RUST_LOG > "info"
pub fn log_filter() -> String {
    std::env::var("ORB_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "info".to_string())
}

/// Optional log file, in addition to stderr.
pub fn log_file() -> Option<PathBuf> {
    std::env::var("ORB_LOG_FILE").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// How long `close` waits for other in-flight requests (default 2s).
pub fn close_drain() -> Duration {
    std::env::var("ORB_CLOSE_DRAIN_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(2))
}

/// Longest accepted input line in bytes (default 16 MiB).
pub fn max_frame_bytes() -> usize {
    std::env::var("ORB_MAX_FRAME_BYTES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MAX_FRAME_BYTES)
}
