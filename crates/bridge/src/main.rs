// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orb-bridge`: serves the bridge protocol over stdin/stdout.
//!
//! Diagnostics go to stderr (and optionally a file); stdout is reserved for
//! protocol messages.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use orb_bridge::transport::StreamTransport;
use orb_bridge::{env, telemetry, Bridge, BridgeConfig, Signals};
use orb_delegate::MemoryDelegate;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "orb-bridge", version, about = "Line-delimited JSON request bridge")]
struct Cli {
    /// Also write diagnostics to this file [env: ORB_LOG_FILE]
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Milliseconds `close` waits for other requests [env: ORB_CLOSE_DRAIN_MS]
    #[arg(long)]
    close_drain_ms: Option<u64>,

    /// Longest accepted input line in bytes [env: ORB_MAX_FRAME_BYTES]
    #[arg(long)]
    max_frame_bytes: Option<usize>,
}

impl Cli {
    fn config(&self) -> BridgeConfig {
        let mut config = BridgeConfig::from_env();
        if let Some(ms) = self.close_drain_ms {
            config.close_drain = Duration::from_millis(ms);
        }
        if let Some(max) = self.max_frame_bytes.filter(|n| *n > 0) {
            config.max_frame_bytes = max;
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_file = cli.log_file.clone().or_else(env::log_file);
    let _guard = match telemetry::init(log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("orb-bridge: {e}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    let config = cli.config();
    let result = runtime.block_on(async move {
        let signals = Signals::install()?;
        let transport = StreamTransport::stdio(config.max_frame_bytes);
        let bridge = Bridge::new(Arc::new(MemoryDelegate::new())).with_config(config);
        bridge.serve(transport, signals.recv()).await
    });
    // stdin's blocking reader never returns on its own; don't wait for it.
    runtime.shutdown_background();

    match result {
        Ok(reason) => {
            info!(%reason, "exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "bridge failed");
            ExitCode::FAILURE
        }
    }
}
