// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! submand: subscription management service

use std::path::Path;

use subman_daemon::{env, Config, LifecycleError, Server, ServerDeps};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("submand: {e}");
            std::process::exit(1);
        }
    };
    let _guard = init_logging(&config.log_path);

    if let Err(e) = run(config) {
        error!("submand failed: {}", e);
        eprintln!("submand: {e}");
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<(), LifecycleError> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(async {
        let server = Server::bind(&config, ServerDeps::production(&config))?;
        let handle = server.handle();

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
                _ = sigterm.recv() => info!("received SIGTERM"),
            }
            handle.shutdown();
        });

        info!(pid = std::process::id(), "submand starting");
        server.run().await;
        info!("submand stopped");
        Ok::<(), LifecycleError>(())
    })
}

/// Log to the daemon log file, or stderr when requested. `RUST_LOG`
/// overrides the default `info` filter.
fn init_logging(log_path: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let file = if env::log_to_stderr() {
        None
    } else {
        log_path.parent().and_then(|dir| std::fs::create_dir_all(dir).ok()).and_then(|()| {
            std::fs::OpenOptions::new().create(true).append(true).open(log_path).ok()
        })
    };

    match file {
        Some(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            builder.with_ansi(false).with_writer(writer).init();
            Some(guard)
        }
        None => {
            builder.with_writer(std::io::stderr).init();
            None
        }
    }
}
