// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Claiming the well-known name.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use subman_wire::names::BUS_NAME;
use tokio::net::UnixListener;
use tracing::{info, warn};

use super::{Config, LifecycleError};

/// Exclusive ownership of the bus name, held until [`release`](Self::release)
/// or drop.
#[derive(Debug)]
pub struct NameClaim {
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    lock_file: File,
    lock_path: PathBuf,
    socket_path: PathBuf,
}

impl NameClaim {
    /// Take the lock, then bind the socket.
    ///
    /// Fails with [`LifecycleError::NameTaken`] while another instance holds
    /// the name, without touching that instance's files.
    pub fn acquire(config: &Config) -> Result<(Self, UnixListener), LifecycleError> {
        std::fs::create_dir_all(&config.bus_dir)?;

        // Don't truncate before we hold the lock: that would wipe the
        // running instance's PID.
        let lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&config.lock_path)?;
        lock_file.try_lock_exclusive().map_err(|_| LifecycleError::NameTaken(BUS_NAME.to_string()))?;

        let mut lock_file = lock_file;
        lock_file.set_len(0)?;
        writeln!(lock_file, "{}", std::process::id())?;

        // Stale socket from a crashed instance
        if config.socket_path.exists() {
            std::fs::remove_file(&config.socket_path)?;
        }
        let listener = UnixListener::bind(&config.socket_path)
            .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

        info!(name = BUS_NAME, socket = %config.socket_path.display(), "name claimed");
        let claim = Self {
            lock_file,
            lock_path: config.lock_path.clone(),
            socket_path: config.socket_path.clone(),
        };
        Ok((claim, listener))
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Remove the socket and give up the lock.
    pub fn release(self) {
        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            warn!(socket = %self.socket_path.display(), error = %e, "failed to remove socket");
        }
        if let Err(e) = std::fs::remove_file(&self.lock_path) {
            warn!(lock = %self.lock_path.display(), error = %e, "failed to remove lock file");
        }
        if let Err(e) = self.lock_file.unlock() {
            warn!(error = %e, "failed to unlock name");
        }
        info!(name = BUS_NAME, "name released");
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
