// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service lifecycle: configuration, name claim, shutdown.

mod startup;

pub use startup::NameClaim;

use std::path::{Path, PathBuf};
use std::time::Duration;

use subman_core::TasksConfig;
use subman_wire::names::BUS_NAME;
use thiserror::Error;

use crate::env;
use crate::storage::ConfigError;

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/subman)
    pub state_dir: PathBuf,
    /// Directory standing in for the shared bus
    pub bus_dir: PathBuf,
    /// Socket the well-known name is served on
    pub socket_path: PathBuf,
    /// Lock file guarding the well-known name
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Directory for private registration sockets
    pub private_dir: PathBuf,
    /// Directory holding the consumer identity
    pub identity_dir: PathBuf,
    /// Entitlement configuration exposed on the Config object
    pub config_path: PathBuf,
    /// User `*.facts` overrides, merged over collected facts
    pub facts_dir: PathBuf,
    /// Facts cache file
    pub facts_cache_path: PathBuf,
    pub facts_cache_ttl: Duration,
    pub ipc_timeout: Duration,
    pub tasks: TasksConfig,
}

impl Config {
    /// Load configuration for the service from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::for_state_dir(env::state_dir()?))
    }

    /// Configuration rooted at `state_dir`. Other environment overrides
    /// still apply.
    pub fn for_state_dir(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        let bus_dir = env::bus_dir(&state_dir);
        Self {
            socket_path: bus_dir.join(format!("{BUS_NAME}.sock")),
            lock_path: bus_dir.join(format!("{BUS_NAME}.lock")),
            log_path: state_dir.join("submand.log"),
            private_dir: state_dir.join("private"),
            identity_dir: state_dir.join("identity"),
            config_path: env::config_path(&state_dir),
            facts_dir: env::facts_dir(&state_dir),
            facts_cache_path: state_dir.join("cache").join("facts.json"),
            facts_cache_ttl: env::facts_cache_duration(),
            ipc_timeout: env::ipc_timeout(),
            tasks: TasksConfig { max_workers: env::max_workers(), task_timeout: env::task_timeout() },
            bus_dir,
            state_dir,
        }
    }

    /// Bus address of the public socket.
    pub fn address(&self) -> String {
        address_for(&self.socket_path)
    }
}

/// `unix:path=<socket>`
pub fn address_for(socket: &Path) -> String {
    format!("unix:path={}", socket.display())
}

/// Errors that can occur while starting or running the service
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Name '{0}' is already owned by a running instance")]
    NameTaken(String),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
