// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Default lifetime of cached facts.
pub const DEFAULT_FACTS_CACHE: Duration = Duration::from_secs(240);

/// Resolve state directory: SUBMAN_STATE_DIR > XDG_STATE_HOME/subman > ~/.local/state/subman
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("SUBMAN_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("subman"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/subman"))
}

/// Directory standing in for the shared bus (SUBMAN_BUS_DIR, default `<state>/bus`).
pub fn bus_dir(state_dir: &std::path::Path) -> PathBuf {
    std::env::var("SUBMAN_BUS_DIR").map(PathBuf::from).unwrap_or_else(|_| state_dir.join("bus"))
}

/// Entitlement configuration file (SUBMAN_CONFIG, default `<state>/rhsm.toml`).
pub fn config_path(state_dir: &std::path::Path) -> PathBuf {
    std::env::var("SUBMAN_CONFIG").map(PathBuf::from).unwrap_or_else(|_| state_dir.join("rhsm.toml"))
}

/// User fact overrides, one JSON object per `*.facts` file (SUBMAN_FACTS_DIR, default `<state>/facts`).
pub fn facts_dir(state_dir: &std::path::Path) -> PathBuf {
    std::env::var("SUBMAN_FACTS_DIR").map(PathBuf::from).unwrap_or_else(|_| state_dir.join("facts"))
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    millis_var("SUBMAN_IPC_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Cap on concurrently running tasks. Unset means unbounded.
pub fn max_workers() -> Option<usize> {
    std::env::var("SUBMAN_MAX_WORKERS").ok().and_then(|s| s.parse::<usize>().ok()).filter(|n| *n > 0)
}

/// Per-task deadline. Unset means tasks may run forever.
pub fn task_timeout() -> Option<Duration> {
    millis_var("SUBMAN_TASK_TIMEOUT_MS")
}

/// How long collected facts stay fresh.
pub fn facts_cache_duration() -> Duration {
    std::env::var("SUBMAN_FACTS_CACHE_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_FACTS_CACHE)
}

/// Log to stderr instead of the daemon log file.
pub fn log_to_stderr() -> bool {
    matches!(std::env::var("SUBMAN_LOG_STDERR").as_deref(), Ok("1") | Ok("true"))
}

fn millis_var(name: &str) -> Option<Duration> {
    std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
