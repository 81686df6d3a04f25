// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON cache of the last fact collection.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One collection with its timestamps (seconds since the Unix epoch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFacts {
    pub facts: BTreeMap<String, String>,
    pub collected_at: u64,
    pub expires_at: u64,
}

impl CachedFacts {
    pub fn is_fresh(&self, now: u64) -> bool {
        now < self.expires_at
    }
}

/// File-backed facts cache with a fixed lifetime.
#[derive(Debug, Clone)]
pub struct FactsCache {
    path: PathBuf,
    ttl: Duration,
}

impl FactsCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self { path: path.into(), ttl }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached facts if present, readable and not yet expired at `now`.
    pub fn load_fresh(&self, now: u64) -> Option<CachedFacts> {
        let bytes = std::fs::read(&self.path).ok()?;
        let cached: CachedFacts = match serde_json::from_slice(&bytes) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt facts cache");
                return None;
            }
        };
        if cached.is_fresh(now) {
            Some(cached)
        } else {
            debug!(expired_at = cached.expires_at, now, "facts cache expired");
            None
        }
    }

    /// Stamp `facts` with `now` and write them. A write failure is logged
    /// and the stamped record is still returned.
    pub fn store(&self, facts: BTreeMap<String, String>, now: u64) -> CachedFacts {
        let cached = CachedFacts { facts, collected_at: now, expires_at: now + self.ttl.as_secs() };
        let tmp_path = self.path.with_extension("json.tmp");
        let written = (|| {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_vec(&cached).map_err(std::io::Error::other)?;
            std::fs::write(&tmp_path, json)?;
            std::fs::rename(&tmp_path, &self.path)
        })();
        if let Err(e) = written {
            warn!(path = %self.path.display(), error = %e, "failed to write facts cache");
        }
        cached
    }
}

#[cfg(test)]
#[path = "facts_cache_tests.rs"]
mod tests;
