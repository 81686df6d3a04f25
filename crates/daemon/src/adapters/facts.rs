// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fact collection: the running host plus user overrides from `*.facts`
//! files, merged in that order.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sysinfo::System;
use tracing::warn;

use super::AdapterError;

/// Produces the flat `name -> value` fact map reported to the server.
pub trait FactsCollector: Send + Sync + 'static {
    /// Blocking; only ever called from a worker thread.
    fn collect(&self) -> Result<BTreeMap<String, String>, AdapterError>;
}

/// Collects a minimal set of facts about the running host.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostCollector;

impl FactsCollector for HostCollector {
    fn collect(&self) -> Result<BTreeMap<String, String>, AdapterError> {
        let sys = System::new_all();
        let mut facts = BTreeMap::new();

        facts.insert("uname.machine".to_string(), std::env::consts::ARCH.to_string());
        facts.insert("uname.sysname".to_string(), std::env::consts::OS.to_string());
        let optional = [
            ("uname.release", System::kernel_version()),
            ("uname.nodename", System::host_name()),
            ("distribution.name", System::name()),
            ("distribution.version", System::os_version()),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                facts.insert(name.to_string(), value);
            }
        }
        facts.insert("memory.memtotal".to_string(), (sys.total_memory() / 1024).to_string());
        facts.insert("cpu.cpu(s)".to_string(), sys.cpus().len().to_string());

        if facts.len() < 3 {
            return Err(AdapterError::Facts("host reported no facts".to_string()));
        }
        Ok(facts)
    }
}

/// User-supplied facts: every `*.facts` file in one directory holds a JSON
/// object. Files apply in name order, so a later file overrides an earlier
/// one. A missing directory yields no facts; unreadable, malformed or
/// non-object files are skipped.
#[derive(Debug, Clone)]
pub struct CustomCollector {
    dir: PathBuf,
}

impl CustomCollector {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn fact_files(&self) -> Result<Vec<PathBuf>, AdapterError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "facts") && path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }
}

impl FactsCollector for CustomCollector {
    fn collect(&self) -> Result<BTreeMap<String, String>, AdapterError> {
        let mut facts = BTreeMap::new();
        for path in self.fact_files()? {
            match read_fact_file(&path) {
                Ok(found) => facts.extend(found),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping custom facts file"),
            }
        }
        Ok(facts)
    }
}

fn read_fact_file(path: &Path) -> Result<BTreeMap<String, String>, AdapterError> {
    let text = std::fs::read_to_string(path)?;
    let serde_json::Value::Object(map) = serde_json::from_str(&text)? else {
        return Err(AdapterError::Facts(format!("{} does not hold a JSON object", path.display())));
    };
    Ok(map.into_iter().map(|(name, value)| (name, fact_text(value))).collect())
}

/// Facts are flat strings; anything else keeps its JSON text.
fn fact_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Runs collectors in order and merges their maps. Later collectors win on
/// conflicting names; the first failure aborts the collection.
#[derive(Clone, Default)]
pub struct CompositeCollector {
    collectors: Vec<Arc<dyn FactsCollector>>,
}

impl CompositeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, collector: impl FactsCollector) -> Self {
        self.collectors.push(Arc::new(collector));
        self
    }
}

impl FactsCollector for CompositeCollector {
    fn collect(&self) -> Result<BTreeMap<String, String>, AdapterError> {
        let mut facts = BTreeMap::new();
        for collector in &self.collectors {
            facts.extend(collector.collect()?);
        }
        Ok(facts)
    }
}

/// Host name used as the default consumer name.
pub fn hostname() -> String {
    System::host_name().unwrap_or_else(|| "localhost".to_string())
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{AdapterError, FactsCollector};

    /// Returns a fixed fact map and counts collections
    #[derive(Clone, Default)]
    pub struct StaticFactsCollector {
        facts: BTreeMap<String, String>,
        calls: Arc<AtomicUsize>,
    }

    impl StaticFactsCollector {
        pub fn new<K: Into<String>, V: Into<String>>(facts: impl IntoIterator<Item = (K, V)>) -> Self {
            Self {
                facts: facts.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FactsCollector for StaticFactsCollector {
        fn collect(&self) -> Result<BTreeMap<String, String>, AdapterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.facts.clone())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::StaticFactsCollector;

#[cfg(test)]
#[path = "facts_tests.rs"]
mod tests;
