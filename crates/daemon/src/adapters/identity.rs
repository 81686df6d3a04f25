// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Consumer identity persistence.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use super::AdapterError;

/// Where the registered consumer's identity lives.
pub trait IdentityStore: Send + Sync + 'static {
    fn is_registered(&self) -> bool;

    /// Persist the identity certificate carried in `consumer["idCert"]`.
    fn persist(&self, consumer: &serde_json::Value) -> Result<(), AdapterError>;
}

/// Stores `cert.pem`, `key.pem` and `consumer.json` in a directory.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    dir: PathBuf,
}

impl FileIdentityStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn cert_path(&self) -> PathBuf {
        self.dir.join("cert.pem")
    }

    pub fn key_path(&self) -> PathBuf {
        self.dir.join("key.pem")
    }

    pub fn consumer_path(&self) -> PathBuf {
        self.dir.join("consumer.json")
    }
}

impl IdentityStore for FileIdentityStore {
    fn is_registered(&self) -> bool {
        self.cert_path().exists()
    }

    fn persist(&self, consumer: &serde_json::Value) -> Result<(), AdapterError> {
        let id_cert = consumer
            .get("idCert")
            .ok_or_else(|| AdapterError::InvalidResponse("consumer has no idCert".to_string()))?;
        let cert = id_cert
            .get("cert")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| AdapterError::InvalidResponse("idCert has no cert".to_string()))?;
        let key = id_cert
            .get("key")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| AdapterError::InvalidResponse("idCert has no key".to_string()))?;

        fs::create_dir_all(&self.dir)?;
        fs::write(self.cert_path(), cert)?;
        write_private(&self.key_path(), key.as_bytes())?;

        let mut record = consumer.clone();
        if let Some(map) = record.as_object_mut() {
            map.remove("idCert");
        }
        fs::write(self.consumer_path(), serde_json::to_vec_pretty(&record)?)?;

        info!(dir = %self.dir.display(), "identity persisted");
        Ok(())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new().write(true).create(true).truncate(true).mode(0o600).open(path)?;
    file.write_all(data)
}

#[cfg(not(unix))]
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(data)
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::{AdapterError, IdentityStore};

    #[derive(Default)]
    struct MemoryState {
        registered: bool,
        persisted: Vec<serde_json::Value>,
    }

    /// Identity store that keeps everything in memory
    #[derive(Clone, Default)]
    pub struct MemoryIdentityStore {
        inner: Arc<Mutex<MemoryState>>,
    }

    impl MemoryIdentityStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn registered() -> Self {
            let store = Self::default();
            store.inner.lock().registered = true;
            store
        }

        /// Every consumer record handed to `persist`, in order.
        pub fn persisted(&self) -> Vec<serde_json::Value> {
            self.inner.lock().persisted.clone()
        }
    }

    impl IdentityStore for MemoryIdentityStore {
        fn is_registered(&self) -> bool {
            self.inner.lock().registered
        }

        fn persist(&self, consumer: &serde_json::Value) -> Result<(), AdapterError> {
            if consumer.get("idCert").is_none() {
                return Err(AdapterError::InvalidResponse("consumer has no idCert".to_string()));
            }
            let mut inner = self.inner.lock();
            inner.persisted.push(consumer.clone());
            inner.registered = true;
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::MemoryIdentityStore;

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
