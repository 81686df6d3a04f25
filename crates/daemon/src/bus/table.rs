// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Objects exported on a connection or server, keyed by path.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::object::ServiceObject;

pub type ObjectRef = Arc<Mutex<dyn ServiceObject>>;

/// Wrap an object for registration.
pub fn object_ref<O: ServiceObject>(object: O) -> ObjectRef {
    Arc::new(Mutex::new(object))
}

#[derive(Clone, Default)]
pub struct ObjectTable {
    objects: Arc<Mutex<BTreeMap<String, ObjectRef>>>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export `object` at its own path, replacing any previous occupant.
    pub fn register(&self, object: ObjectRef) {
        let path = object.lock().object_path().to_string();
        debug!(%path, "object exported");
        if self.objects.lock().insert(path.clone(), object).is_some() {
            warn!(%path, "replaced object already exported at path");
        }
    }

    pub fn get(&self, path: &str) -> Option<ObjectRef> {
        self.objects.lock().get(path).cloned()
    }

    pub fn remove(&self, path: &str) -> Option<ObjectRef> {
        self.objects.lock().remove(path)
    }

    /// Detach every object. Returns how many were exported.
    pub fn clear(&self) -> usize {
        let mut objects = self.objects.lock();
        let count = objects.len();
        objects.clear();
        count
    }

    pub fn paths(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}
