// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host facts object.

use std::collections::BTreeMap;
use std::sync::Arc;

use subman_core::Clock;
use subman_wire::names::{FACTS_INTERFACE, FACTS_PATH};
use subman_wire::{Fault, Value};
use tracing::debug;

use crate::adapters::FactsCollector;
use crate::bus::{Args, ChangeHook, MethodError, Properties, Property, Reply, ServiceObject};
use crate::storage::{CachedFacts, FactsCache};

pub const FACTS_VERSION: &str = "1.1e1";
pub const FACTS_NAME: &str = "Red Hat Subscription Manager facts.";

const COMPUTED: [&str; 3] = ["facts", "lastUpdatedTime", "cacheExpiryTime"];

pub struct FactsObject {
    props: Properties,
    collector: Arc<dyn FactsCollector>,
    cache: FactsCache,
    clock: Arc<dyn Clock>,
}

impl FactsObject {
    pub fn new(
        collector: Arc<dyn FactsCollector>,
        cache: FactsCache,
        clock: Arc<dyn Clock>,
        on_changed: ChangeHook,
    ) -> Self {
        let mut props = Properties::read_only(
            FACTS_INTERFACE,
            [("version", Value::from(FACTS_VERSION)), ("name", Value::from(FACTS_NAME))],
        )
        .with_change_hook(on_changed);
        props.insert(Property::new("facts", Value::Dict(BTreeMap::new())).with_signature("a{ss}"));
        props.insert(Property::new("lastUpdatedTime", Value::UInt64(0)));
        props.insert(Property::new("cacheExpiryTime", Value::UInt64(0)));
        Self { props, collector, cache, clock }
    }

    /// Publish a collection through the trusted setter. Notifies once, and
    /// only when something changed.
    fn apply(&mut self, cached: CachedFacts) -> Value {
        let facts = Value::string_map(cached.facts);
        let updates = [
            ("facts", facts.clone()),
            ("lastUpdatedTime", Value::UInt64(cached.collected_at)),
            ("cacheExpiryTime", Value::UInt64(cached.expires_at)),
        ];
        let interface = self.props.interface().to_string();
        let changed = updates.iter().any(|(name, value)| self.props.get(&interface, name).ok().as_ref() != Some(value));
        for (name, value) in updates {
            self.props.set_internal(name, value);
        }
        if changed {
            self.props.emit_changed(COMPUTED);
        }
        facts
    }
}

fn to_value(cached: CachedFacts) -> Value {
    Value::Dict(BTreeMap::from([
        ("facts".to_string(), Value::string_map(cached.facts)),
        ("collected_at".to_string(), Value::UInt64(cached.collected_at)),
        ("expires_at".to_string(), Value::UInt64(cached.expires_at)),
    ]))
}

fn from_value(value: &Value) -> Option<CachedFacts> {
    let map = value.as_dict()?;
    Some(CachedFacts {
        facts: map.get("facts")?.to_string_map()?,
        collected_at: map.get("collected_at")?.as_u64()?,
        expires_at: map.get("expires_at")?.as_u64()?,
    })
}

impl ServiceObject for FactsObject {
    fn object_path(&self) -> &str {
        FACTS_PATH
    }

    fn properties(&self) -> &Properties {
        &self.props
    }

    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.props
    }

    fn methods(&self) -> &'static [&'static str] {
        &["GetFacts"]
    }

    fn call_method(&mut self, member: &str, _args: Args) -> Result<Reply, MethodError> {
        if member != "GetFacts" {
            return Err(Fault::unknown_method(FACTS_INTERFACE, member).into());
        }
        if let Some(cached) = self.cache.load_fresh(self.clock.epoch_secs()) {
            debug!(expires_at = cached.expires_at, "facts served from cache");
            return Ok(self.apply(cached).into());
        }

        let collector = Arc::clone(&self.collector);
        let cache = self.cache.clone();
        let clock = Arc::clone(&self.clock);
        Ok(Reply::deferred("facts", move || {
            let facts = collector.collect()?;
            Ok(to_value(cache.store(facts, clock.epoch_secs())))
        }))
    }

    fn complete(&mut self, _member: &str, value: Value) -> Result<Value, MethodError> {
        let cached = from_value(&value)
            .ok_or_else(|| MethodError::internal("InvalidResponse", "malformed facts collection"))?;
        Ok(self.apply(cached))
    }
}

#[cfg(test)]
#[path = "facts_tests.rs"]
mod tests;
