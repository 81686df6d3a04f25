// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration object: one property per section, addressed as
//! `section` or `section.key`.

use subman_wire::names::{CONFIG_INTERFACE, CONFIG_PATH};
use subman_wire::{Fault, Value};
use tracing::info;

use crate::bus::{ChangeHook, MethodError, Properties, ServiceObject};
use crate::storage::{ConfigError, ConfigStore, Sections};

pub const SECTION_SET_UNSUPPORTED: &str = "Setting an entire section is not supported.  Use 'section.property' format.";

pub struct ConfigObject {
    props: Properties,
    store: ConfigStore,
}

fn template(sections: Sections) -> impl Iterator<Item = (String, Value)> {
    sections.into_iter().map(|(name, entries)| (name, Value::string_map(entries)))
}

/// Unknown names surface as unknown properties; anything else is internal.
fn lookup_error(name: &str, e: ConfigError) -> MethodError {
    match e {
        ConfigError::UnknownSection(_) | ConfigError::UnknownKey { .. } => Fault::unknown_property(name).into(),
        other => other.into(),
    }
}

/// Configuration values are strings; scalar values are stored as their text.
fn config_text(value: &Value) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.clone()),
        Value::Bool(_) | Value::Int64(_) | Value::UInt64(_) | Value::Double(_) => Some(value.to_json().to_string()),
        _ => None,
    }
}

impl ConfigObject {
    pub fn new(store: ConfigStore, on_changed: ChangeHook) -> Self {
        let props = Properties::read_only(CONFIG_INTERFACE, template(store.sections())).with_change_hook(on_changed);
        Self { props, store }
    }
}

impl ServiceObject for ConfigObject {
    fn object_path(&self) -> &str {
        CONFIG_PATH
    }

    fn properties(&self) -> &Properties {
        &self.props
    }

    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.props
    }

    fn get(&self, interface: &str, property: &str) -> Result<Value, MethodError> {
        self.props.check_interface(interface)?;
        match property.split_once('.') {
            Some((section, key)) => {
                self.store.get(section, key).map(Value::Str).map_err(|e| lookup_error(property, e))
            }
            None => Ok(self.props.get(interface, property)?),
        }
    }

    /// Persist synchronously, then reload the property map and notify.
    fn set(&mut self, interface: &str, property: &str, value: Value) -> Result<(), MethodError> {
        self.props.check_interface(interface)?;
        let (section, key) = match property.split_once('.') {
            Some((section, key)) if !key.is_empty() => (section, key),
            _ => return Err(Fault::failed(Some(SECTION_SET_UNSUPPORTED)).into()),
        };
        let text = config_text(&value).ok_or_else(|| Fault::invalid_args("new_value"))?;

        let previous = self.store.clone();
        self.store.set(section, key, text).map_err(|e| lookup_error(property, e))?;
        if let Err(e) = self.store.persist() {
            self.store = previous;
            return Err(e.into());
        }
        info!(section, key, "config value set");

        self.props.replace_all(template(self.store.sections()));
        self.props.emit_changed([section]);
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
