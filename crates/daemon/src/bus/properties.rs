// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed property collections backing the standard `Get`/`GetAll`/`Set`
//! operations.
//!
//! A collection belongs to exactly one interface. Every lookup checks the
//! interface first, so a mismatched interface fails the same way whatever
//! property name is asked for. Collections are only touched from the
//! coordinating thread.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use subman_wire::{Fault, FaultKind, Value};

/// Whether remote callers may write a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Write => "write",
        }
    }
}

/// One named, typed attribute of an object.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: Value,
    pub signature: String,
    pub access: Access,
}

impl Property {
    /// Read-only property whose signature is taken from `value`.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        let signature = value.signature();
        Self { name: name.into(), value, signature, access: Access::Read }
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Pin the signature, e.g. `a{ss}` for a dict that starts out empty.
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    /// Whether a remote write of `value` keeps the declared type. Empty
    /// containers carry no element type and fit any container of their kind.
    fn accepts(&self, value: &Value) -> bool {
        if self.signature == "v" || value.signature() == self.signature {
            return true;
        }
        match value {
            Value::Array(items) => {
                items.is_empty() && self.signature.starts_with('a') && !self.signature.starts_with("a{")
            }
            Value::Dict(map) => map.is_empty() && self.signature.starts_with("a{"),
            _ => false,
        }
    }
}

/// Payload of a `PropertiesChanged` notification.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertiesChanged {
    pub interface: String,
    pub changed: BTreeMap<String, Value>,
    /// Always empty; changed values are sent in full.
    pub invalidated: Vec<String>,
}

impl PropertiesChanged {
    /// Signal arguments: `(s interface, a{sv} changed, as invalidated)`.
    pub fn to_args(&self) -> Vec<Value> {
        vec![
            Value::Str(self.interface.clone()),
            Value::Dict(self.changed.clone()),
            Value::Array(self.invalidated.iter().cloned().map(Value::Str).collect()),
        ]
    }
}

/// Receives change notifications.
pub type ChangeHook = Arc<dyn Fn(PropertiesChanged) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Remote `Set` always fails.
    ReadOnly,
    /// Remote `Set` honours each property's own access.
    ReadWrite,
}

/// The properties of one interface.
pub struct Properties {
    interface: String,
    mode: Mode,
    props: BTreeMap<String, Property>,
    on_changed: Option<ChangeHook>,
}

impl fmt::Debug for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Properties")
            .field("interface", &self.interface)
            .field("mode", &self.mode)
            .field("props", &self.props)
            .field("on_changed", &self.on_changed.is_some())
            .finish()
    }
}

impl Properties {
    /// Build one read-only property per template entry.
    pub fn read_only<K, I>(interface: impl Into<String>, template: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::build(interface.into(), Mode::ReadOnly, template)
    }

    /// Build a collection that accepts remote writes. Template entries are
    /// writable; entries added later with [`insert`](Self::insert) keep
    /// their own access.
    pub fn read_write<K, I>(interface: impl Into<String>, template: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::build(interface.into(), Mode::ReadWrite, template)
    }

    fn build<K, I>(interface: String, mode: Mode, template: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut properties = Self { interface, mode, props: BTreeMap::new(), on_changed: None };
        properties.fill(template);
        properties
    }

    fn fill<K, I>(&mut self, template: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let access = match self.mode {
            Mode::ReadOnly => Access::Read,
            Mode::ReadWrite => Access::Write,
        };
        for (name, value) in template {
            let prop = Property::new(name, value).with_access(access);
            self.props.insert(prop.name.clone(), prop);
        }
    }

    pub fn with_change_hook(mut self, hook: ChangeHook) -> Self {
        self.on_changed = Some(hook);
        self
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    pub fn check_interface(&self, interface: &str) -> Result<(), Fault> {
        if interface == self.interface {
            Ok(())
        } else {
            Err(Fault::unknown_interface(interface))
        }
    }

    /// Trusted add, bypassing access control.
    pub fn insert(&mut self, property: Property) {
        self.props.insert(property.name.clone(), property);
    }

    pub fn get(&self, interface: &str, name: &str) -> Result<Value, Fault> {
        self.check_interface(interface)?;
        self.props.get(name).map(|p| p.value.clone()).ok_or_else(|| Fault::unknown_property(name))
    }

    pub fn get_all(&self, interface: &str) -> Result<BTreeMap<String, Value>, Fault> {
        self.check_interface(interface)?;
        Ok(self.props.iter().map(|(name, p)| (name.clone(), p.value.clone())).collect())
    }

    /// Remote write. A read-only collection refuses every write; a
    /// read-write one stores the value and emits one change notification
    /// when the property is writable.
    pub fn set(&mut self, interface: &str, name: &str, value: Value) -> Result<(), Fault> {
        self.check_interface(interface)?;
        if self.mode == Mode::ReadOnly {
            return Err(Fault::access_denied(name, &self.interface));
        }
        let prop = self.props.get_mut(name).ok_or_else(|| Fault::unknown_property(name))?;
        if prop.access != Access::Write {
            return Err(Fault::access_denied(name, &self.interface));
        }
        if !prop.accepts(&value) {
            return Err(Fault::new(
                FaultKind::InvalidArguments,
                format!("Property '{name}' has type '{}', got '{}'", prop.signature, value.signature()),
            ));
        }
        prop.value = value;
        self.emit_changed([name]);
        Ok(())
    }

    /// Trusted write for the owning object. Creates the property (read
    /// access) if missing. Does not notify.
    pub fn set_internal(&mut self, name: &str, value: Value) {
        match self.props.get_mut(name) {
            Some(prop) => prop.value = value,
            None => self.insert(Property::new(name, value)),
        }
    }

    /// Replace every property from a fresh template, e.g. after a reload.
    pub fn replace_all<K, I>(&mut self, template: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        self.props.clear();
        self.fill(template);
    }

    /// Notify with the current values of `names`. Unknown names are skipped;
    /// nothing is sent when none remain.
    pub fn emit_changed<'a>(&self, names: impl IntoIterator<Item = &'a str>) {
        let Some(hook) = &self.on_changed else {
            return;
        };
        let changed: BTreeMap<String, Value> = names
            .into_iter()
            .filter_map(|name| self.props.get(name).map(|p| (name.to_string(), p.value.clone())))
            .collect();
        if changed.is_empty() {
            return;
        }
        hook(PropertiesChanged { interface: self.interface.clone(), changed, invalidated: Vec::new() });
    }

    /// `{name: {p_t, p_name, p_access}}`
    pub fn introspect(&self) -> Value {
        let entries = self.props.values().map(|p| {
            let access = match self.mode {
                Mode::ReadOnly => Access::Read,
                Mode::ReadWrite => p.access,
            };
            let info = Value::string_map([
                ("p_t", p.signature.as_str()),
                ("p_name", p.name.as_str()),
                ("p_access", access.as_str()),
            ]);
            (p.name.clone(), info)
        });
        Value::Dict(entries.collect())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.props.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "properties_tests.rs"]
mod tests;
