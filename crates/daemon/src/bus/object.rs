// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The remote object contract.

use std::collections::BTreeMap;
use std::fmt;

use subman_wire::{Fault, Value};
use thiserror::Error;

use super::properties::Properties;
use crate::adapters::AdapterError;
use crate::lifecycle::LifecycleError;
use crate::storage::ConfigError;

/// Error from a method handler.
///
/// A [`Fault`] reaches the caller unchanged; anything else is wrapped as a
/// service fault carrying its kind and message.
#[derive(Debug, Error)]
pub enum MethodError {
    #[error(transparent)]
    Fault(#[from] Fault),

    #[error("{message}")]
    Internal { kind: &'static str, message: String },
}

impl MethodError {
    pub fn internal(kind: &'static str, message: impl fmt::Display) -> Self {
        MethodError::Internal { kind, message: message.to_string() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MethodError::Fault(_) => "Fault",
            MethodError::Internal { kind, .. } => kind,
        }
    }

    pub fn into_fault(self) -> Fault {
        match self {
            MethodError::Fault(fault) => fault,
            MethodError::Internal { kind, message } => Fault::service(kind, message),
        }
    }
}

impl From<AdapterError> for MethodError {
    fn from(e: AdapterError) -> Self {
        MethodError::internal(e.kind(), e)
    }
}

impl From<ConfigError> for MethodError {
    fn from(e: ConfigError) -> Self {
        MethodError::internal("ConfigError", e)
    }
}

impl From<LifecycleError> for MethodError {
    fn from(e: LifecycleError) -> Self {
        MethodError::internal("LifecycleError", e)
    }
}

/// Blocking work run on a worker thread.
pub type DeferredWork = Box<dyn FnOnce() -> Result<Value, MethodError> + Send + 'static>;

/// Work to finish off the coordinating thread before replying.
pub struct Deferred {
    /// Task name; also the worker thread name.
    pub name: String,
    pub work: DeferredWork,
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").field("name", &self.name).finish_non_exhaustive()
    }
}

/// What a method handler hands back to the dispatcher.
#[derive(Debug)]
pub enum Reply {
    /// Reply now.
    Value(Value),
    /// Run `work` as a task, pass its value through
    /// [`ServiceObject::complete`], then reply.
    Deferred(Deferred),
}

impl Reply {
    pub fn deferred<F>(name: impl Into<String>, work: F) -> Self
    where
        F: FnOnce() -> Result<Value, MethodError> + Send + 'static,
    {
        Reply::Deferred(Deferred { name: name.into(), work: Box::new(work) })
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Value(value)
    }
}

/// Positional method arguments with typed accessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Value>);

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn value(&self, index: usize, name: &str) -> Result<&Value, MethodError> {
        self.0.get(index).ok_or_else(|| Fault::invalid_args(name).into())
    }

    pub fn take(&mut self, index: usize, name: &str) -> Result<Value, MethodError> {
        let slot = self.0.get_mut(index).ok_or_else(|| MethodError::from(Fault::invalid_args(name)))?;
        Ok(std::mem::replace(slot, Value::Unit))
    }

    pub fn str(&self, index: usize, name: &str) -> Result<&str, MethodError> {
        self.value(index, name)?.as_str().ok_or_else(|| Fault::invalid_args(name).into())
    }

    pub fn dict(&self, index: usize, name: &str) -> Result<&BTreeMap<String, Value>, MethodError> {
        self.value(index, name)?.as_dict().ok_or_else(|| Fault::invalid_args(name).into())
    }

    /// An `as` argument.
    pub fn strings(&self, index: usize, name: &str) -> Result<Vec<String>, MethodError> {
        let items = self.value(index, name)?.as_array().ok_or_else(|| MethodError::from(Fault::invalid_args(name)))?;
        items
            .iter()
            .map(|v| v.as_str().map(str::to_string).ok_or_else(|| Fault::invalid_args(name).into()))
            .collect()
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// An addressable remote object.
///
/// Every object answers the standard property operations for its own
/// interface; the defaults check the interface before delegating to the
/// property collection. Objects only ever run on the coordinating thread.
pub trait ServiceObject: Send + 'static {
    fn object_path(&self) -> &str;

    fn properties(&self) -> &Properties;

    fn properties_mut(&mut self) -> &mut Properties;

    fn interface_name(&self) -> &str {
        self.properties().interface()
    }

    /// Names of the methods on [`interface_name`](Self::interface_name).
    fn methods(&self) -> &'static [&'static str] {
        &[]
    }

    /// Handle a method on the object's own interface.
    fn call_method(&mut self, member: &str, _args: Args) -> Result<Reply, MethodError> {
        Err(Fault::unknown_method(self.interface_name(), member).into())
    }

    /// Post-process the value of a deferred reply on the coordinating thread.
    fn complete(&mut self, _member: &str, value: Value) -> Result<Value, MethodError> {
        Ok(value)
    }

    fn get_all(&self, interface: &str) -> Result<Value, MethodError> {
        Ok(Value::Dict(self.properties().get_all(interface)?))
    }

    fn get(&self, interface: &str, property: &str) -> Result<Value, MethodError> {
        Ok(self.properties().get(interface, property)?)
    }

    fn set(&mut self, interface: &str, property: &str, value: Value) -> Result<(), MethodError> {
        Ok(self.properties_mut().set(interface, property, value)?)
    }

    fn introspect(&self) -> Value {
        let methods = self.methods().iter().map(|m| Value::from(*m)).collect::<Vec<_>>();
        Value::Dict(BTreeMap::from([
            ("interface".to_string(), Value::from(self.interface_name())),
            ("methods".to_string(), Value::Array(methods)),
            ("properties".to_string(), self.properties().introspect()),
        ]))
    }
}

#[cfg(test)]
#[path = "object_tests.rs"]
mod tests;
