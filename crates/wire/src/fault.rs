// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured faults returned to remote callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::names::BUS_NAME;

/// Kind of a remote fault. Callers branch on this, never on the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultKind {
    UnknownInterface,
    UnknownProperty,
    UnknownMethod,
    UnknownObject,
    InvalidArguments,
    AccessDenied,
    Failed,
    RegistrationValidationFailed,
    /// An internal error wrapped at the dispatch boundary.
    Service,
}

subman_core::named_variants! {
    FaultKind {
        UnknownInterface => "org.freedesktop.DBus.Error.UnknownInterface",
        UnknownProperty => "org.freedesktop.DBus.Error.UnknownProperty",
        UnknownMethod => "org.freedesktop.DBus.Error.UnknownMethod",
        UnknownObject => "org.freedesktop.DBus.Error.UnknownObject",
        InvalidArguments => "org.freedesktop.DBus.Error.InvalidArgs",
        AccessDenied => "org.freedesktop.DBus.Error.AccessDenied",
        Failed => "org.freedesktop.DBus.Error.Failed",
        RegistrationValidationFailed => "com.redhat.RHSM1.Error",
        Service => "com.redhat.RHSM1.Error",
    }
}

/// A typed fault: what went wrong and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Error name as seen on the bus.
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn unknown_interface(interface: &str) -> Self {
        Self::new(FaultKind::UnknownInterface, format!("Interface '{interface}' is unknown"))
    }

    pub fn unknown_property(property: &str) -> Self {
        Self::new(FaultKind::UnknownProperty, format!("Property '{property}' does not exist"))
    }

    pub fn unknown_method(interface: &str, member: &str) -> Self {
        Self::new(FaultKind::UnknownMethod, format!("Method '{member}' does not exist on interface: {interface}"))
    }

    pub fn unknown_object(path: &str) -> Self {
        Self::new(FaultKind::UnknownObject, format!("No object at path '{path}'"))
    }

    pub fn invalid_args(argument: &str) -> Self {
        Self::new(FaultKind::InvalidArguments, format!("Argument '{argument}' is invalid"))
    }

    pub fn access_denied(property: &str, interface: &str) -> Self {
        Self::new(
            FaultKind::AccessDenied,
            format!("Property '{property}' isn't exported (or does not exist) on interface: {interface}"),
        )
    }

    pub fn failed(message: Option<&str>) -> Self {
        Self::new(FaultKind::Failed, message.unwrap_or("Operation failed"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FaultKind::RegistrationValidationFailed, message)
    }

    /// Wrap an internal error as `"<kind>: <message>"`.
    pub fn service(kind: &str, message: impl std::fmt::Display) -> Self {
        Self::new(FaultKind::Service, format!("{kind}: {message}"))
    }
}

/// Base name for errors defined by this service.
pub fn service_error_name() -> String {
    format!("{BUS_NAME}.Error")
}

#[cfg(test)]
#[path = "fault_tests.rs"]
mod tests;
