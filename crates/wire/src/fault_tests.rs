// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    unknown_interface = { Fault::unknown_interface("x.Y"), "org.freedesktop.DBus.Error.UnknownInterface", "Interface 'x.Y' is unknown" },
    unknown_property  = { Fault::unknown_property("nope"), "org.freedesktop.DBus.Error.UnknownProperty", "Property 'nope' does not exist" },
    invalid_args      = { Fault::invalid_args("keys"), "org.freedesktop.DBus.Error.InvalidArgs", "Argument 'keys' is invalid" },
    access_denied     = { Fault::access_denied("p", "i"), "org.freedesktop.DBus.Error.AccessDenied", "Property 'p' isn't exported (or does not exist) on interface: i" },
    failed_default    = { Fault::failed(None), "org.freedesktop.DBus.Error.Failed", "Operation failed" },
    failed_message    = { Fault::failed(Some("disk full")), "org.freedesktop.DBus.Error.Failed", "disk full" },
    service           = { Fault::service("IoError", "denied"), "com.redhat.RHSM1.Error", "IoError: denied" },
)]
fn names_and_messages(fault: Fault, name: &str, message: &str) {
    assert_eq!(fault.name(), name);
    assert_eq!(fault.message, message);
    assert_eq!(fault.to_string(), message);
}

#[test]
fn service_error_name_is_under_the_bus_name() {
    assert_eq!(service_error_name(), FaultKind::Service.as_str());
    assert_eq!(service_error_name(), FaultKind::RegistrationValidationFailed.as_str());
}

#[test]
fn serialized_fault_carries_kind() {
    let json = serde_json::to_value(Fault::validation("bad")).unwrap();
    assert_eq!(json, serde_json::json!({"kind": "RegistrationValidationFailed", "message": "bad"}));
}
