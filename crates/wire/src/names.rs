// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Well-known bus name, object paths and interface names.

/// Name claimed on the shared bus. One live instance per name.
pub const BUS_NAME: &str = "com.redhat.RHSM1";

/// Root of the object path tree. No trailing slash.
pub const ROOT_PATH: &str = "/com/redhat/RHSM1";

pub const MAIN_INTERFACE: &str = BUS_NAME;
pub const MAIN_PATH: &str = ROOT_PATH;

pub const CONFIG_INTERFACE: &str = "com.redhat.RHSM1.Config";
pub const CONFIG_PATH: &str = "/com/redhat/RHSM1/Config";

pub const FACTS_INTERFACE: &str = "com.redhat.RHSM1.Facts";
pub const FACTS_PATH: &str = "/com/redhat/RHSM1/Facts";

pub const REGISTER_INTERFACE: &str = "com.redhat.RHSM1.Register";
pub const REGISTER_PATH: &str = "/com/redhat/RHSM1/Register";

pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";
pub const INTROSPECTABLE_INTERFACE: &str = "org.freedesktop.DBus.Introspectable";

/// Signal emitted on [`PROPERTIES_INTERFACE`] after a property changes.
pub const PROPERTIES_CHANGED: &str = "PropertiesChanged";
