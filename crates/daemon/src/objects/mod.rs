// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Objects exported by the service.

mod config;
mod facts;
mod main;
mod register;

pub use config::{ConfigObject, SECTION_SET_UNSUPPORTED};
pub use facts::{FactsObject, FACTS_NAME, FACTS_VERSION};
pub use main::MainObject;
pub use register::{
    connection_options, consumer_name, validate_options, Options, RegisterDeps, RegisterObject, RegistrationError,
};
