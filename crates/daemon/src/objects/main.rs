// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Root object of the service.

use subman_wire::names::{MAIN_INTERFACE, MAIN_PATH};
use subman_wire::{Fault, Value};
use tracing::info;

use crate::bus::{Args, ChangeHook, MethodError, Properties, Reply, ServiceObject};
use crate::listener::PrivateServers;

pub struct MainObject {
    props: Properties,
    private: PrivateServers,
}

impl MainObject {
    pub fn new(private: PrivateServers, on_changed: ChangeHook) -> Self {
        let props = Properties::read_only(MAIN_INTERFACE, Vec::<(String, Value)>::new()).with_change_hook(on_changed);
        Self { props, private }
    }
}

impl ServiceObject for MainObject {
    fn object_path(&self) -> &str {
        MAIN_PATH
    }

    fn properties(&self) -> &Properties {
        &self.props
    }

    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.props
    }

    fn methods(&self) -> &'static [&'static str] {
        &["StartRegistration"]
    }

    fn call_method(&mut self, member: &str, _args: Args) -> Result<Reply, MethodError> {
        match member {
            "StartRegistration" => {
                let address = self.private.start()?;
                info!(%address, "registration server started");
                Ok(Value::Str(address).into())
            }
            _ => Err(Fault::unknown_method(MAIN_INTERFACE, member).into()),
        }
    }
}
