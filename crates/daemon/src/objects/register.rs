// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registration service, exported only on private connections.
//!
//! Options are validated synchronously, before any network traffic. The
//! registration itself and identity persistence run as a task.

use std::collections::BTreeMap;
use std::sync::Arc;

use subman_wire::names::{REGISTER_INTERFACE, REGISTER_PATH};
use subman_wire::{Fault, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::adapters::{
    hostname, AdapterError, ConnectionOptions, ConsumerRequest, EntitlementServer, FactsCollector, IdentityStore,
};
use crate::bus::{Args, ChangeHook, MethodError, Properties, Reply, ServiceObject};

/// Registration options keyed by name.
pub type Options = BTreeMap<String, Value>;

#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Business rule violated by the options; nothing was sent.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl From<RegistrationError> for MethodError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::Validation(message) => Fault::validation(message).into(),
            RegistrationError::Adapter(e) => e.into(),
        }
    }
}

/// Collaborators of the registration service.
#[derive(Clone)]
pub struct RegisterDeps {
    pub entitlement: Arc<dyn EntitlementServer>,
    pub identity: Arc<dyn IdentityStore>,
    pub facts: Arc<dyn FactsCollector>,
}

/// Loose truthiness: missing, `false`, zero, and empty strings or
/// containers are all false.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Unit) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Int64(n)) => *n != 0,
        Some(Value::UInt64(n)) => *n != 0,
        Some(Value::Double(n)) => *n != 0.0,
        Some(Value::Str(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Dict(map)) => !map.is_empty(),
    }
}

fn has_empty_key(keys: Option<&Value>) -> bool {
    match keys {
        Some(Value::Array(items)) => items.iter().any(|k| k.as_str() == Some("")),
        _ => false,
    }
}

/// Check registration options against the business rules, first match
/// wins.
pub fn validate_options(options: &Options, registered: bool) -> Result<(), RegistrationError> {
    let opt = |name: &str| options.get(name);
    let set = |name: &str| truthy(options.get(name));
    let keys = set("activation_keys");
    let autoattach = set("autosubscribe") || set("autoattach");

    let error = if registered && !set("force") {
        Some("This system is already registered. Add force to options to override.")
    } else if opt("consumername").and_then(Value::as_str) == Some("") {
        Some("Error: system name can not be empty.")
    } else if set("username") && keys {
        Some("Error: Activation keys do not require user credentials.")
    } else if set("consumerid") && keys {
        Some("Error: Activation keys can not be used with previously registered IDs.")
    } else if set("environment") && keys {
        Some("Error: Activation keys do not allow environments to be specified.")
    } else if autoattach && keys {
        Some("Error: Activation keys cannot be used with --auto-attach.")
    } else if keys && has_empty_key(opt("activation_keys")) {
        Some("Error: Must specify an activation key")
    } else if set("service_level") && !autoattach {
        Some("Error: Must use --auto-attach with --servicelevel.")
    } else if keys && !set("org") {
        Some("Error: Must provide --org with activation keys.")
    } else if set("force") && set("consumerid") {
        Some(
            "Error: Can not force registration while attempting to recover registration with consumerid. \
             Please use --force without --consumerid to re-register or use the clean command and try again \
             without --force.",
        )
    } else {
        None
    };

    match error {
        Some(message) => Err(RegistrationError::Validation(message.to_string())),
        None => Ok(()),
    }
}

/// `name` option, or the host name when absent or empty.
pub fn consumer_name(options: &Options) -> String {
    options
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(hostname)
}

fn string_opt(options: &Options, name: &str) -> Option<String> {
    match options.get(name)? {
        Value::Str(s) if !s.is_empty() => Some(s.clone()),
        Value::Int64(n) => Some(n.to_string()),
        Value::UInt64(n) => Some(n.to_string()),
        _ => None,
    }
}

fn port_opt(options: &Options, name: &str) -> Option<u16> {
    string_opt(options, name).and_then(|p| p.parse().ok())
}

/// Connection settings from the options map; unset ones keep defaults.
pub fn connection_options(options: &Options, username: Option<&str>, password: Option<&str>) -> ConnectionOptions {
    let defaults = ConnectionOptions::default();
    ConnectionOptions {
        host: string_opt(options, "host").unwrap_or(defaults.host),
        port: port_opt(options, "port").unwrap_or(defaults.port),
        handler: string_opt(options, "handler").unwrap_or(defaults.handler),
        insecure: truthy(options.get("insecure")),
        proxy_hostname: string_opt(options, "proxy_hostname"),
        proxy_port: port_opt(options, "proxy_port"),
        proxy_user: string_opt(options, "proxy_user"),
        proxy_password: string_opt(options, "proxy_password"),
        username: username.map(str::to_string),
        password: password.map(str::to_string),
    }
}

/// Create the consumer, persist its identity once, and return the record
/// without the identity certificate. Runs on a worker thread.
fn register(deps: RegisterDeps, conn: ConnectionOptions, mut request: ConsumerRequest) -> Result<Value, MethodError> {
    match deps.facts.collect() {
        Ok(facts) => request.facts = facts,
        Err(e) => warn!(error = %e, "registering without facts"),
    }
    let mut consumer = deps.entitlement.register_consumer(&conn, &request)?;
    deps.identity.persist(&consumer)?;
    if let Some(map) = consumer.as_object_mut() {
        map.remove("idCert");
    }
    info!(consumer = %request.name, "system registered");
    Ok(Value::from(consumer))
}

pub struct RegisterObject {
    props: Properties,
    deps: RegisterDeps,
}

impl RegisterObject {
    pub fn new(deps: RegisterDeps, on_changed: ChangeHook) -> Self {
        let props = Properties::read_only(REGISTER_INTERFACE, Vec::<(String, Value)>::new()).with_change_hook(on_changed);
        Self { props, deps }
    }

    fn start(
        &self,
        options: Options,
        org: &str,
        keys: Vec<String>,
        credentials: Option<(&str, &str)>,
    ) -> Result<Reply, MethodError> {
        validate_options(&options, self.deps.identity.is_registered())?;

        let conn = connection_options(&options, credentials.map(|c| c.0), credentials.map(|c| c.1));
        let request = ConsumerRequest {
            name: consumer_name(&options),
            owner: Some(org.to_string()).filter(|o| !o.is_empty()),
            activation_keys: keys,
            environment: string_opt(&options, "environment"),
            facts: BTreeMap::new(),
        };
        let deps = self.deps.clone();
        Ok(Reply::deferred("register", move || register(deps, conn, request)))
    }
}

impl ServiceObject for RegisterObject {
    fn object_path(&self) -> &str {
        REGISTER_PATH
    }

    fn properties(&self) -> &Properties {
        &self.props
    }

    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.props
    }

    fn methods(&self) -> &'static [&'static str] {
        &["Register", "RegisterWithActivationKeys"]
    }

    fn call_method(&mut self, member: &str, args: Args) -> Result<Reply, MethodError> {
        match member {
            "Register" => {
                let username = args.str(0, "username")?;
                let password = args.str(1, "password")?;
                let org = args.str(2, "org")?;
                let options = args.dict(3, "options")?.clone();
                self.start(options, org, Vec::new(), Some((username, password)))
            }
            "RegisterWithActivationKeys" => {
                let org = args.str(0, "org")?;
                let keys = args.strings(1, "activation_keys")?;
                let mut options = args.dict(2, "options")?.clone();
                options.insert("activation_keys".to_string(), Value::Array(keys.iter().cloned().map(Value::Str).collect()));
                options.insert("org".to_string(), Value::from(org));
                self.start(options, org, keys, None)
            }
            _ => Err(Fault::unknown_method(REGISTER_INTERFACE, member).into()),
        }
    }
}

#[cfg(test)]
#[path = "register_tests.rs"]
mod tests;
