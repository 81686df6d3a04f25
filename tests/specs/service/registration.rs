// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! StartRegistration and the private registration endpoint.

use std::collections::BTreeMap;

use crate::prelude::*;

async fn private_client(service: &Service) -> (String, Client) {
    let mut client = service.client().await;
    let address = client.call(MAIN_PATH, MAIN_INTERFACE, "StartRegistration", Vec::new()).await.unwrap();
    let address = address.as_str().unwrap().to_string();
    let private = Client::connect(&address).await.unwrap().with_timeout(TIMEOUT);
    (address, private)
}

fn options<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Dict(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect::<BTreeMap<_, _>>())
}

#[tokio::test]
async fn start_registration_returns_a_private_address() {
    let service = Service::start().await;
    let (address, mut private) = private_client(&service).await;

    let path = address.strip_prefix("unix:path=").unwrap();
    assert!(std::path::Path::new(path).starts_with(&service.config.private_dir));
    assert_ne!(path, service.config.socket_path.to_str().unwrap());

    let info = private.introspect(REGISTER_PATH).await.unwrap();
    let methods = info.as_dict().and_then(|d| d.get("methods")).cloned().unwrap();
    assert_eq!(methods, Value::Array(vec![Value::from("Register"), Value::from("RegisterWithActivationKeys")]));

    service.stop().await;
}

#[tokio::test]
async fn register_is_not_served_on_the_public_socket() {
    let service = Service::start().await;
    let mut client = service.client().await;

    let result = client.introspect(REGISTER_PATH).await;
    assert_eq!(fault_kind(result), FaultKind::UnknownObject);

    service.stop().await;
}

#[tokio::test]
async fn register_with_credentials_persists_identity_once_and_strips_the_cert() {
    let service = Service::start().await;
    let (_, mut private) = private_client(&service).await;

    let consumer = private
        .call(
            REGISTER_PATH,
            REGISTER_INTERFACE,
            "Register",
            vec![
                Value::from("admin"),
                Value::from("secret"),
                Value::from("acme"),
                options([("name", Value::from("web01")), ("host", Value::from("candlepin.example.com"))]),
            ],
        )
        .await
        .unwrap();

    let consumer = consumer.as_dict().unwrap();
    assert_eq!(consumer.get("uuid"), Some(&Value::from("fake-uuid")));
    assert!(!consumer.contains_key("idCert"));

    let persisted = service.identity.persisted();
    assert_eq!(persisted.len(), 1);
    assert!(persisted[0].get("idCert").is_some());

    let calls = service.entitlement.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].conn.host, "candlepin.example.com");
    assert_eq!(calls[0].conn.username.as_deref(), Some("admin"));
    assert_eq!(calls[0].request.name, "web01");
    assert_eq!(calls[0].request.owner.as_deref(), Some("acme"));
    assert_eq!(calls[0].request.facts.get("uname.machine").map(String::as_str), Some("x86_64"));

    service.stop().await;
}

#[tokio::test]
async fn activation_keys_register_without_credentials() {
    let service = Service::start().await;
    let (_, mut private) = private_client(&service).await;

    private
        .call(
            REGISTER_PATH,
            REGISTER_INTERFACE,
            "RegisterWithActivationKeys",
            vec![
                Value::from("acme"),
                Value::Array(vec![Value::from("key-1"), Value::from("key-2")]),
                options([]),
            ],
        )
        .await
        .unwrap();

    let calls = service.entitlement.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].conn.username, None);
    assert_eq!(calls[0].request.activation_keys, vec!["key-1", "key-2"]);

    service.stop().await;
}

#[tokio::test]
async fn invalid_options_fail_before_contacting_the_server() {
    let service = Service::start().await;
    let (_, mut private) = private_client(&service).await;

    let result = private
        .call(
            REGISTER_PATH,
            REGISTER_INTERFACE,
            "RegisterWithActivationKeys",
            vec![Value::from("acme"), Value::Array(vec![Value::from("key-1")]), options([("autoattach", Value::Bool(true))])],
        )
        .await;
    let err = result.unwrap_err();
    let fault = err.fault().unwrap();
    assert_eq!(fault.kind, FaultKind::RegistrationValidationFailed);
    assert_eq!(fault.message, "Error: Activation keys cannot be used with --auto-attach.");
    assert!(service.entitlement.calls().is_empty());
    assert!(service.identity.persisted().is_empty());

    service.stop().await;
}

#[tokio::test]
async fn already_registered_systems_need_force() {
    let fakes = Fakes { identity: MemoryIdentityStore::registered(), ..Fakes::default() };
    let service = Service::start_with(fakes).await;
    let (_, mut private) = private_client(&service).await;

    let args = |opts: Value| vec![Value::from("admin"), Value::from("secret"), Value::from("acme"), opts];
    let result = private.call(REGISTER_PATH, REGISTER_INTERFACE, "Register", args(options([]))).await;
    assert_eq!(fault_kind(result), FaultKind::RegistrationValidationFailed);

    private
        .call(REGISTER_PATH, REGISTER_INTERFACE, "Register", args(options([("force", Value::Bool(true))])))
        .await
        .unwrap();
    assert_eq!(service.entitlement.calls().len(), 1);

    service.stop().await;
}

#[tokio::test]
async fn server_errors_are_wrapped_as_service_faults() {
    let fakes = Fakes { entitlement: FakeEntitlementServer::failing(500, "database on fire"), ..Fakes::default() };
    let service = Service::start_with(fakes).await;
    let (_, mut private) = private_client(&service).await;

    let err = private
        .call(
            REGISTER_PATH,
            REGISTER_INTERFACE,
            "Register",
            vec![Value::from("admin"), Value::from("secret"), Value::from("acme"), options([])],
        )
        .await
        .unwrap_err();
    let fault = err.fault().unwrap();
    assert_eq!(fault.kind, FaultKind::Service);
    assert!(fault.message.starts_with("ServerError: "));
    assert!(fault.message.contains("database on fire"));
    assert!(service.identity.persisted().is_empty());

    service.stop().await;
}

#[tokio::test]
async fn private_socket_is_removed_after_its_last_client_leaves() {
    let service = Service::start().await;
    let (address, private) = private_client(&service).await;
    let path = std::path::PathBuf::from(address.strip_prefix("unix:path=").unwrap());
    assert!(path.exists());

    drop(private);
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while path.exists() {
        assert!(tokio::time::Instant::now() < deadline, "private socket was not removed");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    service.stop().await;
}
