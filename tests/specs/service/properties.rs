// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Standard property and introspection calls on the exported objects.

use crate::prelude::*;

#[tokio::test]
async fn facts_object_exposes_its_identity() {
    let service = Service::start().await;
    let mut client = service.client().await;

    let version = client.get(FACTS_PATH, FACTS_INTERFACE, "version").await.unwrap();
    assert_eq!(version, Value::from("1.1e1"));

    let all = client.get_all(FACTS_PATH, FACTS_INTERFACE).await.unwrap();
    assert_eq!(all.get("name"), Some(&Value::from("Red Hat Subscription Manager facts.")));
    assert!(all.contains_key("facts"));
    assert!(all.contains_key("lastUpdatedTime"));

    service.stop().await;
}

#[tokio::test]
async fn wrong_interface_and_unknown_property_are_distinct_faults() {
    let service = Service::start().await;
    let mut client = service.client().await;

    let wrong_iface = client.get(FACTS_PATH, "com.example.Nope", "version").await;
    assert_eq!(fault_kind(wrong_iface), FaultKind::UnknownInterface);

    let missing = client.get(FACTS_PATH, FACTS_INTERFACE, "nope").await;
    assert_eq!(fault_kind(missing), FaultKind::UnknownProperty);

    let get_all = client.get_all(FACTS_PATH, CONFIG_INTERFACE).await;
    assert_eq!(fault_kind(get_all), FaultKind::UnknownInterface);

    service.stop().await;
}

#[tokio::test]
async fn read_only_objects_refuse_writes() {
    let service = Service::start().await;
    let mut client = service.client().await;

    let result = client.set(FACTS_PATH, FACTS_INTERFACE, "version", Value::from("2")).await;
    assert_eq!(fault_kind(result), FaultKind::AccessDenied);
    let version = client.get(FACTS_PATH, FACTS_INTERFACE, "version").await.unwrap();
    assert_eq!(version, Value::from("1.1e1"));

    service.stop().await;
}

#[tokio::test]
async fn unknown_object_and_method_are_reported() {
    let service = Service::start().await;
    let mut client = service.client().await;

    let result = client.get("/com/redhat/RHSM1/Nowhere", FACTS_INTERFACE, "version").await;
    assert_eq!(fault_kind(result), FaultKind::UnknownObject);

    let result = client.call(FACTS_PATH, FACTS_INTERFACE, "Frobnicate", Vec::new()).await;
    assert_eq!(fault_kind(result), FaultKind::UnknownMethod);

    service.stop().await;
}

#[tokio::test]
async fn introspection_describes_methods_and_property_access() {
    let service = Service::start().await;
    let mut client = service.client().await;

    let info = client.introspect(MAIN_PATH).await.unwrap();
    let info = info.as_dict().unwrap();
    assert_eq!(info.get("interface"), Some(&Value::from(MAIN_INTERFACE)));
    assert_eq!(info.get("methods"), Some(&Value::Array(vec![Value::from("StartRegistration")])));

    let info = client.introspect(FACTS_PATH).await.unwrap();
    let props = info.as_dict().and_then(|d| d.get("properties")).and_then(Value::as_dict).unwrap();
    let facts = props.get("facts").and_then(Value::to_string_map).unwrap();
    assert_eq!(facts.get("p_t").map(String::as_str), Some("a{ss}"));
    assert_eq!(facts.get("p_access").map(String::as_str), Some("read"));

    service.stop().await;
}
