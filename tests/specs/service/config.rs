// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Config object over the bus.

use crate::prelude::*;

#[tokio::test]
async fn dotted_names_read_single_values_and_sections_read_dicts() {
    let service = Service::start().await;
    let mut client = service.client().await;

    let port = client.get(CONFIG_PATH, CONFIG_INTERFACE, "server.port").await.unwrap();
    assert_eq!(port, Value::from("443"));

    let server = client.get(CONFIG_PATH, CONFIG_INTERFACE, "server").await.unwrap();
    let server = server.to_string_map().unwrap();
    assert_eq!(server.get("hostname").map(String::as_str), Some("subscription.rhsm.redhat.com"));

    let missing = client.get(CONFIG_PATH, CONFIG_INTERFACE, "server.nope").await;
    assert_eq!(fault_kind(missing), FaultKind::UnknownProperty);

    service.stop().await;
}

#[tokio::test]
async fn set_persists_and_notifies_with_the_whole_section() {
    let service = Service::start().await;
    let mut client = service.client().await;
    let mut watcher = service.client().await;
    // A completed round trip means the watcher is subscribed.
    watcher.introspect(CONFIG_PATH).await.unwrap();

    client.set(CONFIG_PATH, CONFIG_INTERFACE, "server.hostname", Value::from("candlepin.example.com")).await.unwrap();

    let hostname = client.get(CONFIG_PATH, CONFIG_INTERFACE, "server.hostname").await.unwrap();
    assert_eq!(hostname, Value::from("candlepin.example.com"));

    let Message::Signal { path, member, args, .. } = watcher.next_signal().await.unwrap() else {
        panic!("expected a signal");
    };
    assert_eq!(path, CONFIG_PATH);
    assert_eq!(member, PROPERTIES_CHANGED);
    assert_eq!(args[0], Value::from(CONFIG_INTERFACE));
    let changed = args[1].as_dict().unwrap();
    let server = changed.get("server").and_then(Value::to_string_map).unwrap();
    assert_eq!(server.get("hostname").map(String::as_str), Some("candlepin.example.com"));

    let on_disk = std::fs::read_to_string(&service.config.config_path).unwrap();
    assert!(on_disk.contains("candlepin.example.com"));

    service.stop().await;
}

#[tokio::test]
async fn whole_sections_cannot_be_set() {
    let service = Service::start().await;
    let mut client = service.client().await;

    let result = client.set(CONFIG_PATH, CONFIG_INTERFACE, "server", Value::from("x")).await;
    assert_eq!(fault_kind(result), FaultKind::Failed);

    let result = client.set(CONFIG_PATH, CONFIG_INTERFACE, "nosuch.key", Value::from("x")).await;
    assert_eq!(fault_kind(result), FaultKind::UnknownProperty);

    service.stop().await;
}
