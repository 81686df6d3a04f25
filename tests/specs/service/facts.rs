// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GetFacts: collection on a worker, caching and change notification.

use std::sync::Arc;
use std::time::Duration;

use crate::prelude::*;

#[tokio::test]
async fn get_facts_collects_publishes_and_notifies_once() {
    let service = Service::start().await;
    let mut client = service.client().await;

    let facts = client.call(FACTS_PATH, FACTS_INTERFACE, "GetFacts", Vec::new()).await.unwrap();
    let facts = facts.to_string_map().unwrap();
    assert_eq!(facts.get("uname.machine").map(String::as_str), Some("x86_64"));
    assert_eq!(service.facts.calls(), 1);

    let Message::Signal { path, args, .. } = client.next_signal().await.unwrap() else {
        panic!("expected a signal");
    };
    assert_eq!(path, FACTS_PATH);
    let changed = args[1].as_dict().unwrap();
    assert!(changed.contains_key("facts"));
    assert_eq!(changed.get("lastUpdatedTime"), Some(&Value::UInt64(1_700_000_000)));
    assert_eq!(changed.get("cacheExpiryTime"), Some(&Value::UInt64(1_700_000_240)));

    let published = client.get(FACTS_PATH, FACTS_INTERFACE, "facts").await.unwrap();
    assert_eq!(published.to_string_map().unwrap(), facts);

    service.stop().await;
}

#[tokio::test]
async fn fresh_cache_is_served_without_collecting_or_notifying() {
    let service = Service::start().await;
    let mut client = service.client().await;

    client.call(FACTS_PATH, FACTS_INTERFACE, "GetFacts", Vec::new()).await.unwrap();
    client.next_signal().await.unwrap();

    service.clock.advance(Duration::from_secs(60));
    client.call(FACTS_PATH, FACTS_INTERFACE, "GetFacts", Vec::new()).await.unwrap();
    assert_eq!(service.facts.calls(), 1);
    assert!(tokio::time::timeout(Duration::from_millis(200), client.next_signal()).await.is_err());

    service.stop().await;
}

#[tokio::test]
async fn stale_cache_is_recollected() {
    let service = Service::start().await;
    let mut client = service.client().await;

    client.call(FACTS_PATH, FACTS_INTERFACE, "GetFacts", Vec::new()).await.unwrap();
    service.clock.advance(Duration::from_secs(600));
    client.call(FACTS_PATH, FACTS_INTERFACE, "GetFacts", Vec::new()).await.unwrap();
    assert_eq!(service.facts.calls(), 2);

    let updated = client.get(FACTS_PATH, FACTS_INTERFACE, "lastUpdatedTime").await.unwrap();
    assert_eq!(updated, Value::UInt64(1_700_000_600));

    service.stop().await;
}

#[tokio::test]
async fn user_fact_files_override_collected_facts() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    std::fs::create_dir_all(&config.facts_dir).unwrap();
    std::fs::write(config.facts_dir.join("site.facts"), r#"{"uname.machine": "ppc64le", "site.rack": "b7"}"#).unwrap();
    std::fs::write(config.facts_dir.join("broken.facts"), "{").unwrap();

    let fakes = Fakes::default();
    let clock = FakeClock::new();
    let mut deps = deps(&fakes, &clock);
    let merged = CompositeCollector::new().with(fakes.facts.clone()).with(CustomCollector::new(&config.facts_dir));
    deps.facts = Arc::new(merged);

    let server = Server::bind(&config, deps).unwrap();
    let handle = server.handle();
    let started = server.started();
    let notified = started.notified();
    let task = tokio::spawn(server.run());
    tokio::time::timeout(TIMEOUT, notified).await.unwrap();

    let mut client = Client::connect(&config.address()).await.unwrap().with_timeout(TIMEOUT);
    let facts = client.call(FACTS_PATH, FACTS_INTERFACE, "GetFacts", Vec::new()).await.unwrap();
    let facts = facts.to_string_map().unwrap();
    assert_eq!(facts["uname.machine"], "ppc64le");
    assert_eq!(facts["site.rack"], "b7");
    assert_eq!(facts["cpu.cpu(s)"], "4");

    handle.shutdown();
    tokio::time::timeout(TIMEOUT, task).await.unwrap().unwrap();
}
