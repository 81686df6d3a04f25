// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Name ownership, shutdown and restart.

use crate::prelude::*;

#[tokio::test]
async fn second_instance_cannot_take_the_name() {
    let service = Service::start().await;

    let clock = FakeClock::new();
    let result = Server::bind(&service.config, deps(&Fakes::default(), &clock));
    assert!(matches!(result, Err(LifecycleError::NameTaken(name)) if name == BUS_NAME));

    // The running instance is untouched.
    let mut client = service.client().await;
    client.get(FACTS_PATH, FACTS_INTERFACE, "version").await.unwrap();

    service.stop().await;
}

#[tokio::test]
async fn shutdown_releases_the_name_and_removes_the_socket() {
    let service = Service::start().await;
    let config = service.config.clone();
    let fakes = Fakes::default();
    let clock = service.clock.clone();
    assert!(config.socket_path.exists());

    let dir = service.stop().await;

    assert!(!config.socket_path.exists());
    assert!(!config.lock_path.exists());
    assert!(dir.path().exists());

    let server = Server::bind(&config, deps(&fakes, &clock)).unwrap();
    drop(server);
}

#[tokio::test]
async fn stale_socket_from_a_crash_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    std::fs::create_dir_all(&config.bus_dir).unwrap();
    std::fs::write(&config.socket_path, b"").unwrap();

    let clock = FakeClock::new();
    let server = Server::bind(&config, deps(&Fakes::default(), &clock)).unwrap();
    let handle = server.handle();
    let task = tokio::spawn(server.run());

    let mut client = Client::connect(&config.address()).await.unwrap();
    client.get(FACTS_PATH, FACTS_INTERFACE, "version").await.unwrap();

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn connections_are_dropped_on_shutdown() {
    let service = Service::start().await;
    let mut client = service.client().await;
    client.get(MAIN_PATH, MAIN_INTERFACE, "nothing").await.ok();

    service.stop().await;
    let result = client.get(FACTS_PATH, FACTS_INTERFACE, "version").await;
    assert!(matches!(result, Err(CallError::Protocol(_))));
}
