// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
    ConfigStore::load(dir.path().join("rhsm.toml")).unwrap()
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    assert_eq!(store.get("server", "hostname").unwrap(), "subscription.rhsm.redhat.com");
    assert_eq!(store.get("rhsmcertd", "certCheckInterval").unwrap(), "240");
    assert!(store.has_section("logging"));
}

#[test]
fn file_values_overlay_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("rhsm.toml"),
        "[server]\nhostname = \"candlepin.example.com\"\nport = 8443\n\n[custom]\nflag = true\n",
    )
    .unwrap();
    let store = store_in(&dir);
    assert_eq!(store.get("server", "hostname").unwrap(), "candlepin.example.com");
    assert_eq!(store.get("server", "port").unwrap(), "8443");
    assert_eq!(store.get("server", "prefix").unwrap(), "/subscription");
    assert_eq!(store.get("custom", "flag").unwrap(), "true");
}

#[test]
fn set_then_persist_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_in(&dir);
    store.set("server", "hostname", "new.example.com").unwrap();
    store.set("server", "extra", "x").unwrap();
    store.persist().unwrap();

    let reloaded = store_in(&dir);
    assert_eq!(reloaded.get("server", "hostname").unwrap(), "new.example.com");
    assert_eq!(reloaded.get("server", "extra").unwrap(), "x");
    assert!(!dir.path().join("rhsm.toml.tmp").exists());
}

#[test]
fn unknown_section_and_key_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_in(&dir);
    assert!(matches!(store.set("nope", "k", "v"), Err(ConfigError::UnknownSection(_))));
    assert!(matches!(store.section("nope"), Err(ConfigError::UnknownSection(_))));
    assert!(matches!(store.get("server", "nope"), Err(ConfigError::UnknownKey { .. })));
}

#[test]
fn invalid_toml_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("rhsm.toml"), "[server\n").unwrap();
    assert!(matches!(ConfigStore::load(dir.path().join("rhsm.toml")), Err(ConfigError::Parse(_))));
}
