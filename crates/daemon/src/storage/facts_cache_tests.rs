// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn facts() -> BTreeMap<String, String> {
    BTreeMap::from([("uname.machine".to_string(), "x86_64".to_string())])
}

#[test]
fn stored_facts_are_fresh_until_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FactsCache::new(dir.path().join("facts.json"), Duration::from_secs(240));

    let stored = cache.store(facts(), 1_000);
    assert_eq!(stored.expires_at, 1_240);

    assert_eq!(cache.load_fresh(1_000), Some(stored.clone()));
    assert_eq!(cache.load_fresh(1_239), Some(stored));
    assert_eq!(cache.load_fresh(1_240), None);
}

#[test]
fn missing_or_corrupt_cache_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FactsCache::new(dir.path().join("facts.json"), Duration::from_secs(240));
    assert_eq!(cache.load_fresh(0), None);

    std::fs::write(cache.path(), b"not json").unwrap();
    assert_eq!(cache.load_fresh(0), None);
}

#[test]
fn unwritable_location_still_returns_record() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"").unwrap();
    let cache = FactsCache::new(blocker.join("facts.json"), Duration::from_secs(10));
    let stored = cache.store(facts(), 5);
    assert_eq!(stored.collected_at, 5);
    assert_eq!(cache.load_fresh(5), None);
}
