// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness: a service bound in a temp state directory with
//! in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;

pub use subman_core::FakeClock;
pub use subman_daemon::adapters::{
    CompositeCollector, CustomCollector, FakeEntitlementServer, MemoryIdentityStore, StaticFactsCollector,
};
pub use subman_daemon::{CallError, Client, Config, LifecycleError, Server, ServerDeps, ServerHandle};
pub use subman_wire::names::*;
pub use subman_wire::{FaultKind, Message, Value};
use tempfile::TempDir;
use tokio::task::JoinHandle;

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub struct Service {
    pub dir: TempDir,
    pub config: Config,
    pub entitlement: FakeEntitlementServer,
    pub identity: MemoryIdentityStore,
    pub facts: StaticFactsCollector,
    pub clock: FakeClock,
    handle: ServerHandle,
    task: JoinHandle<()>,
}

pub struct Fakes {
    pub entitlement: FakeEntitlementServer,
    pub identity: MemoryIdentityStore,
    pub facts: StaticFactsCollector,
}

impl Default for Fakes {
    fn default() -> Self {
        Self {
            entitlement: FakeEntitlementServer::new(),
            identity: MemoryIdentityStore::new(),
            facts: StaticFactsCollector::new([("uname.machine", "x86_64"), ("cpu.cpu(s)", "4")]),
        }
    }
}

pub fn config_in(dir: &TempDir) -> Config {
    let mut config = Config::for_state_dir(dir.path());
    config.bus_dir = dir.path().join("bus");
    config.socket_path = config.bus_dir.join(format!("{BUS_NAME}.sock"));
    config.lock_path = config.bus_dir.join(format!("{BUS_NAME}.lock"));
    config.config_path = dir.path().join("rhsm.toml");
    config.ipc_timeout = TIMEOUT;
    config.facts_cache_ttl = Duration::from_secs(240);
    config
}

pub fn deps(fakes: &Fakes, clock: &FakeClock) -> ServerDeps {
    ServerDeps {
        entitlement: Arc::new(fakes.entitlement.clone()),
        identity: Arc::new(fakes.identity.clone()),
        facts: Arc::new(fakes.facts.clone()),
        clock: Arc::new(clock.clone()),
    }
}

impl Service {
    pub async fn start() -> Self {
        Self::start_with(Fakes::default()).await
    }

    pub async fn start_with(fakes: Fakes) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let clock = FakeClock::new();
        let server = Server::bind(&config, deps(&fakes, &clock)).unwrap();
        let handle = server.handle();
        let started = server.started();
        let notified = started.notified();
        let task = tokio::spawn(server.run());
        tokio::time::timeout(TIMEOUT, notified).await.expect("service did not start");

        Self {
            dir,
            config,
            entitlement: fakes.entitlement,
            identity: fakes.identity,
            facts: fakes.facts,
            clock,
            handle,
            task,
        }
    }

    pub async fn client(&self) -> Client {
        Client::connect(&self.config.address()).await.unwrap().with_timeout(TIMEOUT)
    }

    /// Shut down and wait for the server task. Returns the state dir so
    /// callers can inspect it afterwards.
    pub async fn stop(self) -> TempDir {
        self.handle.shutdown();
        tokio::time::timeout(TIMEOUT, self.task).await.expect("service did not stop").unwrap();
        self.dir
    }
}

/// Kind of the fault a failed call was answered with.
pub fn fault_kind<T: std::fmt::Debug>(result: Result<T, CallError>) -> FaultKind {
    match result {
        Err(CallError::Fault(fault)) => fault.kind,
        other => panic!("expected a fault, got {other:?}"),
    }
}
