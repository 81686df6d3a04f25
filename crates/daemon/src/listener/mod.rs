// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket front-end of the service.
//!
//! The accept loop runs in a spawned task and hands each connection its
//! own reader/writer pair. Calls are scheduled onto the main loop, which
//! owns every exported object; replies and signals flow back through the
//! connection's write loop.

mod connection;
mod private;

pub use private::PrivateServers;

use std::path::Path;
use std::sync::Arc;

use subman_core::{Clock, MainLoop, MainLoopHandle, SystemClock, Tasks};
use subman_wire::names::{CONFIG_PATH, FACTS_PATH, MAIN_PATH};
use subman_wire::Value;
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::adapters::{
    CompositeCollector, CustomCollector, EntitlementServer, FactsCollector, FileIdentityStore, HostCollector,
    HttpEntitlementServer, IdentityStore,
};
use crate::bus::{object_ref, Dispatcher, MethodError, ObjectTable, SignalHub};
use crate::lifecycle::{Config, LifecycleError, NameClaim};
use crate::objects::{ConfigObject, FactsObject, MainObject, RegisterDeps};
use crate::storage::{ConfigStore, FactsCache};

use connection::{log_connection_error, serve_connection};

/// External collaborators of the service.
#[derive(Clone)]
pub struct ServerDeps {
    pub entitlement: Arc<dyn EntitlementServer>,
    pub identity: Arc<dyn IdentityStore>,
    pub facts: Arc<dyn FactsCollector>,
    pub clock: Arc<dyn Clock>,
}

impl ServerDeps {
    /// Real HTTP server, on-disk identity, and host facts overridden by the
    /// user's `*.facts` files.
    pub fn production(config: &Config) -> Self {
        Self {
            entitlement: Arc::new(HttpEntitlementServer::new()),
            identity: Arc::new(FileIdentityStore::new(&config.identity_dir)),
            facts: Arc::new(
                CompositeCollector::new().with(HostCollector).with(CustomCollector::new(&config.facts_dir)),
            ),
            clock: Arc::new(SystemClock),
        }
    }

    fn register(&self) -> RegisterDeps {
        RegisterDeps {
            entitlement: Arc::clone(&self.entitlement),
            identity: Arc::clone(&self.identity),
            facts: Arc::clone(&self.facts),
        }
    }
}

/// Stops a running [`Server`] from any thread.
#[derive(Clone)]
pub struct ServerHandle {
    main_loop: MainLoopHandle,
}

impl ServerHandle {
    pub fn shutdown(&self) {
        info!("shutdown requested");
        self.main_loop.quit();
    }
}

/// The public service: name claim, object table and main loop.
pub struct Server {
    claim: NameClaim,
    listener: UnixListener,
    main_loop: MainLoop,
    dispatcher: Dispatcher,
    signals: SignalHub,
    cancel: CancellationToken,
    address: String,
    started: Arc<Notify>,
    timeout: std::time::Duration,
}

impl Server {
    /// Claim the bus name and export the Main, Config and Facts objects.
    /// Must be called from within the runtime.
    pub fn bind(config: &Config, deps: ServerDeps) -> Result<Self, LifecycleError> {
        let store = ConfigStore::load(&config.config_path)?;
        let (claim, listener) = NameClaim::acquire(config)?;

        let main_loop = MainLoop::new();
        let handle = main_loop.handle();
        let tasks: Tasks<Value, MethodError> = Tasks::with_clock(handle.clone(), config.tasks, Arc::clone(&deps.clock));
        let table = ObjectTable::new();
        let signals = SignalHub::new();
        let cancel = CancellationToken::new();

        let private = PrivateServers::new(
            &config.private_dir,
            handle.clone(),
            tasks.clone(),
            deps.register(),
            cancel.clone(),
            config.ipc_timeout,
        );
        table.register(object_ref(MainObject::new(private, signals.properties_hook(MAIN_PATH))));
        table.register(object_ref(ConfigObject::new(store, signals.properties_hook(CONFIG_PATH))));
        table.register(object_ref(FactsObject::new(
            Arc::clone(&deps.facts),
            FactsCache::new(&config.facts_cache_path, config.facts_cache_ttl),
            Arc::clone(&deps.clock),
            signals.properties_hook(FACTS_PATH),
        )));
        info!(objects = ?table.paths(), "objects exported");

        Ok(Self {
            address: config.address(),
            dispatcher: Dispatcher::new(handle, table, tasks),
            claim,
            listener,
            main_loop,
            signals,
            cancel,
            started: Arc::new(Notify::new()),
            timeout: config.ipc_timeout,
        })
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle { main_loop: self.main_loop.handle() }
    }

    pub fn socket_path(&self) -> &Path {
        self.claim.socket_path()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Notified once the main loop has started iterating.
    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    /// Serve until [`ServerHandle::shutdown`], then unexport every object
    /// and release the name.
    pub async fn run(self) {
        let Self { claim, listener, mut main_loop, dispatcher, signals, cancel, address, started, timeout } = self;

        let accept = tokio::spawn(accept_loop(listener, dispatcher.clone(), signals, cancel.clone(), timeout));
        let handle = main_loop.handle();
        handle.idle_add(move || started.notify_one());
        info!(%address, "serving");

        main_loop.run().await;

        cancel.cancel();
        if let Err(e) = accept.await {
            error!("accept loop failed: {}", e);
        }
        let removed = dispatcher.table().clear();
        info!(objects = removed, "objects unexported");
        claim.release();
    }
}

async fn accept_loop(
    listener: UnixListener,
    dispatcher: Dispatcher,
    signals: SignalHub,
    cancel: CancellationToken,
    timeout: std::time::Duration,
) {
    loop {
        let stream = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => stream,
                Err(e) => {
                    error!("Accept error: {}", e);
                    continue;
                }
            },
        };
        let (reader, writer) = stream.into_split();
        let dispatcher = dispatcher.clone();
        let events = signals.subscribe();
        let cancel = cancel.child_token();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(reader, writer, dispatcher, events, cancel, timeout).await {
                log_connection_error(e);
            }
        });
    }
}
