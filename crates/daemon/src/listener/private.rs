// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Private registration endpoints.
//!
//! Each endpoint listens on its own socket under the private directory,
//! never on the shared bus. Every connection gets a fresh registration
//! object that lives exactly as long as that connection; the endpoint
//! shuts itself down when its last connection closes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use subman_core::{MainLoopHandle, Tasks};
use subman_wire::names::REGISTER_PATH;
use subman_wire::Value;
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::connection::{log_connection_error, serve_connection};
use crate::bus::{object_ref, Dispatcher, MethodError, ObjectTable, SignalHub};
use crate::lifecycle::{address_for, LifecycleError};
use crate::objects::{RegisterDeps, RegisterObject};

/// Starts private registration endpoints on demand.
#[derive(Clone)]
pub struct PrivateServers {
    dir: PathBuf,
    handle: MainLoopHandle,
    tasks: Tasks<Value, MethodError>,
    deps: RegisterDeps,
    cancel: CancellationToken,
    timeout: Duration,
}

impl PrivateServers {
    pub fn new(
        dir: impl Into<PathBuf>,
        handle: MainLoopHandle,
        tasks: Tasks<Value, MethodError>,
        deps: RegisterDeps,
        cancel: CancellationToken,
        timeout: Duration,
    ) -> Self {
        Self { dir: dir.into(), handle, tasks, deps, cancel, timeout }
    }

    /// Bind a new endpoint and return its address. Must be called from
    /// within the runtime.
    pub fn start(&self) -> Result<String, LifecycleError> {
        create_private_dir(&self.dir)?;
        let socket = self.dir.join(format!("{}.sock", Uuid::new_v4()));
        let listener = UnixListener::bind(&socket).map_err(|e| LifecycleError::BindFailed(socket.clone(), e))?;
        let address = address_for(&socket);
        debug!(%address, "private endpoint listening");
        tokio::spawn(self.clone().accept_loop(listener, socket));
        Ok(address)
    }

    async fn accept_loop(self, listener: UnixListener, socket: PathBuf) {
        let cancel = self.cancel.child_token();
        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        connections.spawn(self.clone().serve(stream, cancel.child_token()));
                    }
                    Err(e) => error!("Private accept error: {}", e),
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {
                    if connections.is_empty() {
                        info!(socket = %socket.display(), "last private connection closed");
                        break;
                    }
                }
            }
        }
        cancel.cancel();
        while connections.join_next().await.is_some() {}
        if let Err(e) = std::fs::remove_file(&socket) {
            warn!(socket = %socket.display(), error = %e, "failed to remove private socket");
        }
    }

    async fn serve(self, stream: UnixStream, cancel: CancellationToken) {
        let table = ObjectTable::new();
        let signals = SignalHub::new();
        table.register(object_ref(RegisterObject::new(self.deps.clone(), signals.properties_hook(REGISTER_PATH))));
        let dispatcher = Dispatcher::new(self.handle.clone(), table.clone(), self.tasks.clone());

        let (reader, writer) = stream.into_split();
        if let Err(e) = serve_connection(reader, writer, dispatcher, signals.subscribe(), cancel, self.timeout).await {
            log_connection_error(e);
        }
        table.clear();
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
    std::fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)?;
    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}
