// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of signals to every connection of a server.

use std::sync::Arc;

use subman_wire::names::{PROPERTIES_CHANGED, PROPERTIES_INTERFACE};
use subman_wire::Message;
use tokio::sync::broadcast;
use tracing::trace;

use super::properties::ChangeHook;

const SIGNAL_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub struct SignalHub {
    tx: broadcast::Sender<Message>,
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_BUFFER);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.tx.subscribe()
    }

    /// Send to every current subscriber. Dropped when nobody listens.
    pub fn emit(&self, signal: Message) {
        if self.tx.send(signal).is_err() {
            trace!("signal dropped, no subscribers");
        }
    }

    /// Hook turning property changes of the object at `path` into
    /// `PropertiesChanged` signals.
    pub fn properties_hook(&self, path: &str) -> ChangeHook {
        let hub = self.clone();
        let path = path.to_string();
        Arc::new(move |change| {
            hub.emit(Message::Signal {
                path: path.clone(),
                interface: PROPERTIES_INTERFACE.to_string(),
                member: PROPERTIES_CHANGED.to_string(),
                args: change.to_args(),
            });
        })
    }
}
