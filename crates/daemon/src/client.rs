// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal bus client for the public and private endpoints.

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::time::Duration;

use subman_wire::names::{INTROSPECTABLE_INTERFACE, PROPERTIES_INTERFACE};
use subman_wire::{self as wire, Fault, Message, ProtocolError, Value};
use thiserror::Error;
use tokio::net::UnixStream;
use tracing::debug;

use crate::env::ipc_timeout;

#[derive(Debug, Error)]
pub enum CallError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{}: {}", .0.name(), .0.message)]
    Fault(Fault),

    #[error("Unexpected reply: {0:?}")]
    UnexpectedReply(Box<Message>),
}

impl CallError {
    /// The service fault, if the call was answered with one.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            CallError::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

/// One connection to a bus endpoint. Calls are sequential; signals that
/// arrive while waiting for a reply are buffered for [`next_signal`](Self::next_signal).
pub struct Client {
    stream: UnixStream,
    serial: u64,
    timeout: Duration,
    pending_signals: VecDeque<Message>,
}

impl Client {
    /// Connect to `unix:path=<socket>` or a bare socket path.
    pub async fn connect(address: &str) -> Result<Self, CallError> {
        let path = PathBuf::from(address.strip_prefix("unix:path=").unwrap_or(address));
        let stream = UnixStream::connect(&path).await.map_err(ProtocolError::from)?;
        Ok(Self { stream, serial: 0, timeout: ipc_timeout(), pending_signals: VecDeque::new() })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn call(
        &mut self,
        path: &str,
        interface: &str,
        member: &str,
        args: Vec<Value>,
    ) -> Result<Value, CallError> {
        self.serial += 1;
        let serial = self.serial;
        let msg = Message::method_call(serial, path, interface, member, args);
        wire::send(&mut self.stream, &msg, self.timeout).await?;

        loop {
            let msg = wire::receive_timeout(&mut self.stream, self.timeout).await?;
            match msg {
                Message::Signal { .. } => self.pending_signals.push_back(msg),
                Message::MethodReturn { reply_serial, value } if reply_serial == serial => return Ok(value),
                Message::Error { reply_serial, fault } if reply_serial == serial => {
                    return Err(CallError::Fault(fault))
                }
                // Late answer to an earlier call that already timed out.
                Message::MethodReturn { reply_serial, .. } | Message::Error { reply_serial, .. }
                    if reply_serial < serial =>
                {
                    debug!(reply_serial, serial, "discarding stale reply");
                }
                other => return Err(CallError::UnexpectedReply(Box::new(other))),
            }
        }
    }

    pub async fn get(&mut self, path: &str, interface: &str, name: &str) -> Result<Value, CallError> {
        self.call(path, PROPERTIES_INTERFACE, "Get", vec![interface.into(), name.into()]).await
    }

    pub async fn get_all(&mut self, path: &str, interface: &str) -> Result<BTreeMap<String, Value>, CallError> {
        let value = self.call(path, PROPERTIES_INTERFACE, "GetAll", vec![interface.into()]).await?;
        match value {
            Value::Dict(map) => Ok(map),
            other => Err(CallError::UnexpectedReply(Box::new(Message::reply(self.serial, Ok(other))))),
        }
    }

    pub async fn set(&mut self, path: &str, interface: &str, name: &str, value: Value) -> Result<(), CallError> {
        self.call(path, PROPERTIES_INTERFACE, "Set", vec![interface.into(), name.into(), value]).await?;
        Ok(())
    }

    pub async fn introspect(&mut self, path: &str) -> Result<Value, CallError> {
        self.call(path, INTROSPECTABLE_INTERFACE, "Introspect", Vec::new()).await
    }

    /// Next signal, buffered or read from the socket.
    pub async fn next_signal(&mut self) -> Result<Message, CallError> {
        if let Some(signal) = self.pending_signals.pop_front() {
            return Ok(signal);
        }
        loop {
            let msg = wire::receive_timeout(&mut self.stream, self.timeout).await?;
            if msg.is_signal() {
                return Ok(msg);
            }
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
