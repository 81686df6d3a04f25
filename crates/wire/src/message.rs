// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use crate::fault::Fault;
use crate::value::Value;

/// One framed message on a bus connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Invoke `member` on the object at `path`.
    MethodCall {
        serial: u64,
        path: String,
        interface: String,
        member: String,
        #[serde(default)]
        args: Vec<Value>,
    },

    /// Successful reply to the call with `reply_serial`.
    MethodReturn { reply_serial: u64, value: Value },

    /// Failed reply to the call with `reply_serial`.
    Error { reply_serial: u64, fault: Fault },

    /// Unsolicited notification, e.g. `PropertiesChanged`.
    Signal {
        path: String,
        interface: String,
        member: String,
        #[serde(default)]
        args: Vec<Value>,
    },
}

impl Message {
    pub fn method_call(
        serial: u64,
        path: impl Into<String>,
        interface: impl Into<String>,
        member: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        Message::MethodCall {
            serial,
            path: path.into(),
            interface: interface.into(),
            member: member.into(),
            args,
        }
    }

    /// Reply for the call with `serial`.
    pub fn reply(serial: u64, result: Result<Value, Fault>) -> Self {
        match result {
            Ok(value) => Message::MethodReturn { reply_serial: serial, value },
            Err(fault) => Message::Error { reply_serial: serial, fault },
        }
    }

    /// Serial this message answers, if it is a reply.
    pub fn reply_serial(&self) -> Option<u64> {
        match self {
            Message::MethodReturn { reply_serial, .. } | Message::Error { reply_serial, .. } => Some(*reply_serial),
            _ => None,
        }
    }

    pub fn is_signal(&self) -> bool {
        matches!(self, Message::Signal { .. })
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
