// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for the subscription management bus.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod fault;
mod message;
pub mod names;
mod value;
mod wire;

pub use fault::{service_error_name, Fault, FaultKind};
pub use message::Message;
pub use value::Value;
pub use wire::{decode, encode, read_message, receive, receive_timeout, send, write_message, ProtocolError, MAX_MESSAGE_SIZE};
