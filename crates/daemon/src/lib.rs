// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription management daemon library
//!
//! Exports the Main, Config and Facts objects on the public bus socket and
//! hands out private registration endpoints on request.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod bus;
pub mod client;
pub mod env;
pub mod lifecycle;
pub mod listener;
pub mod objects;
pub mod storage;

pub use client::{CallError, Client};
pub use lifecycle::{Config, LifecycleError};
pub use listener::{Server, ServerDeps, ServerHandle};
