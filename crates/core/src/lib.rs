// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! subman-core: task engine for the subscription management service
//!
//! Blocking work is handed to worker threads through a sentinel-aware
//! queue; results come back to a single coordinating thread through a
//! second queue and run their continuations there.

pub mod macros;

pub mod clock;
pub mod consumer;
pub mod mainloop;
pub mod queue;
pub mod task;
pub mod tasks;
pub mod worker_pool;

#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
pub use clock::{Clock, SystemClock};
pub use consumer::{ItemProcessor, QueueConsumer, ResultQueueConsumer, TaskQueueConsumer};
pub use mainloop::{MainLoop, MainLoopHandle, SourceId, SourceStatus};
pub use queue::{Dequeued, IdleQueue, QueueError, Sentinel};
pub use task::{Callback, Task, TaskFailure};
pub use tasks::{Tasks, TasksConfig};
pub use worker_pool::{Completion, WorkerPool};
