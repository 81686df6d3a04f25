// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thread-safe FIFO queue with in-band start/stop sentinels.
//!
//! Sentinels travel through the same FIFO as data items, so a `Stop` put
//! after pending items is only observed once those items have been taken.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tracing::warn;

use crate::mainloop::MainLoopHandle;

/// Out-of-band control message carried in a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    Start,
    Stop,
}

crate::named_variants! {
    Sentinel {
        Start => "start",
        Stop => "stop",
    }
}

impl Sentinel {
    /// Whether a consumer observing this sentinel should keep consuming.
    pub fn consuming_state(self) -> bool {
        matches!(self, Sentinel::Start)
    }
}

/// Result of a [`IdleQueue::get`].
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeued<T> {
    Item(T),
    Sentinel(Sentinel),
    Empty,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("task_done() called more times than there were items")]
    TaskDoneUnderflow,
}

enum Slot<T> {
    Item(T),
    Sentinel(Sentinel),
}

struct State<T> {
    slots: VecDeque<Slot<T>>,
    unfinished: usize,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    all_done: Condvar,
}

/// FIFO queue whose producers can defer a put onto the coordinating thread.
pub struct IdleQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for IdleQueue<T> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T> Default for IdleQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IdleQueue<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State { slots: VecDeque::new(), unfinished: 0 }),
                not_empty: Condvar::new(),
                all_done: Condvar::new(),
            }),
        }
    }

    /// Append a data item.
    pub fn put(&self, item: T) {
        self.push(Slot::Item(item));
    }

    /// Append a control sentinel.
    pub fn put_sentinel(&self, sentinel: Sentinel) {
        self.push(Slot::Sentinel(sentinel));
    }

    fn push(&self, slot: Slot<T>) {
        let mut state = self.shared.state.lock();
        state.slots.push_back(slot);
        state.unfinished += 1;
        drop(state);
        self.shared.not_empty.notify_one();
    }

    /// Remove the head of the queue.
    ///
    /// With `block`, waits until something is available; otherwise returns
    /// [`Dequeued::Empty`] immediately.
    pub fn get(&self, block: bool) -> Dequeued<T> {
        let mut state = self.shared.state.lock();
        if block {
            while state.slots.is_empty() {
                self.shared.not_empty.wait(&mut state);
            }
        }
        Self::pop(&mut state)
    }

    /// Like a blocking [`get`](Self::get) that gives up after `timeout`.
    pub fn get_timeout(&self, timeout: Duration) -> Dequeued<T> {
        let mut state = self.shared.state.lock();
        if state.slots.is_empty() {
            let _ = self.shared.not_empty.wait_while_for(
                &mut state,
                |state| state.slots.is_empty(),
                timeout,
            );
        }
        Self::pop(&mut state)
    }

    fn pop(state: &mut State<T>) -> Dequeued<T> {
        match state.slots.pop_front() {
            Some(Slot::Item(item)) => Dequeued::Item(item),
            Some(Slot::Sentinel(sentinel)) => Dequeued::Sentinel(sentinel),
            None => Dequeued::Empty,
        }
    }

    /// Mark one previously taken entry as fully processed.
    pub fn task_done(&self) -> Result<(), QueueError> {
        let mut state = self.shared.state.lock();
        if state.unfinished == 0 {
            return Err(QueueError::TaskDoneUnderflow);
        }
        state.unfinished -= 1;
        if state.unfinished == 0 {
            self.shared.all_done.notify_all();
        }
        Ok(())
    }

    /// Block until every entry ever put has been marked done.
    pub fn join(&self) {
        let mut state = self.shared.state.lock();
        while state.unfinished > 0 {
            self.shared.all_done.wait(&mut state);
        }
    }

    /// Entries currently queued.
    pub fn len(&self) -> usize {
        self.shared.state.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries put but not yet marked done.
    pub fn unfinished(&self) -> usize {
        self.shared.state.lock().unfinished
    }
}

impl<T: Send + 'static> IdleQueue<T> {
    /// Defer the put until the coordinating thread next runs its pending
    /// calls. This is the only way worker threads hand data back.
    pub fn put_idle(&self, handle: &MainLoopHandle, item: T) {
        self.defer(handle, Slot::Item(item));
    }

    /// Defer a sentinel put the same way as [`put_idle`](Self::put_idle).
    pub fn put_sentinel_idle(&self, handle: &MainLoopHandle, sentinel: Sentinel) {
        self.defer(handle, Slot::Sentinel(sentinel));
    }

    fn defer(&self, handle: &MainLoopHandle, slot: Slot<T>) {
        let queue = self.clone();
        let slot = Arc::new(Mutex::new(Some(slot)));
        let deferred = Arc::clone(&slot);
        let scheduled = handle.idle_add(move || {
            if let Some(slot) = deferred.lock().take() {
                queue.push(slot);
            }
        });
        if !scheduled {
            warn!("main loop gone; putting queue entry directly");
            if let Some(slot) = slot.lock().take() {
                self.push(slot);
            }
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
