// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bookkeeping for worker threads.
//!
//! One OS thread per dispatched task. A task counts as outstanding from the
//! moment it is spawned until the result consumer reports it done.

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, trace, warn};

use crate::clock::Clock;
use crate::mainloop::MainLoopHandle;
use crate::queue::IdleQueue;
use crate::task::{Callback, Callbacks, Task, TaskFailure, TaskFn};

/// A finished unit of work travelling through the result queue.
pub struct Completion<T, E> {
    pub task: String,
    pub callback: Option<Callback<T, E>>,
    pub value: Option<T>,
    pub error: Option<TaskFailure<E>>,
}

impl<T, E> Completion<T, E> {
    fn success(task: String, callbacks: Callbacks<T, E>, value: T) -> Self {
        Self { task, callback: callbacks.on_success, value: Some(value), error: None }
    }

    fn failure(task: String, callbacks: Callbacks<T, E>, failure: TaskFailure<E>) -> Self {
        Self { task, callback: callbacks.on_error, value: None, error: Some(failure) }
    }
}

impl<T, E> std::fmt::Debug for Completion<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("task", &self.task)
            .field("callback", &self.callback.is_some())
            .field("ok", &self.value.is_some())
            .finish()
    }
}

/// Shared between a worker and the deadline monitor; whoever takes the
/// callbacks first delivers the outcome.
type Settlement<T, E> = Arc<Mutex<Option<Callbacks<T, E>>>>;

struct WorkerRecord<T, E> {
    name: String,
    started: Instant,
    handle: Option<JoinHandle<()>>,
    settlement: Settlement<T, E>,
}

struct PoolState<T, E> {
    outstanding: usize,
    workers: Vec<WorkerRecord<T, E>>,
}

pub struct WorkerPool<T, E> {
    clock: Arc<dyn Clock>,
    max_workers: Option<usize>,
    task_timeout: Option<Duration>,
    state: Mutex<PoolState<T, E>>,
    drained: Condvar,
}

impl<T, E> WorkerPool<T, E>
where
    T: Send + 'static,
    E: Display + Send + 'static,
{
    pub fn new(clock: Arc<dyn Clock>, max_workers: Option<usize>, task_timeout: Option<Duration>) -> Self {
        Self {
            clock,
            max_workers: max_workers.map(|n| n.max(1)),
            task_timeout,
            state: Mutex::new(PoolState { outstanding: 0, workers: Vec::new() }),
            drained: Condvar::new(),
        }
    }

    /// Tasks dispatched and not yet marked done.
    pub fn outstanding(&self) -> usize {
        self.state.lock().outstanding
    }

    /// Whether another task may be dispatched now.
    ///
    /// A timed-out task stops being outstanding while its thread may still
    /// be running, so the cap counts unreaped threads as well.
    pub fn has_capacity(&self) -> bool {
        let Some(max) = self.max_workers else {
            return true;
        };
        self.reap();
        let state = self.state.lock();
        state.outstanding.max(state.workers.len()) < max
    }

    /// Start `task` on its own thread. The outcome is handed back through
    /// `results` on the coordinating thread.
    pub fn spawn(&self, task: Task<T, E>, results: &IdleQueue<Completion<T, E>>, handle: &MainLoopHandle) {
        let (name, func, callbacks) = task.into_parts();
        let settlement: Settlement<T, E> = Arc::new(Mutex::new(Some(callbacks)));

        let mut state = self.state.lock();
        state.outstanding += 1;

        let worker = {
            let name = name.clone();
            let settlement = Arc::clone(&settlement);
            let results = results.clone();
            let handle = handle.clone();
            move || run_task(name, func, settlement, results, handle)
        };
        let spawned = thread::Builder::new().name(thread_name(&name)).spawn(worker);

        match spawned {
            Ok(join) => {
                debug!(task = %name, outstanding = state.outstanding, "worker started");
                state.workers.push(WorkerRecord {
                    name,
                    started: self.clock.now(),
                    handle: Some(join),
                    settlement,
                });
            }
            Err(e) => {
                drop(state);
                error!(task = %name, error = %e, "failed to start worker thread");
                if let Some(callbacks) = settlement.lock().take() {
                    results.put(Completion::failure(name, callbacks, TaskFailure::Spawn(e.to_string())));
                }
            }
        }
    }

    /// Called by the result consumer once per completion.
    pub fn task_done(&self) {
        let mut state = self.state.lock();
        if state.outstanding == 0 {
            warn!("task_done called with no outstanding work");
            return;
        }
        state.outstanding -= 1;
        if state.outstanding == 0 {
            self.drained.notify_all();
        }
    }

    /// Block until no task is outstanding.
    ///
    /// Results are delivered by the coordinating thread, so calling this
    /// from that thread would never return.
    pub fn join(&self) {
        let mut state = self.state.lock();
        while state.outstanding > 0 {
            self.drained.wait(&mut state);
        }
    }

    /// Like [`join`](Self::join) but gives up after `timeout`. Returns
    /// whether the pool drained.
    pub fn join_timeout(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        let _ = self.drained.wait_while_for(&mut state, |state| state.outstanding > 0, timeout);
        state.outstanding == 0
    }

    /// Forget threads that have exited.
    pub fn reap(&self) {
        let finished: Vec<JoinHandle<()>> = {
            let mut state = self.state.lock();
            let mut finished = Vec::new();
            state.workers.retain_mut(|worker| {
                if !worker.handle.as_ref().is_some_and(JoinHandle::is_finished) {
                    return true;
                }
                trace!(task = %worker.name, "reaping worker");
                finished.extend(worker.handle.take());
                false
            });
            finished
        };
        for handle in finished {
            if handle.join().is_err() {
                warn!("worker thread panicked outside its task");
            }
        }
    }

    /// Fail every running task whose deadline has passed. Must be called on
    /// the coordinating thread; the failure goes straight onto `results`.
    pub fn check_deadlines(&self, results: &IdleQueue<Completion<T, E>>) {
        let Some(timeout) = self.task_timeout else {
            return;
        };
        let now = self.clock.now();
        let state = self.state.lock();
        for worker in &state.workers {
            if now.saturating_duration_since(worker.started) < timeout {
                continue;
            }
            if let Some(callbacks) = worker.settlement.lock().take() {
                warn!(task = %worker.name, ?timeout, "task deadline elapsed");
                let failure = TaskFailure::TimedOut { after: timeout };
                results.put(Completion::failure(worker.name.clone(), callbacks, failure));
            }
        }
    }
}

fn run_task<T, E>(
    name: String,
    func: TaskFn<T, E>,
    settlement: Settlement<T, E>,
    results: IdleQueue<Completion<T, E>>,
    handle: MainLoopHandle,
) where
    T: Send + 'static,
    E: Display + Send + 'static,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(func));

    let Some(callbacks) = settlement.lock().take() else {
        debug!(task = %name, "discarding result of timed-out task");
        return;
    };
    let completion = match outcome {
        Ok(Ok(value)) => Completion::success(name, callbacks, value),
        Ok(Err(e)) => {
            warn!(task = %name, error = %e, "task failed");
            Completion::failure(name, callbacks, TaskFailure::Failed(e))
        }
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            error!(task = %name, panic = %msg, "task panicked");
            Completion::failure(name, callbacks, TaskFailure::Panicked(msg))
        }
    };
    results.put_idle(&handle, completion);
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn thread_name(task: &str) -> String {
    task.chars().filter(|c| *c != '\0').collect()
}

#[cfg(test)]
#[path = "worker_pool_tests.rs"]
mod tests;
