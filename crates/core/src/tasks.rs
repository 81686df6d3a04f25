// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task engine façade.
//!
//! Producers on any thread call [`Tasks::add`]. Work runs on worker
//! threads and every continuation runs on the coordinating thread that
//! drives the [`MainLoop`](crate::mainloop::MainLoop).

use std::fmt::Display;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::consumer::{ResultDispatcher, ResultQueueConsumer, TaskDispatcher, TaskQueueConsumer};
use crate::mainloop::{MainLoopHandle, SourceId, SourceStatus};
use crate::queue::IdleQueue;
use crate::task::Task;
use crate::worker_pool::{Completion, WorkerPool};

/// Limits applied to dispatched work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TasksConfig {
    /// Cap on concurrently outstanding tasks. `None` spawns a thread for
    /// every task as soon as it is dequeued.
    pub max_workers: Option<usize>,
    /// Deadline after which a running task is failed with `TimedOut`.
    pub task_timeout: Option<Duration>,
}

struct Consumers<T, E> {
    tasks: TaskQueueConsumer<T, E>,
    results: ResultQueueConsumer<T, E>,
}

struct Inner<T, E> {
    handle: MainLoopHandle,
    task_queue: IdleQueue<Task<T, E>>,
    result_queue: IdleQueue<Completion<T, E>>,
    pool: Arc<WorkerPool<T, E>>,
    consumers: Mutex<Consumers<T, E>>,
    source: Mutex<Option<SourceId>>,
}

/// Owns the task and result queues, the worker pool and both consumers.
pub struct Tasks<T, E> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for Tasks<T, E> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T, E> Tasks<T, E>
where
    T: Send + 'static,
    E: Display + Send + 'static,
{
    pub fn new(handle: MainLoopHandle, config: TasksConfig) -> Self {
        Self::with_clock(handle, config, Arc::new(SystemClock))
    }

    pub fn with_clock(handle: MainLoopHandle, config: TasksConfig, clock: Arc<dyn Clock>) -> Self {
        let task_queue = IdleQueue::new();
        let result_queue = IdleQueue::new();
        let pool = Arc::new(WorkerPool::new(clock, config.max_workers, config.task_timeout));
        let consumers = Consumers {
            tasks: TaskQueueConsumer::new(
                "tasks",
                task_queue.clone(),
                handle.clone(),
                TaskDispatcher::new(Arc::clone(&pool), result_queue.clone(), handle.clone()),
            ),
            results: ResultQueueConsumer::new(
                "results",
                result_queue.clone(),
                handle.clone(),
                ResultDispatcher::new(Arc::clone(&pool), handle.clone()),
            ),
        };
        Self {
            inner: Arc::new(Inner {
                handle,
                task_queue,
                result_queue,
                pool,
                consumers: Mutex::new(consumers),
                source: Mutex::new(None),
            }),
        }
    }

    /// Enqueue `task` and make sure the engine is polling. Safe from any
    /// thread.
    pub fn add(&self, task: Task<T, E>) {
        debug!(task = task.name(), "task added");
        self.inner.task_queue.put_idle(&self.inner.handle, task);
        self.schedule_polling();
    }

    /// Start both consumers. They keep polling until [`stop`](Self::stop).
    pub fn run(&self) {
        {
            let consumers = self.inner.consumers.lock();
            consumers.tasks.start();
            consumers.results.start();
        }
        self.schedule_polling();
    }

    /// Let both consumers finish once everything queued so far is drained.
    /// Running workers are never interrupted.
    pub fn stop(&self) {
        let consumers = self.inner.consumers.lock();
        consumers.tasks.stop();
        consumers.results.stop();
    }

    /// [`run`](Self::run) then [`stop`](Self::stop): process everything
    /// already queued, then deregister.
    pub fn run_till_empty(&self) {
        self.run();
        self.stop();
    }

    /// Block the calling thread until no task is outstanding. Never call
    /// this on the coordinating thread.
    pub fn join(&self) {
        self.inner.pool.join();
    }

    /// Whether the poll step is registered with the main loop.
    pub fn is_polling(&self) -> bool {
        self.inner.source.lock().is_some()
    }

    /// Tasks dispatched to workers and not yet drained.
    pub fn outstanding(&self) -> usize {
        self.inner.pool.outstanding()
    }

    /// Entries waiting in the task queue.
    pub fn queued(&self) -> usize {
        self.inner.task_queue.len()
    }

    fn schedule_polling(&self) {
        let weak = Arc::downgrade(&self.inner);
        self.inner.handle.idle_add(move || {
            if let Some(inner) = weak.upgrade() {
                Inner::ensure_polling(&inner);
            }
        });
    }
}

impl<T, E> Inner<T, E>
where
    T: Send + 'static,
    E: Display + Send + 'static,
{
    /// Runs on the coordinating thread only, so the check and the
    /// registration cannot interleave with the poll step.
    fn ensure_polling(this: &Arc<Self>) {
        let mut source = this.source.lock();
        if source.is_some() {
            return;
        }
        let weak: Weak<Self> = Arc::downgrade(this);
        let id = this.handle.add_source(move || match weak.upgrade() {
            Some(inner) => inner.poll(),
            None => SourceStatus::Finished,
        });
        debug!(?id, "task polling registered");
        *source = Some(id);
    }

    fn poll(&self) -> SourceStatus {
        self.pool.reap();
        self.pool.check_deadlines(&self.result_queue);

        let (tasks, results) = {
            let mut consumers = self.consumers.lock();
            (consumers.tasks.consume_one(), consumers.results.consume_one())
        };

        let drained = tasks == SourceStatus::Finished
            && results == SourceStatus::Finished
            && self.pool.outstanding() == 0;
        if drained {
            debug!("task queues drained, polling stopped");
            *self.source.lock() = None;
            return SourceStatus::Finished;
        }
        if tasks == SourceStatus::Progress || results == SourceStatus::Progress {
            SourceStatus::Progress
        } else {
            SourceStatus::Waiting
        }
    }
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
