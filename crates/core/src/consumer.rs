// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue consumers driven one step at a time from a poll source.

use std::fmt::Display;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::mainloop::{MainLoopHandle, SourceStatus};
use crate::queue::{Dequeued, IdleQueue, Sentinel};
use crate::task::Task;
use crate::worker_pool::{Completion, WorkerPool};

/// What a consumer does with each data item it dequeues.
pub trait ItemProcessor<T>: Send {
    fn process(&mut self, item: T);

    /// Whether the next item may be taken now. A consumer that is not
    /// ready leaves the queue untouched.
    fn ready(&self) -> bool {
        true
    }
}

/// Polls an [`IdleQueue`] and hands items to a processor.
///
/// `consuming` only changes when a sentinel is dequeued, so a stop can
/// never overtake items queued before it.
pub struct QueueConsumer<T, P> {
    label: &'static str,
    queue: IdleQueue<T>,
    handle: MainLoopHandle,
    processor: P,
    consuming: bool,
}

impl<T, P> QueueConsumer<T, P>
where
    T: Send + 'static,
    P: ItemProcessor<T>,
{
    pub fn new(label: &'static str, queue: IdleQueue<T>, handle: MainLoopHandle, processor: P) -> Self {
        Self { label, queue, handle, processor, consuming: false }
    }

    /// Queue a start sentinel behind whatever is already queued.
    pub fn start(&self) {
        self.queue.put_sentinel_idle(&self.handle, Sentinel::Start);
    }

    /// Queue a stop sentinel behind whatever is already queued.
    pub fn stop(&self) {
        self.queue.put_sentinel_idle(&self.handle, Sentinel::Stop);
    }

    pub fn is_consuming(&self) -> bool {
        self.consuming
    }

    pub fn queue(&self) -> &IdleQueue<T> {
        &self.queue
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// One poll step. Never blocks.
    pub fn consume_one(&mut self) -> SourceStatus {
        if !self.processor.ready() {
            return SourceStatus::Waiting;
        }
        match self.queue.get(false) {
            Dequeued::Item(item) => {
                self.mark_done();
                self.processor.process(item);
                SourceStatus::Progress
            }
            Dequeued::Sentinel(sentinel) => {
                self.mark_done();
                trace!(consumer = self.label, %sentinel, "sentinel");
                self.consuming = sentinel.consuming_state();
                SourceStatus::Progress
            }
            Dequeued::Empty if self.consuming => SourceStatus::Waiting,
            Dequeued::Empty => SourceStatus::Finished,
        }
    }

    fn mark_done(&self) {
        if let Err(e) = self.queue.task_done() {
            warn!(consumer = self.label, error = %e, "queue bookkeeping out of step");
        }
    }
}

/// Dispatches each task to a new worker thread.
pub struct TaskDispatcher<T, E> {
    pool: Arc<WorkerPool<T, E>>,
    results: IdleQueue<Completion<T, E>>,
    handle: MainLoopHandle,
}

impl<T, E> TaskDispatcher<T, E> {
    pub fn new(pool: Arc<WorkerPool<T, E>>, results: IdleQueue<Completion<T, E>>, handle: MainLoopHandle) -> Self {
        Self { pool, results, handle }
    }
}

impl<T, E> ItemProcessor<Task<T, E>> for TaskDispatcher<T, E>
where
    T: Send + 'static,
    E: Display + Send + 'static,
{
    fn process(&mut self, task: Task<T, E>) {
        self.pool.spawn(task, &self.results, &self.handle);
    }

    fn ready(&self) -> bool {
        self.pool.has_capacity()
    }
}

/// Marks work drained and schedules the continuation.
pub struct ResultDispatcher<T, E> {
    pool: Arc<WorkerPool<T, E>>,
    handle: MainLoopHandle,
}

impl<T, E> ResultDispatcher<T, E> {
    pub fn new(pool: Arc<WorkerPool<T, E>>, handle: MainLoopHandle) -> Self {
        Self { pool, handle }
    }
}

impl<T, E> ItemProcessor<Completion<T, E>> for ResultDispatcher<T, E>
where
    T: Send + 'static,
    E: Display + Send + 'static,
{
    fn process(&mut self, completion: Completion<T, E>) {
        self.pool.task_done();
        let Completion { task, callback, value, error } = completion;
        match callback {
            Some(callback) => {
                self.handle.idle_add(move || callback(value, error));
            }
            None => trace!(%task, "no callback; dropping result"),
        }
    }
}

pub type TaskQueueConsumer<T, E> = QueueConsumer<Task<T, E>, TaskDispatcher<T, E>>;
pub type ResultQueueConsumer<T, E> = QueueConsumer<Completion<T, E>, ResultDispatcher<T, E>>;

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;
