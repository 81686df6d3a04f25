// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deferred units of work.

use std::fmt;
use std::time::Duration;

/// Continuation invoked on the coordinating thread with `(value, None)` on
/// success or `(None, failure)` on error.
pub type Callback<T, E> = Box<dyn FnOnce(Option<T>, Option<TaskFailure<E>>) + Send + 'static>;

pub(crate) type TaskFn<T, E> = Box<dyn FnOnce() -> Result<T, E> + Send + 'static>;

/// Why a task did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure<E> {
    /// The function returned an error.
    Failed(E),
    /// The function panicked; carries the panic message.
    Panicked(String),
    /// The per-task deadline elapsed before the function returned.
    TimedOut { after: Duration },
    /// No worker thread could be started.
    Spawn(String),
}

impl<E> TaskFailure<E> {
    /// Short kind label used in logs and wrapped faults.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskFailure::Failed(_) => "Failed",
            TaskFailure::Panicked(_) => "Panicked",
            TaskFailure::TimedOut { .. } => "TimedOut",
            TaskFailure::Spawn(_) => "Spawn",
        }
    }

    pub fn into_error(self) -> Option<E> {
        match self {
            TaskFailure::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for TaskFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFailure::Failed(e) => write!(f, "{e}"),
            TaskFailure::Panicked(msg) => write!(f, "task panicked: {msg}"),
            TaskFailure::TimedOut { after } => write!(f, "task timed out after {after:?}"),
            TaskFailure::Spawn(msg) => write!(f, "failed to start worker: {msg}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for TaskFailure<E> {}

/// A function with its arguments plus the continuations for its outcome.
///
/// Exactly one of `on_success`/`on_error` runs for a dispatched task.
/// Either may be omitted, in which case that outcome is dropped.
pub struct Task<T, E> {
    name: String,
    func: TaskFn<T, E>,
    on_success: Option<Callback<T, E>>,
    on_error: Option<Callback<T, E>>,
}

impl<T, E> fmt::Debug for Task<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl<T, E> Task<T, E> {
    /// Bind `func` to `args`. The call happens on a worker thread.
    pub fn new<A, F>(name: impl Into<String>, func: F, args: A) -> Self
    where
        A: Send + 'static,
        F: FnOnce(A) -> Result<T, E> + Send + 'static,
    {
        Self::from_fn(name, move || func(args))
    }

    pub fn from_fn<F>(name: impl Into<String>, func: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        Self { name: name.into(), func: Box::new(func), on_success: None, on_error: None }
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Option<T>, Option<TaskFailure<E>>) + Send + 'static,
    {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Option<T>, Option<TaskFailure<E>>) + Send + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Route both outcomes to the same continuation.
    pub fn on_complete<F>(self, f: F) -> Self
    where
        F: FnOnce(Result<T, TaskFailure<E>>) + Send + 'static,
    {
        let shared = std::sync::Arc::new(parking_lot::Mutex::new(Some(f)));
        let on_error = std::sync::Arc::clone(&shared);
        self.on_success(move |value, _| {
            if let (Some(f), Some(value)) = (shared.lock().take(), value) {
                f(Ok(value));
            }
        })
        .on_error(move |_, failure| {
            if let (Some(f), Some(failure)) = (on_error.lock().take(), failure) {
                f(Err(failure));
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(self) -> (String, TaskFn<T, E>, Callbacks<T, E>) {
        let callbacks = Callbacks { on_success: self.on_success, on_error: self.on_error };
        (self.name, self.func, callbacks)
    }
}

/// The two continuations of a dispatched task, taken exactly once.
pub(crate) struct Callbacks<T, E> {
    pub(crate) on_success: Option<Callback<T, E>>,
    pub(crate) on_error: Option<Callback<T, E>>,
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
