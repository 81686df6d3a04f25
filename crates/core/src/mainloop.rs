// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinating main loop.
//!
//! A single thread owns the [`MainLoop`] and drives it. Every other thread
//! talks to it through a [`MainLoopHandle`]: one-shot calls scheduled with
//! [`MainLoopHandle::idle_add`] run on the coordinating thread in the order
//! they were scheduled, followed by one pass over the registered poll
//! sources. Nothing scheduled here ever runs concurrently with anything else
//! scheduled here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Default wake-up interval while poll sources are registered but idle.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// One-shot call scheduled onto the coordinating thread.
pub type IdleFn = Box<dyn FnOnce() + Send + 'static>;

/// Recurring poll step.
pub type SourceFn = Box<dyn FnMut() -> SourceStatus + Send + 'static>;

/// Identifier of a registered poll source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

/// What a poll source reports after one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// Did some work; poll again as soon as possible.
    Progress,
    /// Nothing to do right now, but keep polling.
    Waiting,
    /// Deregister this source.
    Finished,
}

crate::named_variants! {
    SourceStatus {
        Progress => "progress",
        Waiting => "waiting",
        Finished => "finished",
    }
}

impl SourceStatus {
    /// Whether the source stays registered.
    pub fn is_active(self) -> bool {
        !matches!(self, SourceStatus::Finished)
    }
}

enum LoopMessage {
    Call(IdleFn),
    AddSource(SourceId, SourceFn),
    RemoveSource(SourceId),
    Quit,
}

/// Thread-safe handle for scheduling work onto the coordinating thread.
#[derive(Clone)]
pub struct MainLoopHandle {
    tx: mpsc::UnboundedSender<LoopMessage>,
    next_source: Arc<AtomicU64>,
}

impl std::fmt::Debug for MainLoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainLoopHandle").field("closed", &self.tx.is_closed()).finish()
    }
}

impl MainLoopHandle {
    /// Schedule `f` to run once on the coordinating thread.
    ///
    /// Returns `false` if the loop has been dropped; `f` is dropped unrun.
    pub fn idle_add<F>(&self, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.send(LoopMessage::Call(Box::new(f)))
    }

    /// Register a recurring poll step. It first runs on the iteration after
    /// every call scheduled before it.
    pub fn add_source<F>(&self, f: F) -> SourceId
    where
        F: FnMut() -> SourceStatus + Send + 'static,
    {
        let id = SourceId(self.next_source.fetch_add(1, Ordering::Relaxed));
        self.send(LoopMessage::AddSource(id, Box::new(f)));
        id
    }

    /// Deregister a poll step. Unknown ids are ignored.
    pub fn remove_source(&self, id: SourceId) {
        self.send(LoopMessage::RemoveSource(id));
    }

    /// Ask [`MainLoop::run`] to return after the current iteration.
    pub fn quit(&self) {
        self.send(LoopMessage::Quit);
    }

    /// Whether the owning loop has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, msg: LoopMessage) -> bool {
        if self.tx.send(msg).is_err() {
            debug!("main loop is gone, dropping scheduled work");
            return false;
        }
        true
    }
}

/// The coordinating event loop.
pub struct MainLoop {
    rx: mpsc::UnboundedReceiver<LoopMessage>,
    handle: MainLoopHandle,
    sources: Vec<(SourceId, SourceFn)>,
    poll_interval: Duration,
    quit: bool,
    last_progress: bool,
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl MainLoop {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            rx,
            handle: MainLoopHandle { tx, next_source: Arc::new(AtomicU64::new(1)) },
            sources: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            quit: false,
            last_progress: false,
        }
    }

    /// Override the idle wake-up interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn handle(&self) -> MainLoopHandle {
        self.handle.clone()
    }

    /// Number of registered poll sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// No source registered and nothing scheduled.
    pub fn is_quiescent(&self) -> bool {
        self.sources.is_empty() && self.rx.is_empty()
    }

    /// Run every pending call in FIFO order, then poll each source once.
    ///
    /// Returns `true` if anything ran or any source made progress.
    pub fn iteration(&mut self) -> bool {
        let mut dispatched = false;
        while let Ok(msg) = self.rx.try_recv() {
            dispatched = true;
            self.apply(msg);
            if self.quit {
                return true;
            }
        }
        let progressed = self.poll_sources();
        self.last_progress = progressed;
        dispatched || progressed
    }

    /// Iterate until [`MainLoopHandle::quit`] is called.
    pub async fn run(&mut self) {
        self.quit = false;
        debug!("main loop running");
        loop {
            self.iteration();
            if self.quit {
                break;
            }
            self.wait().await;
            if self.quit {
                break;
            }
        }
        debug!("main loop quit");
    }

    /// Iterate until the loop is quiescent or quit.
    pub async fn run_until_idle(&mut self) {
        self.quit = false;
        loop {
            self.iteration();
            if self.quit || self.is_quiescent() {
                return;
            }
            self.wait().await;
            if self.quit {
                return;
            }
        }
    }

    async fn wait(&mut self) {
        if !self.rx.is_empty() {
            return;
        }
        if self.sources.is_empty() {
            match self.rx.recv().await {
                Some(msg) => self.apply(msg),
                None => self.quit = true,
            }
            return;
        }
        if self.last_progress {
            tokio::task::yield_now().await;
            return;
        }
        tokio::select! {
            msg = self.rx.recv() => match msg {
                Some(msg) => self.apply(msg),
                None => self.quit = true,
            },
            _ = tokio::time::sleep(self.poll_interval) => {}
        }
    }

    fn apply(&mut self, msg: LoopMessage) {
        match msg {
            LoopMessage::Call(f) => f(),
            LoopMessage::AddSource(id, f) => {
                trace!(?id, "source added");
                self.sources.push((id, f));
            }
            LoopMessage::RemoveSource(id) => {
                trace!(?id, "source removed");
                self.sources.retain(|(sid, _)| *sid != id);
            }
            LoopMessage::Quit => self.quit = true,
        }
    }

    fn poll_sources(&mut self) -> bool {
        if self.sources.is_empty() {
            return false;
        }
        let mut progressed = false;
        self.sources.retain_mut(|(id, source)| match source() {
            SourceStatus::Progress => {
                progressed = true;
                true
            }
            SourceStatus::Waiting => true,
            SourceStatus::Finished => {
                trace!(?id, "source finished");
                false
            }
        });
        progressed
    }
}

#[cfg(test)]
#[path = "mainloop_tests.rs"]
mod tests;
