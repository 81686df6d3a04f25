// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::{FakeClock, SystemClock};
use crate::mainloop::MainLoop;
use crate::queue::Dequeued;

type Pool = WorkerPool<u32, String>;

fn pool(max_workers: Option<usize>, timeout: Option<Duration>) -> Pool {
    WorkerPool::new(Arc::new(SystemClock), max_workers, timeout)
}

fn pump_until(main_loop: &mut MainLoop, mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        main_loop.iteration();
        thread::sleep(Duration::from_millis(1));
    }
}

fn take(results: &IdleQueue<Completion<u32, String>>) -> Completion<u32, String> {
    match results.get(false) {
        Dequeued::Item(c) => c,
        other => panic!("expected a completion, got {other:?}"),
    }
}

#[test]
fn success_travels_through_the_result_queue() {
    let mut main_loop = MainLoop::new();
    let results = IdleQueue::new();
    let pool = pool(None, None);

    pool.spawn(Task::from_fn("answer", || Ok(42)).on_success(|_, _| {}), &results, &main_loop.handle());
    assert_eq!(pool.outstanding(), 1);

    pump_until(&mut main_loop, || !results.is_empty());
    let completion = take(&results);
    assert_eq!(completion.task, "answer");
    assert_eq!(completion.value, Some(42));
    assert!(completion.error.is_none());
    assert!(completion.callback.is_some());

    pool.task_done();
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn error_selects_the_error_callback() {
    let mut main_loop = MainLoop::new();
    let results = IdleQueue::new();
    let pool = pool(None, None);

    let task = Task::from_fn("bad", || Err("nope".to_string())).on_success(|_, _| {});
    pool.spawn(task, &results, &main_loop.handle());

    pump_until(&mut main_loop, || !results.is_empty());
    let completion = take(&results);
    assert!(completion.value.is_none());
    assert_eq!(completion.error, Some(TaskFailure::Failed("nope".to_string())));
    assert!(completion.callback.is_none(), "no on_error was registered");
}

#[test]
fn panic_is_captured_at_the_worker_boundary() {
    let mut main_loop = MainLoop::new();
    let results = IdleQueue::new();
    let pool = pool(None, None);

    pool.spawn(Task::from_fn("explode", || panic!("kaboom")), &results, &main_loop.handle());

    pump_until(&mut main_loop, || !results.is_empty());
    assert_eq!(take(&results).error, Some(TaskFailure::Panicked("kaboom".to_string())));
}

#[test]
fn worker_thread_carries_the_task_name() {
    let mut main_loop = MainLoop::new();
    let results = IdleQueue::new();
    let pool: WorkerPool<String, String> = WorkerPool::new(Arc::new(SystemClock), None, None);

    let task = Task::from_fn("named-task", || Ok(thread::current().name().unwrap_or_default().to_string()));
    pool.spawn(task, &results, &main_loop.handle());

    pump_until(&mut main_loop, || !results.is_empty());
    match results.get(false) {
        Dequeued::Item(c) => assert_eq!(c.value.as_deref(), Some("named-task")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn deadline_fails_the_task_once_and_drops_the_late_result() {
    let mut main_loop = MainLoop::new();
    let results = IdleQueue::new();
    let clock = FakeClock::new();
    let pool: Pool = WorkerPool::new(Arc::new(clock.clone()), None, Some(Duration::from_secs(1)));

    let (release, gate) = std::sync::mpsc::channel::<()>();
    let task = Task::from_fn("slow", move || {
        let _ = gate.recv();
        Ok(1)
    })
    .on_error(|_, _| {});
    pool.spawn(task, &results, &main_loop.handle());

    pool.check_deadlines(&results);
    assert!(results.is_empty());

    clock.advance(Duration::from_secs(2));
    pool.check_deadlines(&results);
    let completion = take(&results);
    assert_eq!(completion.error, Some(TaskFailure::TimedOut { after: Duration::from_secs(1) }));
    assert!(completion.callback.is_some());

    pool.check_deadlines(&results);
    assert!(results.is_empty(), "deadline fires once");

    release.send(()).unwrap();
    pump_until(&mut main_loop, || {
        pool.reap();
        pool.state.lock().workers.is_empty()
    });
    main_loop.iteration();
    assert!(results.is_empty(), "late result is discarded");
}

#[test]
fn capacity_tracks_outstanding_work() {
    let mut main_loop = MainLoop::new();
    let results = IdleQueue::new();
    let pool = pool(Some(1), None);
    assert!(pool.has_capacity());

    pool.spawn(Task::from_fn("one", || Ok(1)), &results, &main_loop.handle());
    assert!(!pool.has_capacity());

    pool.task_done();
    pump_until(&mut main_loop, || pool.has_capacity());
}

#[test]
fn timed_out_thread_still_holds_its_slot() {
    let mut main_loop = MainLoop::new();
    let results = IdleQueue::new();
    let clock = FakeClock::new();
    let pool: Pool = WorkerPool::new(Arc::new(clock.clone()), Some(1), Some(Duration::from_secs(1)));

    let (release, gate) = std::sync::mpsc::channel::<()>();
    let task = Task::from_fn("hung", move || {
        let _ = gate.recv();
        Ok(1)
    })
    .on_error(|_, _| {});
    pool.spawn(task, &results, &main_loop.handle());

    clock.advance(Duration::from_secs(2));
    pool.check_deadlines(&results);
    let _ = take(&results);
    pool.task_done();
    assert_eq!(pool.outstanding(), 0);
    assert!(!pool.has_capacity(), "hung thread is still running");

    release.send(()).unwrap();
    pump_until(&mut main_loop, || pool.has_capacity());
}

#[test]
fn join_timeout_reports_drain_state() {
    let main_loop = MainLoop::new();
    let results = IdleQueue::new();
    let pool = pool(None, None);
    assert!(pool.join_timeout(Duration::from_millis(1)));

    pool.spawn(Task::from_fn("one", || Ok(1)), &results, &main_loop.handle());
    assert!(!pool.join_timeout(Duration::from_millis(5)));

    pool.task_done();
    assert!(pool.join_timeout(Duration::from_millis(1)));
    pool.join();
}

#[test]
fn task_done_without_work_is_ignored() {
    let pool = pool(None, None);
    pool.task_done();
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn panic_message_handles_common_payloads() {
    let s: Box<dyn Any + Send> = Box::new("static");
    let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
    let other: Box<dyn Any + Send> = Box::new(7_u8);
    assert_eq!(panic_message(s.as_ref()), "static");
    assert_eq!(panic_message(owned.as_ref()), "owned");
    assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
}
