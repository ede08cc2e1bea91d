// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::cell::Cell;

#[test]
fn hooks_run_only_when_interrupt_pending() {
    let env = LoopEnvironment::new();
    let runs = Rc::new(Cell::new(0));
    let counter = Rc::clone(&runs);
    env.add_interrupt_hook(Rc::new(move || counter.set(counter.get() + 1)));

    env.run_and_clear_interrupts();
    assert_eq!(runs.get(), 0);

    env.interrupter().request_interrupt();
    env.run_and_clear_interrupts();
    assert_eq!(runs.get(), 1);

    // Cleared after running
    env.run_and_clear_interrupts();
    assert_eq!(runs.get(), 1);
}

#[test]
fn park_times_out_without_interrupt() {
    let env = LoopEnvironment::new();
    assert!(!env.park(Duration::from_millis(10)));
}

#[test]
fn park_wakes_on_interrupt_from_other_thread() {
    let env = LoopEnvironment::new();
    let interrupter = env.interrupter();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        interrupter.request_interrupt();
    });
    let start = Instant::now();
    assert!(env.park(Duration::from_secs(10)));
    assert!(start.elapsed() < Duration::from_secs(10));
    handle.join().unwrap();
    assert!(env.signal().is_pending());
}

#[test]
fn hook_may_register_another_hook() {
    let env = Rc::new(LoopEnvironment::new());
    let inner_runs = Rc::new(Cell::new(0));
    let env_for_hook = Rc::clone(&env);
    let counter = Rc::clone(&inner_runs);
    env.add_interrupt_hook(Rc::new(move || {
        let counter = Rc::clone(&counter);
        env_for_hook.add_interrupt_hook(Rc::new(move || counter.set(counter.get() + 1)));
    }));

    env.interrupter().request_interrupt();
    env.run_and_clear_interrupts();
    assert_eq!(inner_runs.get(), 0);

    env.interrupter().request_interrupt();
    env.run_and_clear_interrupts();
    assert_eq!(inner_runs.get(), 1);
}

#[test]
fn worker_thread_id() {
    assert_eq!(LoopEnvironment::new().thread_id(), 0);
    assert_eq!(LoopEnvironment::with_thread_id(3).thread_id(), 3);
}
