// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment for hosts that drive their own idle loop

use super::{Environment, Interrupter};
use parking_lot::{Condvar, Mutex};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pending-interrupt flag shared with other threads.
#[derive(Default)]
pub struct InterruptSignal {
    pending: Mutex<bool>,
    wake: Condvar,
}

impl InterruptSignal {
    pub fn is_pending(&self) -> bool {
        *self.pending.lock()
    }

    fn take(&self) -> bool {
        std::mem::take(&mut *self.pending.lock())
    }

    fn wait(&self, timeout: Duration) -> bool {
        let mut pending = self.pending.lock();
        if !*pending {
            self.wake.wait_for(&mut pending, timeout);
        }
        *pending
    }
}

impl Interrupter for InterruptSignal {
    fn request_interrupt(&self) {
        *self.pending.lock() = true;
        self.wake.notify_all();
    }
}

/// [`Environment`] backed by a flag and a condvar.
///
/// The host calls [`LoopEnvironment::park`] when idle and
/// [`Environment::run_and_clear_interrupts`] at its safe points.
pub struct LoopEnvironment {
    signal: Arc<InterruptSignal>,
    hooks: RefCell<Vec<Rc<dyn Fn()>>>,
    started: Instant,
    thread_id: u64,
}

impl LoopEnvironment {
    pub fn new() -> Self {
        Self::with_thread_id(0)
    }

    /// Environment for a worker thread.
    pub fn with_thread_id(thread_id: u64) -> Self {
        Self {
            signal: Arc::new(InterruptSignal::default()),
            hooks: RefCell::new(Vec::new()),
            started: Instant::now(),
            thread_id,
        }
    }

    /// Block until an interrupt is requested or `timeout` elapses.
    ///
    /// Returns whether an interrupt is pending.
    pub fn park(&self, timeout: Duration) -> bool {
        self.signal.wait(timeout)
    }

    pub fn signal(&self) -> Arc<InterruptSignal> {
        Arc::clone(&self.signal)
    }
}

impl Default for LoopEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for LoopEnvironment {
    fn interrupter(&self) -> Arc<dyn Interrupter> {
        self.signal.clone()
    }

    fn add_interrupt_hook(&self, hook: Rc<dyn Fn()>) {
        self.hooks.borrow_mut().push(hook);
    }

    fn run_and_clear_interrupts(&self) {
        if !self.signal.take() {
            return;
        }
        // Hooks may register further hooks or re-enter this method
        let hooks = self.hooks.borrow().clone();
        for hook in hooks {
            hook();
        }
    }

    fn current_time_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    fn thread_id(&self) -> u64 {
        self.thread_id
    }
}

#[cfg(test)]
#[path = "loop_env_tests.rs"]
mod tests;
