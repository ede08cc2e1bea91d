// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seams toward the script VM's main thread

mod loop_env;

pub use loop_env::{InterruptSignal, LoopEnvironment};

use std::rc::Rc;
use std::sync::Arc;

/// Thread-safe handle that asks the main thread to run its interrupt hooks
/// at the next safe point.
pub trait Interrupter: Send + Sync {
    fn request_interrupt(&self);
}

/// Main-thread view of the hosting VM.
///
/// Implementations are confined to the main thread; only the
/// [`Interrupter`] they hand out crosses threads.
pub trait Environment {
    /// Handle other threads use to wake the main thread.
    fn interrupter(&self) -> Arc<dyn Interrupter>;

    /// Register a hook run on every serviced interrupt.
    fn add_interrupt_hook(&self, hook: Rc<dyn Fn()>);

    /// Run the registered hooks if an interrupt is pending, clearing it.
    fn run_and_clear_interrupts(&self);

    /// Milliseconds since the environment was created.
    fn current_time_ms(&self) -> f64;

    /// 0 for the main VM thread, the worker id otherwise.
    fn thread_id(&self) -> u64 {
        0
    }
}
