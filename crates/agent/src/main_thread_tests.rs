// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use insp_adapters::LoopEnvironment;
use std::time::Duration;

type Log = Arc<Mutex<Vec<String>>>;

struct Recorder {
    log: Log,
}

impl Recorder {
    fn record(&self, entry: impl Into<String>) {
        self.log.lock().push(entry.into());
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.record("dropped");
    }
}

fn interface() -> (LoopEnvironment, Rc<MainThreadInterface>) {
    let env = LoopEnvironment::new();
    let thread = MainThreadInterface::new(&env, Weak::new());
    (env, thread)
}

fn recorder_reference(handle: Arc<MainThreadHandle>, log: &Log) -> AnotherThreadObjectReference<Recorder> {
    let log = Arc::clone(log);
    AnotherThreadObjectReference::new(handle, move |_| Recorder { log })
}

#[test]
fn object_ids_start_at_two() {
    let (_env, thread) = interface();
    let handle = thread.handle();
    assert_eq!(handle.new_object_id(), ObjectId::new(2));
    assert_eq!(handle.new_object_id(), ObjectId::new(3));
}

#[test]
fn posting_to_empty_queue_requests_interrupt() {
    let (env, thread) = interface();
    assert!(!env.signal().is_pending());
    let log = Log::default();
    let reference = recorder_reference(thread.handle(), &log);
    assert!(env.signal().is_pending());

    env.run_and_clear_interrupts();
    assert_eq!(thread.object_count(), 1);
    assert!(thread.get_object_if_exists(reference.object_id()).is_some());
}

#[test]
fn calls_posted_before_delete_see_the_object() {
    let (env, thread) = interface();
    let handle = thread.handle();
    let log = Log::default();
    let producer_log = Arc::clone(&log);

    std::thread::spawn(move || {
        let reference = recorder_reference(handle, &producer_log);
        for i in 0..100 {
            assert!(reference.call(move |r| r.record(format!("call {i}"))));
        }
        // Delete posted immediately after the calls
        drop(reference);
    })
    .join()
    .unwrap();

    env.run_and_clear_interrupts();

    let mut expected: Vec<String> = (0..100).map(|i| format!("call {i}")).collect();
    expected.push("dropped".to_string());
    assert_eq!(*log.lock(), expected);
    assert_eq!(thread.object_count(), 0);
}

#[test]
fn requests_posted_while_dispatching_are_drained() {
    let (env, thread) = interface();
    let handle = thread.handle();
    let log = Log::default();
    let reference = Arc::new(recorder_reference(handle, &log));
    let again = Arc::clone(&reference);
    reference.call(move |r| {
        r.record("first");
        again.call(|r| r.record("second"));
    });

    env.run_and_clear_interrupts();
    assert_eq!(*log.lock(), vec!["first", "second"]);
}

#[test]
fn wait_for_frontend_event_wakes_on_post() {
    let (_env, thread) = interface();
    let handle = thread.handle();
    let log = Log::default();
    let producer_log = Arc::clone(&log);
    let producer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        // Leaked so no Delete follows the Create
        std::mem::forget(recorder_reference(handle, &producer_log));
    });

    thread.wait_for_frontend_event();
    thread.dispatch_messages();
    producer.join().unwrap();
    assert_eq!(thread.object_count(), 1);
}

#[test]
fn posts_after_teardown_are_refused() {
    let (_env, thread) = interface();
    let handle = thread.handle();
    assert!(!handle.expired());
    drop(thread);

    assert!(handle.expired());
    let log = Log::default();
    let reference = recorder_reference(Arc::clone(&handle), &log);
    assert!(!reference.call(|r| r.record("never")));
    drop(reference);
    assert!(log.lock().is_empty());
}
