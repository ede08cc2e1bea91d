// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TargetCall {
    Terminate,
    Stop,
    Send(SessionId, String),
}

#[derive(Default)]
struct RecordingTarget {
    calls: Vec<TargetCall>,
}

impl TransportTarget for RecordingTarget {
    fn terminate_connections(&mut self) {
        self.calls.push(TargetCall::Terminate);
    }

    fn stop(&mut self) {
        self.calls.push(TargetCall::Stop);
    }

    fn send(&mut self, session_id: SessionId, message: &str) {
        self.calls.push(TargetCall::Send(session_id, message.to_string()));
    }
}

#[test]
fn kill_terminates_then_stops() {
    let data = RequestQueueData::new();
    data.post(SessionId::new(0), TransportAction::Kill, None);
    let mut target = RecordingTarget::default();
    data.dispatch(&mut target);
    assert_eq!(target.calls, vec![TargetCall::Terminate, TargetCall::Stop]);
}

#[test]
fn send_without_message_is_ignored() {
    let data = RequestQueueData::new();
    data.post(SessionId::new(3), TransportAction::SendMessage, None);
    data.post(SessionId::new(3), TransportAction::Stop, None);
    let mut target = RecordingTarget::default();
    data.dispatch(&mut target);
    assert_eq!(target.calls, vec![TargetCall::Stop]);
}

#[test]
fn rapid_posts_from_another_thread_arrive_in_order() {
    let data = RequestQueueData::new();
    let handle = data.handle();
    let producer = std::thread::spawn(move || {
        for i in 0..1000 {
            handle.post(
                SessionId::new(1),
                TransportAction::SendMessage,
                Some(i.to_string()),
            );
        }
    });
    producer.join().unwrap();

    let mut target = RecordingTarget::default();
    data.dispatch(&mut target);
    let expected: Vec<_> = (0..1000)
        .map(|i| TargetCall::Send(SessionId::new(1), i.to_string()))
        .collect();
    assert_eq!(target.calls, expected);
}

#[test]
fn wait_returns_once_a_request_arrives() {
    let data = RequestQueueData::new();
    let handle = data.handle();
    let producer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        handle.post(SessionId::new(0), TransportAction::Stop, None);
    });
    data.wait();
    producer.join().unwrap();

    let mut target = RecordingTarget::default();
    data.dispatch(&mut target);
    assert_eq!(target.calls, vec![TargetCall::Stop]);
}

#[test]
fn reset_handle_drops_posts() {
    let data = RequestQueueData::new();
    let handle = data.handle();
    assert!(!handle.expired());

    data.close_and_free();
    assert!(handle.expired());
    handle.post(SessionId::new(0), TransportAction::Stop, None);

    let mut target = RecordingTarget::default();
    data.dispatch(&mut target);
    assert!(target.calls.is_empty());
}

#[test]
fn handle_expires_with_the_queue() {
    let data = RequestQueueData::new();
    let handle = data.handle();
    drop(data);
    assert!(handle.expired());
    handle.post(SessionId::new(0), TransportAction::Kill, None);
}

#[tokio::test]
async fn post_wakes_the_io_loop() {
    let data = RequestQueueData::new();
    let handle = data.handle();
    std::thread::spawn(move || {
        handle.post(SessionId::new(2), TransportAction::SendMessage, Some("x".to_string()));
    });
    tokio::time::timeout(Duration::from_secs(5), data.notified())
        .await
        .unwrap();

    let mut target = RecordingTarget::default();
    data.dispatch(&mut target);
    assert_eq!(
        target.calls,
        vec![TargetCall::Send(SessionId::new(2), "x".to_string())]
    );
}
