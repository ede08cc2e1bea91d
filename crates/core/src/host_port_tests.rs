// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Arc;

#[test]
fn default_host_port() {
    let hp = HostPort::default();
    assert_eq!(hp.host(), "127.0.0.1");
    assert_eq!(hp.port(), 9229);
}

#[test]
fn exclusive_access_across_threads() {
    let shared = Arc::new(ExclusiveAccess::new(HostPort::new("localhost", 0, None)));
    let writer = Arc::clone(&shared);
    std::thread::spawn(move || writer.lock().set_port(51000))
        .join()
        .unwrap();
    assert_eq!(shared.lock().port(), 51000);
}

#[test]
fn publish_defaults_to_everything() {
    let publish = InspectPublishUid::default();
    assert!(publish.console);
    assert!(publish.http);
}
