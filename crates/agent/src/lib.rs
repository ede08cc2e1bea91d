// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! insp-agent: the inspector's thread plumbing
//!
//! Two threads cooperate. The VM main thread owns the [`InspectorClient`]
//! and its protocol backend; the I/O thread owns the socket server. They
//! talk only through two mailboxes: the [`RequestQueueData`] toward the I/O
//! thread and the [`MainThreadInterface`] inbox toward the main thread.

pub mod agent;
pub mod client;
mod env;
pub mod io;
pub mod main_thread;
pub mod request_queue;
pub mod session;

pub use agent::{find_available_port, Agent, AgentError, AgentOptions};
pub use client::InspectorClient;
pub use env::port_range;
pub use io::{InspectorIo, InspectorIoError};
pub use main_thread::{AnotherThreadObjectReference, MainThreadHandle, MainThreadInterface, Request};
pub use request_queue::{RequestQueue, RequestQueueData, RequestToServer, TransportAction, TransportTarget};
pub use session::{
    CrossThreadInspectorSession, InspectorSession, InspectorSessionDelegate,
    SameThreadInspectorSession,
};
