// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! insp-server: HTTP and WebSocket transport of the inspector
//!
//! Serves the DevTools discovery endpoints (`/json`, `/json/list`,
//! `/json/version`, `/json/protocol`) and upgrades `ws://host:port/<target>`
//! connections into debugging sessions.

pub mod endpoints;
mod env;
pub mod http;
mod listener;
pub mod protocol_json;
pub mod server;
pub mod socket;

pub use protocol_json::{protocol_json, ProtocolJsonError};
pub use server::{
    InspectorSocketServer, ServerError, ServerState, SocketServerDelegate, SocketSession,
};
pub use socket::{InspectorSocket, SocketError, SocketEvent};
