// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seams toward the debugger protocol engine
//!
//! The engine lives on the main thread. The inspector client hands it a
//! [`DebuggerClient`] for nested message loops and a [`FrontendChannel`] per
//! connected frontend.

mod noop;

pub use noop::NoOpBackend;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{BackendCall, FakeBackend};

use std::rc::Weak;

/// Execution context announced to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    pub group_id: i32,
    pub name: String,
    pub origin: String,
    /// JSON object text, e.g. `{"isDefault":true}`
    pub aux_data: String,
    pub is_default: bool,
}

/// Uncaught exception reported to attached frontends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExceptionDetails {
    pub message: String,
    pub url: String,
    pub line: u32,
    pub column: u32,
    pub stack: Option<String>,
}

/// Outbound side of a frontend session.
pub trait FrontendChannel {
    fn send_response(&self, call_id: i64, message: &str);
    fn send_notification(&self, message: &str);
    fn flush_protocol_notifications(&self) {}
}

/// A connected protocol session inside the engine.
///
/// Methods take `&self`: dispatching may re-enter the inspector through a
/// nested message loop that dispatches further messages on this session.
pub trait ProtocolSession {
    fn dispatch_protocol_message(&self, message: &str);
    fn schedule_pause_on_next_statement(&self, reason: &str, details: &str);
}

/// Callbacks the engine makes into the inspector.
pub trait DebuggerClient {
    /// Block in a nested loop servicing frontend messages until resumed.
    fn run_message_loop_on_pause(&self, context_group_id: i32);
    fn quit_message_loop_on_pause(&self);
    /// The frontend asked the VM to continue past a wait-for-debugger pause.
    fn run_if_waiting_for_debugger(&self, context_group_id: i32);
    fn max_async_call_stack_depth_changed(&self, _depth: i32) {}
    fn current_time_ms(&self) -> f64;
}

/// The protocol engine.
pub trait DebuggerBackend {
    fn connect(
        &self,
        context_group_id: i32,
        channel: Box<dyn FrontendChannel>,
    ) -> Box<dyn ProtocolSession>;
    fn context_created(&self, info: &ContextInfo);
    fn context_destroyed(&self, context_group_id: i32);
    fn exception_thrown(&self, details: &ExceptionDetails);
}

/// Builds the engine for a client; the engine holds the client weakly.
pub type BackendFactory = Box<dyn Fn(Weak<dyn DebuggerClient>) -> Box<dyn DebuggerBackend>>;

/// Extract `id` and `method` from a protocol command, if well-formed.
pub fn parse_command(message: &str) -> Option<(i64, String)> {
    let value: serde_json::Value = serde_json::from_str(message).ok()?;
    let id = value.get("id")?.as_i64()?;
    let method = value
        .get("method")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some((id, method))
}

/// `{"id":<id>,"result":{}}`
pub fn empty_result(id: i64) -> String {
    serde_json::json!({ "id": id, "result": {} }).to_string()
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
