// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake debugger backend for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    empty_result, parse_command, ContextInfo, DebuggerBackend, DebuggerClient, ExceptionDetails,
    FrontendChannel, ProtocolSession,
};
use parking_lot::Mutex;
use std::rc::Weak;
use std::sync::Arc;

/// Recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Connect { session: u32 },
    Dispatch { session: u32, message: String },
    Disconnect { session: u32 },
    SchedulePause { session: u32, reason: String },
    ContextCreated { name: String, aux_data: String },
    ContextDestroyed { context_group_id: i32 },
    ExceptionThrown { message: String },
}

#[derive(Default)]
struct FakeBackendState {
    calls: Vec<BackendCall>,
    next_session: u32,
    live_sessions: usize,
}

/// Fake backend for testing
///
/// Replies `{"id":N,"result":{}}` to every command. `Debugger.pause` enters
/// the client's pause loop, `Debugger.resume` leaves it and
/// `Runtime.runIfWaitingForDebugger` releases a wait-for-frontend.
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<FakeBackendState>>,
    client: Option<Weak<dyn DebuggerClient>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle sharing this fake's recorded state, bound to `client`.
    pub fn bind(&self, client: Weak<dyn DebuggerClient>) -> FakeBackend {
        FakeBackend {
            inner: Arc::clone(&self.inner),
            client: Some(client),
        }
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner.lock().calls.clone()
    }

    /// Messages dispatched on any session, in order.
    pub fn dispatched(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::Dispatch { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn live_sessions(&self) -> usize {
        self.inner.lock().live_sessions
    }

    fn record(&self, call: BackendCall) {
        self.inner.lock().calls.push(call);
    }
}

impl DebuggerBackend for FakeBackend {
    fn connect(
        &self,
        context_group_id: i32,
        channel: Box<dyn FrontendChannel>,
    ) -> Box<dyn ProtocolSession> {
        let session = {
            let mut inner = self.inner.lock();
            inner.next_session += 1;
            inner.live_sessions += 1;
            let session = inner.next_session;
            inner.calls.push(BackendCall::Connect { session });
            session
        };
        Box::new(FakeProtocolSession {
            session,
            context_group_id,
            channel,
            backend: self.clone(),
        })
    }

    fn context_created(&self, info: &ContextInfo) {
        self.record(BackendCall::ContextCreated {
            name: info.name.clone(),
            aux_data: info.aux_data.clone(),
        });
    }

    fn context_destroyed(&self, context_group_id: i32) {
        self.record(BackendCall::ContextDestroyed { context_group_id });
    }

    fn exception_thrown(&self, details: &ExceptionDetails) {
        self.record(BackendCall::ExceptionThrown {
            message: details.message.clone(),
        });
    }
}

struct FakeProtocolSession {
    session: u32,
    context_group_id: i32,
    channel: Box<dyn FrontendChannel>,
    backend: FakeBackend,
}

impl ProtocolSession for FakeProtocolSession {
    fn dispatch_protocol_message(&self, message: &str) {
        self.backend.record(BackendCall::Dispatch {
            session: self.session,
            message: message.to_string(),
        });
        let Some((id, method)) = parse_command(message) else {
            return;
        };
        // Lock is not held here: the client callbacks below may re-enter
        let client = self.backend.client.as_ref().and_then(Weak::upgrade);
        self.channel.send_response(id, &empty_result(id));
        match (method.as_str(), client) {
            ("Debugger.pause", Some(client)) => {
                client.run_message_loop_on_pause(self.context_group_id)
            }
            ("Debugger.resume", Some(client)) => client.quit_message_loop_on_pause(),
            ("Runtime.runIfWaitingForDebugger", Some(client)) => {
                client.run_if_waiting_for_debugger(self.context_group_id)
            }
            _ => {}
        }
    }

    fn schedule_pause_on_next_statement(&self, reason: &str, _details: &str) {
        self.backend.record(BackendCall::SchedulePause {
            session: self.session,
            reason: reason.to_string(),
        });
    }
}

impl Drop for FakeProtocolSession {
    fn drop(&mut self) {
        let mut inner = self.backend.inner.lock();
        inner.live_sessions = inner.live_sessions.saturating_sub(1);
        inner.calls.push(BackendCall::Disconnect {
            session: self.session,
        });
    }
}
