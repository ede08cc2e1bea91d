// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend that acknowledges commands without inspecting any VM.

use super::{
    empty_result, parse_command, ContextInfo, DebuggerBackend, DebuggerClient, ExceptionDetails,
    FrontendChannel, ProtocolSession,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Answers every command with an empty result.
///
/// Announces known contexts on `Runtime.enable` and releases a
/// wait-for-debugger pause on `Runtime.runIfWaitingForDebugger`, which is
/// enough for a DevTools frontend to attach to a host without a real engine.
pub struct NoOpBackend {
    client: Weak<dyn DebuggerClient>,
    contexts: Rc<RefCell<Vec<ContextInfo>>>,
}

impl NoOpBackend {
    pub fn new(client: Weak<dyn DebuggerClient>) -> Self {
        Self {
            client,
            contexts: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl DebuggerBackend for NoOpBackend {
    fn connect(
        &self,
        context_group_id: i32,
        channel: Box<dyn FrontendChannel>,
    ) -> Box<dyn ProtocolSession> {
        Box::new(NoOpSession {
            context_group_id,
            channel,
            client: self.client.clone(),
            contexts: Rc::clone(&self.contexts),
        })
    }

    fn context_created(&self, info: &ContextInfo) {
        self.contexts.borrow_mut().push(info.clone());
    }

    fn context_destroyed(&self, context_group_id: i32) {
        self.contexts
            .borrow_mut()
            .retain(|c| c.group_id != context_group_id);
    }

    fn exception_thrown(&self, details: &ExceptionDetails) {
        tracing::debug!(message = %details.message, "exception ignored by no-op backend");
    }
}

struct NoOpSession {
    context_group_id: i32,
    channel: Box<dyn FrontendChannel>,
    client: Weak<dyn DebuggerClient>,
    contexts: Rc<RefCell<Vec<ContextInfo>>>,
}

impl NoOpSession {
    fn announce_contexts(&self) {
        let contexts = self.contexts.borrow().clone();
        for ctx in contexts {
            let aux: serde_json::Value =
                serde_json::from_str(&ctx.aux_data).unwrap_or(serde_json::Value::Null);
            let notification = serde_json::json!({
                "method": "Runtime.executionContextCreated",
                "params": {
                    "context": {
                        "id": ctx.group_id,
                        "origin": ctx.origin,
                        "name": ctx.name,
                        "auxData": aux,
                    }
                }
            });
            self.channel.send_notification(&notification.to_string());
        }
    }
}

impl ProtocolSession for NoOpSession {
    fn dispatch_protocol_message(&self, message: &str) {
        let Some((id, method)) = parse_command(message) else {
            tracing::warn!(len = message.len(), "dropping malformed protocol message");
            return;
        };
        self.channel.send_response(id, &empty_result(id));
        match method.as_str() {
            "Runtime.enable" => self.announce_contexts(),
            "Runtime.runIfWaitingForDebugger" => {
                if let Some(client) = self.client.upgrade() {
                    client.run_if_waiting_for_debugger(self.context_group_id);
                }
            }
            _ => {}
        }
        self.channel.flush_protocol_notifications();
    }

    fn schedule_pause_on_next_statement(&self, reason: &str, _details: &str) {
        tracing::debug!(reason, "pause requested, no engine to pause");
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
