// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced backend wrapper for consistent observability

use crate::backend::{
    ContextInfo, DebuggerBackend, ExceptionDetails, FrontendChannel, ProtocolSession,
};
use std::cell::Cell;

/// Wrapper that adds tracing to any DebuggerBackend
pub struct TracedBackend<B> {
    inner: B,
    connects: Cell<u32>,
}

impl<B> TracedBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            connects: Cell::new(0),
        }
    }
}

impl<B: DebuggerBackend> DebuggerBackend for TracedBackend<B> {
    fn connect(
        &self,
        context_group_id: i32,
        channel: Box<dyn FrontendChannel>,
    ) -> Box<dyn ProtocolSession> {
        let seq = self.connects.get() + 1;
        self.connects.set(seq);
        let session = tracing::info_span!("backend.connect", context_group_id, seq).in_scope(|| {
            let session = self.inner.connect(context_group_id, channel);
            tracing::info!("protocol session connected");
            session
        });
        Box::new(TracedSession { inner: session, seq })
    }

    fn context_created(&self, info: &ContextInfo) {
        tracing::info!(
            context_group_id = info.group_id,
            name = %info.name,
            is_default = info.is_default,
            "context created"
        );
        self.inner.context_created(info);
    }

    fn context_destroyed(&self, context_group_id: i32) {
        tracing::info!(context_group_id, "context destroyed");
        self.inner.context_destroyed(context_group_id);
    }

    fn exception_thrown(&self, details: &ExceptionDetails) {
        tracing::warn!(
            message = %details.message,
            url = %details.url,
            line = details.line,
            "uncaught exception"
        );
        self.inner.exception_thrown(details);
    }
}

struct TracedSession {
    inner: Box<dyn ProtocolSession>,
    seq: u32,
}

impl ProtocolSession for TracedSession {
    fn dispatch_protocol_message(&self, message: &str) {
        tracing::debug!(seq = self.seq, len = message.len(), "dispatching protocol message");
        self.inner.dispatch_protocol_message(message);
    }

    fn schedule_pause_on_next_statement(&self, reason: &str, details: &str) {
        tracing::info!(seq = self.seq, reason, "pause on next statement scheduled");
        self.inner.schedule_pause_on_next_statement(reason, details);
    }
}

impl Drop for TracedSession {
    fn drop(&mut self) {
        tracing::info!(seq = self.seq, "protocol session disconnected");
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
