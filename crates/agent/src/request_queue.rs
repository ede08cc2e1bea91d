// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox carrying transport requests to the I/O thread.
//!
//! Any thread posts; the I/O loop drains in FIFO batches. The queue wakes
//! the loop through a [`Notify`] only on the empty to non-empty transition,
//! the same way the daemon's event bus wakes its engine.

use std::collections::VecDeque;
use std::sync::Arc;

use insp_core::SessionId;
use insp_server::InspectorSocketServer;
use parking_lot::{Condvar, Mutex};
use tokio::sync::Notify;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    /// Close every session, then stop listening.
    Kill,
    SendMessage,
    /// Stop listening; sessions stay open.
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToServer {
    pub action: TransportAction,
    pub session_id: SessionId,
    pub message: Option<String>,
}

/// Operations a [`RequestToServer`] can apply.
pub trait TransportTarget {
    fn terminate_connections(&mut self);
    fn stop(&mut self);
    fn send(&mut self, session_id: SessionId, message: &str);
}

impl TransportTarget for InspectorSocketServer {
    fn terminate_connections(&mut self) {
        InspectorSocketServer::terminate_connections(self);
    }

    fn stop(&mut self) {
        InspectorSocketServer::stop(self);
    }

    fn send(&mut self, session_id: SessionId, message: &str) {
        InspectorSocketServer::send(self, session_id, message);
    }
}

impl RequestToServer {
    pub fn dispatch(self, target: &mut impl TransportTarget) {
        trace!(action = ?self.action, session_id = %self.session_id, "transport request");
        match self.action {
            TransportAction::Kill => {
                target.terminate_connections();
                target.stop();
            }
            TransportAction::Stop => target.stop(),
            TransportAction::SendMessage => {
                if let Some(message) = &self.message {
                    target.send(self.session_id, message);
                }
            }
        }
    }
}

/// Queue storage, owned by the I/O thread.
pub struct RequestQueueData {
    messages: Mutex<VecDeque<RequestToServer>>,
    incoming: Condvar,
    wake: Notify,
    handle: Arc<RequestQueue>,
}

impl RequestQueueData {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            messages: Mutex::new(VecDeque::new()),
            incoming: Condvar::new(),
            wake: Notify::new(),
            handle: Arc::new(RequestQueue {
                data: Mutex::new(Some(weak.clone())),
            }),
        })
    }

    /// Handle for producers on any thread.
    pub fn handle(&self) -> Arc<RequestQueue> {
        Arc::clone(&self.handle)
    }

    pub fn post(&self, session_id: SessionId, action: TransportAction, message: Option<String>) {
        let mut messages = self.messages.lock();
        let notify = messages.is_empty();
        messages.push_back(RequestToServer {
            action,
            session_id,
            message,
        });
        if notify {
            self.wake.notify_one();
            self.incoming.notify_all();
        }
    }

    /// Block the calling thread until a request is queued.
    pub fn wait(&self) {
        let mut messages = self.messages.lock();
        while messages.is_empty() {
            self.incoming.wait(&mut messages);
        }
    }

    /// Resolves once a post made the queue non-empty.
    pub async fn notified(&self) {
        self.wake.notified().await;
    }

    /// Apply queued requests in order until the queue stays empty.
    pub fn dispatch(&self, target: &mut impl TransportTarget) {
        loop {
            let batch = std::mem::take(&mut *self.messages.lock());
            if batch.is_empty() {
                break;
            }
            for request in batch {
                request.dispatch(target);
            }
        }
    }

    /// Detach the handle; later posts are dropped.
    pub fn close_and_free(&self) {
        self.handle.reset();
    }
}

/// Weak handle to a [`RequestQueueData`].
///
/// Posts after the queue is gone or reset are silently dropped.
pub struct RequestQueue {
    data: Mutex<Option<std::sync::Weak<RequestQueueData>>>,
}

impl RequestQueue {
    pub fn post(&self, session_id: SessionId, action: TransportAction, message: Option<String>) {
        let data = self.data.lock().as_ref().and_then(std::sync::Weak::upgrade);
        match data {
            Some(data) => data.post(session_id, action, message),
            None => trace!(?action, %session_id, "request dropped after transport teardown"),
        }
    }

    pub fn expired(&self) -> bool {
        self.data
            .lock()
            .as_ref()
            .and_then(std::sync::Weak::upgrade)
            .is_none()
    }

    pub fn reset(&self) {
        *self.data.lock() = None;
    }
}

#[cfg(test)]
#[path = "request_queue_tests.rs"]
mod tests;
