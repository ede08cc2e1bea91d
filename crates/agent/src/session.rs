// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frontend sessions on either side of the thread boundary

use std::cell::RefCell;
use std::rc::Weak;
use std::sync::Arc;

use insp_core::ChannelId;

use crate::client::InspectorClient;
use crate::main_thread::{AnotherThreadObjectReference, MainThreadHandle};

/// Receives protocol messages destined for one frontend.
pub trait InspectorSessionDelegate {
    fn send_message_to_frontend(&self, message: &str);
}

/// A connected frontend, as seen by whoever feeds it messages.
pub trait InspectorSession {
    fn dispatch(&self, message: &str);
}

/// Session owned by the main thread. Disconnects on drop.
#[derive(Debug)]
pub struct SameThreadInspectorSession {
    id: ChannelId,
    client: Weak<InspectorClient>,
}

impl SameThreadInspectorSession {
    pub(crate) fn new(id: ChannelId, client: Weak<InspectorClient>) -> Self {
        Self { id, client }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }
}

impl InspectorSession for SameThreadInspectorSession {
    fn dispatch(&self, message: &str) {
        if let Some(client) = self.client.upgrade() {
            client.dispatch_message_from_frontend(self.id, message);
        }
    }
}

impl Drop for SameThreadInspectorSession {
    fn drop(&mut self) {
        if let Some(client) = self.client.upgrade() {
            client.disconnect_frontend(self.id);
        }
    }
}

/// Main-thread object backing a [`CrossThreadInspectorSession`].
pub(crate) struct MainThreadSessionState {
    client: Weak<InspectorClient>,
    prevent_shutdown: bool,
    session: RefCell<Option<SameThreadInspectorSession>>,
}

impl MainThreadSessionState {
    fn new(client: Weak<InspectorClient>, prevent_shutdown: bool) -> Self {
        Self {
            client,
            prevent_shutdown,
            session: RefCell::new(None),
        }
    }

    fn connect(&self, delegate: Box<dyn InspectorSessionDelegate + Send>) {
        let Some(client) = self.client.upgrade() else {
            tracing::debug!("inspector client gone, frontend not connected");
            return;
        };
        let id = client.connect_frontend(delegate, self.prevent_shutdown);
        *self.session.borrow_mut() = Some(SameThreadInspectorSession::new(id, self.client.clone()));
    }

    fn dispatch(&self, message: &str) {
        if let Some(session) = self.session.borrow().as_ref() {
            session.dispatch(message);
        }
    }
}

/// Session owned by the I/O thread; every operation is posted to the main
/// thread. Dropping it deletes the main-thread state, which disconnects.
pub struct CrossThreadInspectorSession {
    state: AnotherThreadObjectReference<MainThreadSessionState>,
}

impl CrossThreadInspectorSession {
    pub(crate) fn new(
        thread: Arc<MainThreadHandle>,
        delegate: Box<dyn InspectorSessionDelegate + Send>,
        prevent_shutdown: bool,
    ) -> Self {
        let state = AnotherThreadObjectReference::new(thread, move |main| {
            MainThreadSessionState::new(main.client(), prevent_shutdown)
        });
        state.call(move |state| state.connect(delegate));
        Self { state }
    }
}

impl InspectorSession for CrossThreadInspectorSession {
    fn dispatch(&self, message: &str) {
        let message = message.to_string();
        self.state.call(move |state| state.dispatch(&message));
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
