// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Main-thread inspector client.
//!
//! Owns the protocol backend, the table of connected frontend channels and
//! the nested message loop that runs while the VM is paused or waiting for a
//! frontend.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use insp_adapters::{
    BackendFactory, ContextInfo, DebuggerBackend, DebuggerClient, Environment, ExceptionDetails,
    FrontendChannel, ProtocolSession,
};
use insp_core::{human_readable_process_name, ChannelId, CONTEXT_GROUP_ID};
use tracing::{debug, info};

use crate::main_thread::{MainThreadHandle, MainThreadInterface};
use crate::session::InspectorSessionDelegate;

const DEFAULT_CONTEXT_AUX_DATA: &str = r#"{"isDefault":true}"#;

/// Forwards backend output to a session delegate.
struct DelegateChannel {
    delegate: Rc<dyn InspectorSessionDelegate>,
}

impl FrontendChannel for DelegateChannel {
    fn send_response(&self, _call_id: i64, message: &str) {
        self.delegate.send_message_to_frontend(message);
    }

    fn send_notification(&self, message: &str) {
        self.delegate.send_message_to_frontend(message);
    }
}

struct ChannelImpl {
    session: Box<dyn ProtocolSession>,
    prevent_shutdown: bool,
}

pub struct InspectorClient {
    env: Rc<dyn Environment>,
    backend: Box<dyn DebuggerBackend>,
    channels: RefCell<BTreeMap<ChannelId, Rc<ChannelImpl>>>,
    next_channel_id: Cell<ChannelId>,
    waiting_for_resume: Cell<bool>,
    waiting_for_frontend: Cell<bool>,
    waiting_for_sessions_disconnect: Cell<bool>,
    running_nested_loop: Cell<bool>,
    is_main: bool,
    interface: RefCell<Option<Rc<MainThreadInterface>>>,
    weak_self: Weak<InspectorClient>,
}

impl InspectorClient {
    /// Create the client and announce the default context to the backend.
    pub fn new(env: Rc<dyn Environment>, factory: &BackendFactory, is_main: bool) -> Rc<Self> {
        let client = Rc::new_cyclic(|weak: &Weak<InspectorClient>| {
            let debugger_client: Weak<dyn DebuggerClient> = weak.clone();
            Self {
                backend: factory(debugger_client),
                env,
                channels: RefCell::new(BTreeMap::new()),
                next_channel_id: Cell::new(ChannelId::new(1)),
                waiting_for_resume: Cell::new(false),
                waiting_for_frontend: Cell::new(false),
                waiting_for_sessions_disconnect: Cell::new(false),
                running_nested_loop: Cell::new(false),
                is_main,
                interface: RefCell::new(None),
                weak_self: weak.clone(),
            }
        });

        let name = if is_main {
            human_readable_process_name()
        } else {
            format!("Worker[{}]", client.env.thread_id())
        };
        client.backend.context_created(&ContextInfo {
            group_id: CONTEXT_GROUP_ID,
            name,
            origin: String::new(),
            aux_data: DEFAULT_CONTEXT_AUX_DATA.to_string(),
            is_default: true,
        });
        client
    }

    /// Register a frontend; output for it goes to `delegate`.
    pub fn connect_frontend(
        &self,
        delegate: Box<dyn InspectorSessionDelegate>,
        prevent_shutdown: bool,
    ) -> ChannelId {
        let id = self.next_channel_id.get();
        self.next_channel_id.set(id.next());
        let channel = DelegateChannel {
            delegate: Rc::from(delegate),
        };
        let session = self.backend.connect(CONTEXT_GROUP_ID, Box::new(channel));
        self.channels.borrow_mut().insert(
            id,
            Rc::new(ChannelImpl {
                session,
                prevent_shutdown,
            }),
        );
        info!(channel_id = %id, prevent_shutdown, "frontend connected");
        id
    }

    pub fn disconnect_frontend(&self, id: ChannelId) {
        let removed = self.channels.borrow_mut().remove(&id);
        if removed.is_none() {
            return;
        }
        // Backend session is torn down outside the table borrow
        drop(removed);
        info!(channel_id = %id, "frontend disconnected");
        if self.waiting_for_sessions_disconnect.get() && !self.is_main {
            self.waiting_for_sessions_disconnect.set(false);
        }
    }

    pub fn dispatch_message_from_frontend(&self, id: ChannelId, message: &str) {
        let channel = self.channels.borrow().get(&id).cloned();
        match channel {
            Some(channel) => channel.session.dispatch_protocol_message(message),
            None => debug!(channel_id = %id, "message for disconnected frontend dropped"),
        }
    }

    pub fn schedule_pause_on_next_statement(&self, reason: &str) {
        for channel in self.channel_snapshot() {
            channel.session.schedule_pause_on_next_statement(reason, reason);
        }
    }

    /// Whether any frontend that keeps the process alive is attached.
    pub fn has_connected_sessions(&self) -> bool {
        self.channels
            .borrow()
            .values()
            .any(|channel| channel.prevent_shutdown)
    }

    /// Whether any frontend is attached or the VM is waiting for one.
    pub fn is_active(&self) -> bool {
        !self.channels.borrow().is_empty() || self.waiting_for_frontend.get()
    }

    pub fn is_waiting_for_frontend(&self) -> bool {
        self.waiting_for_frontend.get()
    }

    pub fn is_running_nested_loop(&self) -> bool {
        self.running_nested_loop.get()
    }

    /// Handle other threads use to reach this client; created on first use.
    pub fn thread_handle(&self) -> Arc<MainThreadHandle> {
        self.interface().handle()
    }

    pub fn context_destroyed(&self) {
        self.backend.context_destroyed(CONTEXT_GROUP_ID);
    }

    pub fn report_uncaught_exception(&self, details: &ExceptionDetails) {
        self.backend.exception_thrown(details);
    }

    /// Block until a frontend sends `Runtime.runIfWaitingForDebugger`.
    pub fn wait_for_frontend(&self) {
        self.waiting_for_frontend.set(true);
        self.run_message_loop();
    }

    /// Block until every prevent-shutdown frontend has disconnected.
    pub fn wait_for_sessions_disconnect(&self) {
        self.waiting_for_sessions_disconnect.set(true);
        self.run_message_loop();
    }

    fn interface(&self) -> Rc<MainThreadInterface> {
        let mut interface = self.interface.borrow_mut();
        match interface.as_ref() {
            Some(existing) => Rc::clone(existing),
            None => {
                let created = MainThreadInterface::new(self.env.as_ref(), self.weak_self.clone());
                *interface = Some(Rc::clone(&created));
                created
            }
        }
    }

    fn channel_snapshot(&self) -> Vec<Rc<ChannelImpl>> {
        self.channels.borrow().values().cloned().collect()
    }

    fn should_run_message_loop(&self) -> bool {
        if self.waiting_for_frontend.get() {
            return true;
        }
        if self.waiting_for_sessions_disconnect.get() || self.waiting_for_resume.get() {
            return self.has_connected_sessions();
        }
        false
    }

    fn run_message_loop(&self) {
        if self.running_nested_loop.replace(true) {
            return;
        }
        debug!("entering nested message loop");
        let interface = self.interface();
        while self.should_run_message_loop() {
            interface.wait_for_frontend_event();
            self.env.run_and_clear_interrupts();
            // The interrupt may have been consumed already
            interface.dispatch_messages();
        }
        self.running_nested_loop.set(false);
        debug!("left nested message loop");
    }
}

impl DebuggerClient for InspectorClient {
    fn run_message_loop_on_pause(&self, _context_group_id: i32) {
        self.waiting_for_resume.set(true);
        self.run_message_loop();
    }

    fn quit_message_loop_on_pause(&self) {
        self.waiting_for_resume.set(false);
    }

    fn run_if_waiting_for_debugger(&self, _context_group_id: i32) {
        self.waiting_for_frontend.set(false);
    }

    fn current_time_ms(&self) -> f64 {
        self.env.current_time_ms()
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
