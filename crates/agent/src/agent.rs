// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-VM inspector facade.
//!
//! An [`Agent`] lives on the VM main thread. It owns the
//! [`InspectorClient`] and, for the main VM, the [`InspectorIo`] that serves
//! remote frontends.

use std::io;
use std::net::TcpListener;
use std::ops::RangeInclusive;
use std::rc::Rc;
use std::sync::Arc;

use insp_adapters::{BackendFactory, Environment, ExceptionDetails};
use insp_core::{ExclusiveAccess, HostPort, InspectPublishUid};
use thiserror::Error;
use tracing::{debug, info};

use crate::client::InspectorClient;
use crate::io::{InspectorIo, InspectorIoError};
use crate::session::{InspectorSessionDelegate, SameThreadInspectorSession};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no available inspector port in {start}-{end}")]
    NoAvailablePort { start: u16, end: u16 },

    #[error("inspector agent has not been started")]
    NotStarted,

    #[error("port probe failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    IoThread(#[from] InspectorIoError),
}

/// How [`Agent::start_with`] sets up the inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentOptions {
    /// Main VM thread; workers name their context after the thread id.
    pub is_main: bool,
    /// Block in [`Agent::start_with`] until a frontend releases the VM.
    pub wait_for_connect: bool,
    pub publish: InspectPublishUid,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            is_main: true,
            wait_for_connect: false,
            publish: InspectPublishUid::default(),
        }
    }
}

pub struct Agent {
    io: Option<InspectorIo>,
    client: Option<Rc<InspectorClient>>,
    env: Rc<dyn Environment>,
    factory: BackendFactory,
    path: String,
    host_port: Option<Arc<ExclusiveAccess<HostPort>>>,
    publish: InspectPublishUid,
}

impl Agent {
    pub fn new(env: Rc<dyn Environment>, factory: BackendFactory) -> Self {
        Self {
            io: None,
            client: None,
            env,
            factory,
            path: String::new(),
            host_port: None,
            publish: InspectPublishUid::default(),
        }
    }

    /// Start on the first free port of the probe range, advertising over
    /// HTTP only.
    pub fn start(&mut self, path: &str, pid: Option<u32>) -> Result<(), AgentError> {
        let port = find_available_port(crate::env::port_range())?;
        let host_port = Arc::new(ExclusiveAccess::new(HostPort::new("localhost", port, pid)));
        self.start_with(
            path,
            host_port,
            AgentOptions {
                is_main: true,
                wait_for_connect: false,
                publish: InspectPublishUid {
                    console: false,
                    http: true,
                },
            },
        )
    }

    pub fn start_with(
        &mut self,
        path: &str,
        host_port: Arc<ExclusiveAccess<HostPort>>,
        options: AgentOptions,
    ) -> Result<(), AgentError> {
        self.path = path.to_string();
        self.host_port = Some(host_port);
        self.publish = options.publish;
        self.client = Some(InspectorClient::new(
            Rc::clone(&self.env),
            &self.factory,
            options.is_main,
        ));

        self.start_io_thread()?;
        if options.wait_for_connect {
            self.wait_for_connect();
        }
        Ok(())
    }

    /// Spawn the I/O thread if it is not running.
    pub fn start_io_thread(&mut self) -> Result<(), AgentError> {
        if self.io.is_some() {
            return Ok(());
        }
        let (Some(client), Some(host_port)) = (&self.client, &self.host_port) else {
            return Err(AgentError::NotStarted);
        };
        let io = InspectorIo::start(
            client.thread_handle(),
            &self.path,
            Arc::clone(host_port),
            self.publish,
        )?;
        info!(url = %io.ws_url(), "inspector started");
        self.io = Some(io);
        Ok(())
    }

    /// Close remote sessions and join the I/O thread.
    pub fn stop(&mut self) {
        if self.io.take().is_some() {
            debug!("inspector I/O stopped");
        }
    }

    /// Attach an in-process frontend.
    pub fn connect(
        &self,
        delegate: Box<dyn InspectorSessionDelegate>,
        prevent_shutdown: bool,
    ) -> Option<SameThreadInspectorSession> {
        let client = self.client.as_ref()?;
        let id = client.connect_frontend(delegate, prevent_shutdown);
        Some(SameThreadInspectorSession::new(id, Rc::downgrade(client)))
    }

    /// Keep the VM alive until attached frontends let go.
    pub fn wait_for_disconnect(&mut self) {
        let Some(client) = self.client.clone() else {
            return;
        };
        if client.has_connected_sessions() {
            eprintln!("Waiting for the debugger to disconnect...");
        }
        client.context_destroyed();
        if let Some(io) = &self.io {
            io.stop_accepting_new_connections();
        }
        client.wait_for_sessions_disconnect();
    }

    pub fn pause_on_next_javascript_statement(&self, reason: &str) {
        if let Some(client) = &self.client {
            client.schedule_pause_on_next_statement(reason);
        }
    }

    pub fn is_active(&self) -> bool {
        match &self.client {
            Some(client) => self.io.is_some() || client.is_active(),
            None => false,
        }
    }

    pub fn is_started(&self) -> bool {
        self.client.is_some()
    }

    /// Block until a frontend sends `Runtime.runIfWaitingForDebugger`.
    pub fn wait_for_connect(&self) {
        if let Some(client) = &self.client {
            client.wait_for_frontend();
        }
    }

    pub fn ws_url(&self) -> Option<String> {
        self.io.as_ref().map(InspectorIo::ws_url)
    }

    pub fn report_uncaught_exception(&self, details: &ExceptionDetails) {
        if let Some(client) = &self.client {
            client.report_uncaught_exception(details);
        }
    }
}

/// First port in `range` that can currently be bound on all interfaces.
pub fn find_available_port(range: RangeInclusive<u16>) -> Result<u16, AgentError> {
    let (start, end) = (*range.start(), *range.end());
    for port in range {
        match TcpListener::bind(("0.0.0.0", port)) {
            Ok(_probe) => return Ok(port),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => continue,
            Err(e) => return Err(AgentError::Io(e)),
        }
    }
    Err(AgentError::NoAvailablePort { start, end })
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
