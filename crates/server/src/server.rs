// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inspector socket server.
//!
//! Owns the listening sockets and the connected-session table. Runs on a
//! single task: listener and connection tasks report [`SocketEvent`]s, the
//! owner pulls them with [`InspectorSocketServer::next_event`] and applies
//! them with [`InspectorSocketServer::handle_event`].

use std::collections::BTreeMap;
use std::io::Write;

use insp_core::{format_host_port, format_ws_address, InspectPublishUid, SessionId, HELP_URL};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::endpoints::{self, TargetDescription};
use crate::http::{json_response, match_path_segment};
use crate::listener::ServerSocket;
use crate::protocol_json::protocol_json;
use crate::socket::{InspectorSocket, SocketEvent};

/// Callbacks from the server to whoever owns the debug targets.
pub trait SocketServerDelegate {
    /// A WebSocket session attached to `target_id`.
    fn start_session(&mut self, session_id: SessionId, target_id: &str);
    /// An attached session went away.
    fn end_session(&mut self, session_id: SessionId);
    fn message_received(&mut self, session_id: SessionId, message: String);
    fn target_ids(&self) -> Vec<String>;
    fn target_title(&self, target_id: &str) -> String;
    fn target_url(&self, target_id: &str) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    New,
    Running,
    Stopped,
}

/// Errors from [`InspectorSocketServer::start`].
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("unable to resolve \"{host}\": {source}")]
    Resolve {
        host: String,
        source: std::io::Error,
    },

    #[error("starting inspector on {host}:{port} failed: {source}")]
    BindFailed {
        host: String,
        port: u16,
        source: std::io::Error,
    },
}

/// One accepted connection.
#[derive(Debug)]
pub struct SocketSession {
    id: SessionId,
    server_port: u16,
    socket: Option<InspectorSocket>,
}

impl SocketSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    fn send(&self, text: impl Into<String>) {
        if let Some(socket) = &self.socket {
            socket.write(text);
        }
    }

    fn accept(&self, ws_key: &str) {
        if let Some(socket) = &self.socket {
            socket.accept_upgrade(ws_key);
        }
    }

    fn decline(&self) {
        if let Some(socket) = &self.socket {
            socket.cancel_handshake();
        }
    }

    fn close(&mut self) {
        self.socket = None;
    }
}

struct ConnectedSession {
    target_id: String,
    session: SocketSession,
}

/// HTTP + WebSocket front door of the inspector.
pub struct InspectorSocketServer {
    delegate: Option<Box<dyn SocketServerDelegate>>,
    host: String,
    port: u16,
    pid: Option<u32>,
    publish: InspectPublishUid,
    out: Option<Box<dyn Write>>,
    server_sockets: Vec<ServerSocket>,
    connected_sessions: BTreeMap<SessionId, ConnectedSession>,
    next_session_id: SessionId,
    state: ServerState,
    events_tx: mpsc::UnboundedSender<SocketEvent>,
    events_rx: mpsc::UnboundedReceiver<SocketEvent>,
}

impl InspectorSocketServer {
    /// `out` receives the human-readable banner and startup diagnostics.
    pub fn new(
        delegate: Box<dyn SocketServerDelegate>,
        host: impl Into<String>,
        port: u16,
        publish: InspectPublishUid,
        out: Option<Box<dyn Write>>,
        pid: Option<u32>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            delegate: Some(delegate),
            host: host.into(),
            port,
            pid,
            publish,
            out,
            server_sockets: Vec::new(),
            connected_sessions: BTreeMap::new(),
            next_session_id: SessionId::new(0),
            state: ServerState::New,
            events_tx,
            events_rx,
        }
    }

    /// Resolve the host and listen on every resolved address.
    ///
    /// Succeeds if at least one address could be bound.
    pub async fn start(&mut self) -> Result<(), ServerError> {
        assert_eq!(self.state, ServerState::New, "server started twice");

        let lookup = tokio::net::lookup_host((self.host.clone(), self.port)).await;
        let addrs: Vec<_> = match lookup {
            Ok(addrs) => addrs.collect(),
            Err(source) => {
                self.write_out(&format!("Unable to resolve \"{}\": {source}\n", self.host));
                error!(host = %self.host, error = %source, "inspector host did not resolve");
                return Err(ServerError::Resolve {
                    host: self.host.clone(),
                    source,
                });
            }
        };

        let mut last_error = None;
        for addr in addrs {
            match ServerSocket::listen(addr, self.pid, self.events_tx.clone()) {
                Ok(socket) => self.server_sockets.push(socket),
                Err(e) => {
                    debug!(%addr, error = %e, "bind failed");
                    last_error = Some(e);
                }
            }
        }

        if self.server_sockets.is_empty() {
            let source = last_error.unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no addresses")
            });
            self.write_out(&format!(
                "Starting inspector on {}:{} failed: {source}\n",
                self.host, self.port
            ));
            error!(host = %self.host, port = self.port, error = %source, "inspector failed to start");
            return Err(ServerError::BindFailed {
                host: self.host.clone(),
                port: self.port,
                source,
            });
        }

        self.state = ServerState::Running;
        info!(host = %self.host, port = self.port(), "inspector listening");
        self.print_debugger_ready("listening");
        Ok(())
    }

    /// Stop listening. Existing sessions stay open.
    pub fn stop(&mut self) {
        if self.state == ServerState::Stopped {
            return;
        }
        assert_eq!(self.state, ServerState::Running, "stop before start");
        self.state = ServerState::Stopped;
        self.server_sockets.clear();
        info!(sessions = self.connected_sessions.len(), "inspector stopped accepting connections");
        if self.done() {
            self.release_delegate();
        }
    }

    /// Close every session's connection.
    pub fn terminate_connections(&mut self) {
        for entry in self.connected_sessions.values_mut() {
            entry.session.close();
        }
    }

    pub fn send(&mut self, session_id: SessionId, message: &str) {
        if let Some(entry) = self.connected_sessions.get(&session_id) {
            entry.session.send(message);
        }
    }

    /// Bound port of the first listener, else the configured port.
    pub fn port(&self) -> u16 {
        self.server_sockets
            .first()
            .map(ServerSocket::port)
            .unwrap_or(self.port)
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// No listeners and no sessions remain.
    pub fn done(&self) -> bool {
        self.server_sockets.is_empty() && self.connected_sessions.is_empty()
    }

    /// Stopped and the delegate has been released.
    pub fn is_released(&self) -> bool {
        self.state == ServerState::Stopped && self.delegate.is_none()
    }

    pub fn session(&self, session_id: SessionId) -> Option<&SocketSession> {
        self.connected_sessions
            .get(&session_id)
            .map(|entry| &entry.session)
    }

    pub fn session_count(&self) -> usize {
        self.connected_sessions.len()
    }

    /// Next event from listener or connection tasks.
    pub async fn next_event(&mut self) -> Option<SocketEvent> {
        self.events_rx.recv().await
    }

    pub fn handle_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Accepted {
                server_port,
                stream,
            } => self.accept(server_port, stream),
            SocketEvent::HttpGet {
                session_id,
                host,
                path,
            } => {
                if !self.handle_get_request(session_id, &host, &path) {
                    if let Some(session) = self.session(session_id) {
                        session.decline();
                    }
                }
            }
            SocketEvent::Upgrade {
                session_id,
                path,
                ws_key,
                ..
            } => {
                let target_id = path.strip_prefix('/').unwrap_or(&path);
                self.session_started(session_id, target_id, &ws_key);
            }
            SocketEvent::Frame {
                session_id,
                message,
            } => self.message_received(session_id, message),
            SocketEvent::Closed { session_id } => self.session_terminated(session_id),
        }
    }

    /// Register a connection under the next session id.
    pub fn accept(&mut self, server_port: u16, stream: TcpStream) {
        let session_id = self.next_session_id;
        self.next_session_id = session_id.next();
        match InspectorSocket::accept(session_id, stream, self.events_tx.clone()) {
            Ok(socket) => {
                debug!(%session_id, server_port, "session accepted");
                self.connected_sessions.insert(
                    session_id,
                    ConnectedSession {
                        target_id: String::new(),
                        session: SocketSession {
                            id: session_id,
                            server_port,
                            socket: Some(socket),
                        },
                    },
                );
            }
            Err(e) => warn!(%session_id, error = %e, "failed to accept session"),
        }
    }

    /// Answer a plain GET. Returns `false` if the path is not an endpoint.
    pub fn handle_get_request(&mut self, session_id: SessionId, host: &str, path: &str) -> bool {
        let Some(session) = self.session(session_id) else {
            return true;
        };
        if !self.publish.http {
            session.send(json_response("", 404));
            return true;
        }

        let Some(command) = match_path_segment(path, "/json") else {
            return false;
        };
        if match_path_segment(command, "list").is_some() || command.is_empty() {
            self.send_list_response(session_id, host);
        } else if match_path_segment(command, "protocol").is_some() {
            match protocol_json() {
                Ok(body) => session.send(json_response(&body, 200)),
                Err(e) => {
                    error!(error = %e, "protocol schema unavailable");
                    session.send(json_response("", 500));
                }
            }
        } else if match_path_segment(command, "version").is_some() {
            session.send(json_response(&endpoints::version_body(), 200));
        } else {
            return false;
        }
        true
    }

    fn send_list_response(&self, session_id: SessionId, host: &str) {
        let (Some(delegate), Some(entry)) =
            (&self.delegate, self.connected_sessions.get(&session_id))
        else {
            return;
        };
        let session = &entry.session;
        let detected_host = if host.is_empty() {
            let local_ip = session
                .socket
                .as_ref()
                .map(|s| s.local_ip().to_string())
                .unwrap_or_default();
            format_host_port(&local_ip, session.server_port)
        } else {
            host.to_string()
        };
        let targets: Vec<TargetDescription> = delegate
            .target_ids()
            .iter()
            .map(|id| {
                TargetDescription::new(
                    id,
                    &delegate.target_title(id),
                    &delegate.target_url(id),
                    &detected_host,
                )
            })
            .collect();
        session.send(json_response(&endpoints::list_body(&targets), 200));
    }

    /// Attach a WebSocket upgrade to a target, or decline it.
    pub fn session_started(&mut self, session_id: SessionId, target_id: &str, ws_key: &str) {
        let target_exists = self
            .delegate
            .as_ref()
            .is_some_and(|d| d.target_ids().iter().any(|id| id == target_id));
        let Some(entry) = self.connected_sessions.get_mut(&session_id) else {
            return;
        };
        if !target_exists {
            debug!(%session_id, target_id, "declining upgrade for unknown target");
            entry.session.decline();
            return;
        }
        entry.target_id = target_id.to_string();
        entry.session.accept(ws_key);
        info!(%session_id, target_id, "debugger session started");
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.start_session(session_id, target_id);
        }
    }

    pub fn message_received(&mut self, session_id: SessionId, message: String) {
        let attached = self
            .connected_sessions
            .get(&session_id)
            .is_some_and(|entry| !entry.target_id.is_empty());
        if !attached {
            return;
        }
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.message_received(session_id, message);
        }
    }

    /// Forget a closed connection.
    pub fn session_terminated(&mut self, session_id: SessionId) {
        let Some(entry) = self.connected_sessions.remove(&session_id) else {
            return;
        };
        let was_attached = !entry.target_id.is_empty();
        if was_attached {
            info!(%session_id, target_id = %entry.target_id, "debugger session ended");
            if let Some(delegate) = self.delegate.as_mut() {
                delegate.end_session(session_id);
            }
        }
        if self.connected_sessions.is_empty() {
            if was_attached
                && self.state == ServerState::Running
                && !self.server_sockets.is_empty()
            {
                self.print_debugger_ready("ending");
            }
            if self.state == ServerState::Stopped {
                self.release_delegate();
            }
        }
    }

    fn release_delegate(&mut self) {
        if self.delegate.take().is_some() {
            debug!("server delegate released");
        }
    }

    fn print_debugger_ready(&mut self, verb: &str) {
        if !self.publish.console {
            return;
        }
        let Some(delegate) = &self.delegate else {
            return;
        };
        let mut text = String::new();
        for socket in &self.server_sockets {
            for id in delegate.target_ids() {
                text.push_str(&format!(
                    "Debugger {verb} on {}\n",
                    format_ws_address(&self.host, socket.port(), &id, true)
                ));
            }
        }
        text.push_str(&format!("For help, see: {HELP_URL}\n"));
        self.write_out(&text);
    }

    fn write_out(&mut self, text: &str) {
        if let Some(out) = self.out.as_mut() {
            let _ = out.write_all(text.as_bytes());
            let _ = out.flush();
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
