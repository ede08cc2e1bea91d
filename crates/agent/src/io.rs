// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inspector I/O thread.
//!
//! [`InspectorIo`] owns a dedicated thread running a current-thread tokio
//! runtime. The thread serves the socket server and drains the
//! [`RequestQueueData`] that the main thread and sessions post to.

use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread::{JoinHandle, ThreadId};

use insp_core::{
    format_ws_address, generate_target_id, human_readable_process_name, ExclusiveAccess, HostPort,
    InspectPublishUid, SessionId, TargetId,
};
use insp_server::{InspectorSocketServer, SocketServerDelegate};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::main_thread::MainThreadHandle;
use crate::request_queue::{RequestQueue, RequestQueueData, TransportAction};
use crate::session::{CrossThreadInspectorSession, InspectorSession, InspectorSessionDelegate};

#[derive(Debug, Error)]
pub enum InspectorIoError {
    #[error("failed to spawn the inspector I/O thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    #[error("failed to build the inspector runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("inspector server failed to start")]
    StartFailed,
}

/// Owner of the I/O thread. Dropping it closes every session and joins.
pub struct InspectorIo {
    thread: Option<JoinHandle<()>>,
    thread_id: ThreadId,
    queue: Arc<RequestQueue>,
    host_port: Arc<ExclusiveAccess<HostPort>>,
    target_id: TargetId,
}

impl std::fmt::Debug for InspectorIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InspectorIo")
            .field("target_id", &self.target_id)
            .finish_non_exhaustive()
    }
}

struct IoThreadContext {
    main_thread: Arc<MainThreadHandle>,
    script_name: String,
    target_id: TargetId,
    host_port: Arc<ExclusiveAccess<HostPort>>,
    publish: InspectPublishUid,
}

impl InspectorIo {
    /// Spawn the I/O thread and wait until its server is listening.
    ///
    /// On success the bound port has been written back into `host_port`.
    pub fn start(
        main_thread: Arc<MainThreadHandle>,
        script_name: &str,
        host_port: Arc<ExclusiveAccess<HostPort>>,
        publish: InspectPublishUid,
    ) -> Result<Self, InspectorIoError> {
        let target_id = generate_target_id();
        let context = IoThreadContext {
            main_thread,
            script_name: script_name.to_string(),
            target_id: target_id.clone(),
            host_port: Arc::clone(&host_port),
            publish,
        };
        let (started_tx, started_rx) = mpsc::channel();
        let thread = std::thread::Builder::new()
            .name("inspector-io".to_string())
            .spawn(move || run_io_thread(context, started_tx))
            .map_err(InspectorIoError::ThreadSpawn)?;
        let thread_id = thread.thread().id();

        let started = started_rx.recv().unwrap_or(Err(InspectorIoError::StartFailed));
        match started {
            Ok(queue) if !queue.expired() => Ok(Self {
                thread: Some(thread),
                thread_id,
                queue,
                host_port,
                target_id,
            }),
            outcome => {
                if thread.join().is_err() {
                    error!("inspector I/O thread panicked during startup");
                }
                Err(outcome.err().unwrap_or(InspectorIoError::StartFailed))
            }
        }
    }

    /// Stop listening; attached sessions stay open.
    pub fn stop_accepting_new_connections(&self) {
        self.queue
            .post(SessionId::new(0), TransportAction::Stop, None);
    }

    pub fn ws_url(&self) -> String {
        let host_port = self.host_port.lock();
        format_ws_address(
            host_port.host(),
            host_port.port(),
            self.target_id.as_str(),
            true,
        )
    }

    pub fn target_id(&self) -> &TargetId {
        &self.target_id
    }
}

impl Drop for InspectorIo {
    fn drop(&mut self) {
        assert_ne!(
            std::thread::current().id(),
            self.thread_id,
            "inspector I/O dropped on its own thread"
        );
        self.queue
            .post(SessionId::new(0), TransportAction::Kill, None);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("inspector I/O thread panicked");
            }
        }
        debug!(target_id = %self.target_id, "inspector I/O thread joined");
    }
}

type Started = Result<Arc<RequestQueue>, InspectorIoError>;

fn run_io_thread(context: IoThreadContext, started: mpsc::Sender<Started>) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let _ = started.send(Err(InspectorIoError::Runtime(e)));
            return;
        }
    };
    runtime.block_on(serve(context, started));
}

async fn serve(context: IoThreadContext, started: mpsc::Sender<Started>) {
    let queue = RequestQueueData::new();
    let (host, port, pid) = {
        let host_port = context.host_port.lock();
        (host_port.host().to_string(), host_port.port(), host_port.pid())
    };
    let delegate = IoDelegate::new(
        queue.handle(),
        context.main_thread,
        &context.script_name,
        context.target_id,
        context.publish,
    );
    let mut server = InspectorSocketServer::new(
        Box::new(delegate),
        host,
        port,
        context.publish,
        Some(Box::new(std::io::stderr())),
        pid,
    );

    if let Err(e) = server.start().await {
        error!(error = %e, "inspector I/O thread exiting");
        queue.close_and_free();
        let _ = started.send(Ok(queue.handle()));
        return;
    }
    context.host_port.lock().set_port(server.port());
    let _ = started.send(Ok(queue.handle()));

    while !server.is_released() {
        tokio::select! {
            event = server.next_event() => match event {
                Some(event) => server.handle_event(event),
                None => break,
            },
            () = queue.notified() => queue.dispatch(&mut server),
        }
    }
    queue.close_and_free();
    debug!("inspector I/O loop finished");
}

/// Posts outbound protocol messages for one socket session.
struct IoSessionDelegate {
    queue: Arc<RequestQueue>,
    session_id: SessionId,
}

impl InspectorSessionDelegate for IoSessionDelegate {
    fn send_message_to_frontend(&self, message: &str) {
        self.queue.post(
            self.session_id,
            TransportAction::SendMessage,
            Some(message.to_string()),
        );
    }
}

/// Bridges socket sessions to cross-thread inspector sessions.
struct IoDelegate {
    queue: Arc<RequestQueue>,
    main_thread: Arc<MainThreadHandle>,
    sessions: HashMap<SessionId, CrossThreadInspectorSession>,
    script_name: String,
    script_path: String,
    target_id: TargetId,
    publish: InspectPublishUid,
}

impl IoDelegate {
    fn new(
        queue: Arc<RequestQueue>,
        main_thread: Arc<MainThreadHandle>,
        script_name: &str,
        target_id: TargetId,
        publish: InspectPublishUid,
    ) -> Self {
        let script_path = if script_name.is_empty() {
            String::new()
        } else {
            std::fs::canonicalize(script_name)
                .map(|path| path.display().to_string())
                .unwrap_or_else(|_| script_name.to_string())
        };
        Self {
            queue,
            main_thread,
            sessions: HashMap::new(),
            script_name: script_name.to_string(),
            script_path,
            target_id,
            publish,
        }
    }
}

impl SocketServerDelegate for IoDelegate {
    fn start_session(&mut self, session_id: SessionId, _target_id: &str) {
        let delegate = IoSessionDelegate {
            queue: Arc::clone(&self.queue),
            session_id,
        };
        let session = self.main_thread.connect(Box::new(delegate), true);
        if self.sessions.insert(session_id, session).is_some() {
            warn!(%session_id, "replaced an existing inspector session");
        }
        info!(%session_id, "debugger attached");
        if self.publish.console {
            eprintln!("Debugger attached.");
        }
    }

    fn end_session(&mut self, session_id: SessionId) {
        self.sessions.remove(&session_id);
    }

    fn message_received(&mut self, session_id: SessionId, message: String) {
        match self.sessions.get(&session_id) {
            Some(session) => session.dispatch(&message),
            None => debug!(%session_id, "message for unknown session dropped"),
        }
    }

    fn target_ids(&self) -> Vec<String> {
        vec![self.target_id.to_string()]
    }

    fn target_title(&self, _target_id: &str) -> String {
        if self.script_name.is_empty() {
            human_readable_process_name()
        } else {
            self.script_name.clone()
        }
    }

    fn target_url(&self, _target_id: &str) -> String {
        format!("file://{}", self.script_path)
    }
}

#[cfg(test)]
#[path = "io_tests.rs"]
mod tests;
