// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection task: HTTP handshake, then WebSocket frames.
//!
//! The task owns the stream. The server talks to it through
//! [`InspectorSocket`] commands and hears back through [`SocketEvent`]s;
//! dropping the [`InspectorSocket`] closes the connection.

use std::io;
use std::net::IpAddr;

use futures_util::{SinkExt, StreamExt};
use insp_core::SessionId;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Role;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, trace};

use crate::http::{self, Handshake, HttpError};

/// Reported by listener and connection tasks to the server.
#[derive(Debug)]
pub enum SocketEvent {
    /// A listener accepted a TCP connection.
    Accepted { server_port: u16, stream: TcpStream },
    /// A plain GET request passed the handshake checks.
    HttpGet {
        session_id: SessionId,
        host: String,
        path: String,
    },
    /// A WebSocket upgrade request passed the handshake checks.
    Upgrade {
        session_id: SessionId,
        host: String,
        path: String,
        ws_key: String,
    },
    /// A WebSocket message arrived.
    Frame {
        session_id: SessionId,
        message: String,
    },
    /// The connection task ended.
    Closed { session_id: SessionId },
}

#[derive(Debug)]
enum SocketCommand {
    Write(String),
    AcceptUpgrade(String),
    CancelHandshake,
}

/// Errors that end a connection.
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("bad request: {0}")]
    Http(#[from] HttpError),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

/// Server-side handle to one connection task.
#[derive(Debug)]
pub struct InspectorSocket {
    commands: mpsc::UnboundedSender<SocketCommand>,
    local_ip: IpAddr,
}

impl InspectorSocket {
    /// Take ownership of an accepted stream and start its connection task.
    ///
    /// Fails if the socket cannot be queried, in which case the stream is
    /// closed and no task runs.
    pub fn accept(
        session_id: SessionId,
        stream: TcpStream,
        events: mpsc::UnboundedSender<SocketEvent>,
    ) -> io::Result<Self> {
        let local_ip = stream.local_addr()?.ip();
        stream.set_nodelay(true)?;
        let (commands, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(run(session_id, stream, command_rx, events));
        Ok(Self { commands, local_ip })
    }

    /// Raw bytes during the handshake, a text frame after the upgrade.
    pub fn write(&self, text: impl Into<String>) {
        let _ = self.commands.send(SocketCommand::Write(text.into()));
    }

    /// Complete the WebSocket upgrade with the client's key.
    pub fn accept_upgrade(&self, ws_key: &str) {
        let _ = self
            .commands
            .send(SocketCommand::AcceptUpgrade(ws_key.to_string()));
    }

    /// Answer 400 and close.
    pub fn cancel_handshake(&self) {
        let _ = self.commands.send(SocketCommand::CancelHandshake);
    }

    /// Local address the client connected to.
    pub fn local_ip(&self) -> IpAddr {
        self.local_ip
    }
}

/// Reports [`SocketEvent::Closed`] when dropped, including on unwind.
struct ClosedOnDrop {
    session_id: SessionId,
    events: mpsc::UnboundedSender<SocketEvent>,
}

impl Drop for ClosedOnDrop {
    fn drop(&mut self) {
        let _ = self.events.send(SocketEvent::Closed {
            session_id: self.session_id,
        });
    }
}

async fn run(
    session_id: SessionId,
    stream: TcpStream,
    commands: mpsc::UnboundedReceiver<SocketCommand>,
    events: mpsc::UnboundedSender<SocketEvent>,
) {
    let closed = ClosedOnDrop {
        session_id,
        events,
    };
    match serve(session_id, stream, commands, &closed.events).await {
        Ok(()) => debug!(%session_id, "connection closed"),
        Err(e) => debug!(%session_id, error = %e, "connection closed with error"),
    }
}

async fn serve(
    session_id: SessionId,
    mut stream: TcpStream,
    mut commands: mpsc::UnboundedReceiver<SocketCommand>,
    events: &mpsc::UnboundedSender<SocketEvent>,
) -> Result<(), SocketError> {
    let max_head = crate::env::max_head_bytes();
    let mut buf = Vec::with_capacity(1024);
    let mut upgrade_pending = false;

    let ws_key = loop {
        while !upgrade_pending {
            let parsed = match http::parse_request(&buf, max_head) {
                Ok(parsed) => parsed,
                Err(e) => {
                    let _ = stream.write_all(http::HANDSHAKE_FAILED_RESPONSE.as_bytes()).await;
                    return Err(e.into());
                }
            };
            let Some((request, consumed)) = parsed else {
                break;
            };
            buf.drain(..consumed);
            trace!(%session_id, method = %request.method, path = %request.path, "request");
            let event = match http::classify(&request) {
                Handshake::Reject => {
                    stream
                        .write_all(http::HANDSHAKE_FAILED_RESPONSE.as_bytes())
                        .await?;
                    return Ok(());
                }
                Handshake::Get { host, path } => SocketEvent::HttpGet {
                    session_id,
                    host,
                    path,
                },
                Handshake::Upgrade { host, path, ws_key } => {
                    upgrade_pending = true;
                    SocketEvent::Upgrade {
                        session_id,
                        host,
                        path,
                        ws_key,
                    }
                }
            };
            if events.send(event).is_err() {
                return Ok(());
            }
        }

        tokio::select! {
            read = stream.read_buf(&mut buf) => {
                if read? == 0 {
                    return Ok(());
                }
            }
            command = commands.recv() => match command {
                None => return Ok(()),
                Some(SocketCommand::Write(text)) => stream.write_all(text.as_bytes()).await?,
                Some(SocketCommand::CancelHandshake) => {
                    stream.write_all(http::HANDSHAKE_FAILED_RESPONSE.as_bytes()).await?;
                    stream.shutdown().await?;
                    return Ok(());
                }
                Some(SocketCommand::AcceptUpgrade(ws_key)) => break ws_key,
            },
        }
    };

    stream
        .write_all(http::upgrade_response(&ws_key).as_bytes())
        .await?;
    debug!(%session_id, "websocket upgrade complete");

    let ws = WebSocketStream::from_partially_read(stream, buf, Role::Server, None).await;
    let (mut sink, mut source) = ws.split();
    loop {
        tokio::select! {
            frame = source.next() => match frame {
                None | Some(Ok(Message::Close(_))) => return Ok(()),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(Message::Text(message))) => {
                    if events.send(SocketEvent::Frame { session_id, message }).is_err() {
                        return Ok(());
                    }
                }
                Some(Ok(Message::Binary(bytes))) => {
                    let message = String::from_utf8_lossy(&bytes).into_owned();
                    if events.send(SocketEvent::Frame { session_id, message }).is_err() {
                        return Ok(());
                    }
                }
                Some(Ok(_)) => {}
            },
            command = commands.recv() => match command {
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(());
                }
                Some(SocketCommand::Write(text)) => sink.send(Message::Text(text)).await?,
                Some(_) => {}
            },
        }
    }
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
