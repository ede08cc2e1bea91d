// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listening sockets owned by the server.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::socket::SocketEvent;

const BACKLOG: u32 = 511;

/// A bound TCP listener plus its accept task.
///
/// Dropping it stops accepting and closes the listening socket.
pub(crate) struct ServerSocket {
    port: u16,
    accept_task: JoinHandle<()>,
    abstract_task: Option<JoinHandle<()>>,
}

impl ServerSocket {
    /// Bind and listen on `addr`, reporting accepted connections on `events`.
    ///
    /// With a pid, also listens on the abstract unix socket
    /// `jsvm_devtools_remote_<port>_<pid>`; failure there is only logged.
    pub(crate) fn listen(
        addr: SocketAddr,
        pid: Option<u32>,
        events: mpsc::UnboundedSender<SocketEvent>,
    ) -> io::Result<Self> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(BACKLOG)?;
        let port = listener.local_addr()?.port();
        debug!(%addr, port, "listening");

        let accept_task = tokio::spawn(accept_loop(listener, port, events));
        let abstract_task = pid.and_then(|pid| listen_abstract(port, pid));
        Ok(Self {
            port,
            accept_task,
            abstract_task,
        })
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for ServerSocket {
    fn drop(&mut self) {
        self.accept_task.abort();
        if let Some(task) = &self.abstract_task {
            task.abort();
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    server_port: u16,
    events: mpsc::UnboundedSender<SocketEvent>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(port = server_port, %peer, "accepted connection");
                if events
                    .send(SocketEvent::Accepted {
                        server_port,
                        stream,
                    })
                    .is_err()
                {
                    break;
                }
            }
            Err(e) => {
                warn!(port = server_port, error = %e, "accept failed");
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn listen_abstract(port: u16, pid: u32) -> Option<JoinHandle<()>> {
    use std::os::linux::net::SocketAddrExt;
    use std::os::unix::net::{SocketAddr as UnixAddr, UnixListener as StdUnixListener};

    let name = format!("jsvm_devtools_remote_{port}_{pid}");
    let bound = UnixAddr::from_abstract_name(name.as_bytes())
        .and_then(|addr| StdUnixListener::bind_addr(&addr))
        .and_then(|listener| {
            listener.set_nonblocking(true)?;
            tokio::net::UnixListener::from_std(listener)
        });
    match bound {
        Ok(listener) => {
            debug!(name = %name, "listening on abstract socket");
            Some(tokio::spawn(async move {
                // Presence of the socket is the signal; connections carry nothing
                while let Ok((stream, _)) = listener.accept().await {
                    drop(stream);
                }
            }))
        }
        Err(e) => {
            warn!(name = %name, error = %e, "abstract socket unavailable");
            None
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn listen_abstract(_port: u16, _pid: u32) -> Option<JoinHandle<()>> {
    None
}
