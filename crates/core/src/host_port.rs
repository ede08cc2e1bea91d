// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listening address shared between the main thread and the I/O thread

use parking_lot::{Mutex, MutexGuard};

/// Value guarded by a mutex, read and written only through a scoped guard.
///
/// Both threads hold it behind an `Arc`; the guard keeps every access short.
#[derive(Debug, Default)]
pub struct ExclusiveAccess<T> {
    inner: Mutex<T>,
}

impl<T> ExclusiveAccess<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Scoped access; the lock is released when the guard drops.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }
}

/// Host, port and owning process of the inspector endpoint.
///
/// The port is 0 until a listener binds, after which the I/O thread stores
/// the bound port here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPort {
    host_name: String,
    port: u16,
    pid: Option<u32>,
}

impl HostPort {
    pub fn new(host_name: impl Into<String>, port: u16, pid: Option<u32>) -> Self {
        Self {
            host_name: host_name.into(),
            port,
            pid,
        }
    }

    pub fn host(&self) -> &str {
        &self.host_name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }
}

impl Default for HostPort {
    fn default() -> Self {
        Self::new("127.0.0.1", crate::DEFAULT_INSPECTOR_PORT, None)
    }
}

/// Where the inspector advertises its endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectPublishUid {
    /// Print the `Debugger listening on ...` banner.
    pub console: bool,
    /// Serve the `/json/*` discovery endpoints.
    pub http: bool,
}

impl Default for InspectPublishUid {
    fn default() -> Self {
        Self {
            console: true,
            http: true,
        }
    }
}

#[cfg(test)]
#[path = "host_port_tests.rs"]
mod tests;
