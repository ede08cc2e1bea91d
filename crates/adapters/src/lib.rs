// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters between the inspector and the VM it debugs

pub mod backend;
pub mod traced;
pub mod vm;

pub use backend::{
    BackendFactory, ContextInfo, DebuggerBackend, DebuggerClient, ExceptionDetails,
    FrontendChannel, NoOpBackend, ProtocolSession,
};
pub use traced::TracedBackend;
pub use vm::{Environment, InterruptSignal, Interrupter, LoopEnvironment};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use backend::{BackendCall, FakeBackend};
