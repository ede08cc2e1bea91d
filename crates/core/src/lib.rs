// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! insp-core: shared types for the JSVM inspector transport

pub mod address;
pub mod host_port;
pub mod id;

pub use address::{format_host_port, format_ws_address, human_readable_process_name};
pub use host_port::{ExclusiveAccess, HostPort, InspectPublishUid};
pub use id::{generate_target_id, ChannelId, ObjectId, SessionId, TargetId};

/// Reported as `Browser` by `/json/version`.
pub const BROWSER_VERSION: &str = concat!("jsvm/v", env!("CARGO_PKG_VERSION"));

/// Reported as `Protocol-Version` by `/json/version`.
pub const PROTOCOL_VERSION: &str = "1.1";

/// Printed under the listening banner.
pub const HELP_URL: &str = "https://nodejs.org/en/docs/inspector";

/// Port used when no explicit port is configured.
pub const DEFAULT_INSPECTOR_PORT: u16 = 9229;

/// Context group of the single debuggable context.
pub const CONTEXT_GROUP_ID: i32 = 1;
