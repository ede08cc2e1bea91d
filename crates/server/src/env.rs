// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the server crate.

/// Largest accepted HTTP request head.
pub const DEFAULT_MAX_HEAD_BYTES: usize = 64 * 1024;

/// Request head limit override: INSP_HTTP_MAX_HEAD_BYTES
pub fn max_head_bytes() -> usize {
    std::env::var("INSP_HTTP_MAX_HEAD_BYTES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MAX_HEAD_BYTES)
}
