// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the agent crate.

use std::ops::RangeInclusive;

use insp_core::DEFAULT_INSPECTOR_PORT;

/// Ports probed when no port is configured.
pub const DEFAULT_PORT_RANGE: RangeInclusive<u16> = DEFAULT_INSPECTOR_PORT..=9999;

/// Probe range override: INSP_PORT_RANGE (`start-end`, inclusive)
pub fn port_range() -> RangeInclusive<u16> {
    std::env::var("INSP_PORT_RANGE")
        .ok()
        .and_then(|s| parse_port_range(&s))
        .unwrap_or(DEFAULT_PORT_RANGE)
}

fn parse_port_range(s: &str) -> Option<RangeInclusive<u16>> {
    let (start, end) = s.split_once('-')?;
    let start = start.trim().parse::<u16>().ok()?;
    let end = end.trim().parse::<u16>().ok()?;
    (start > 0 && start <= end).then_some(start..=end)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
