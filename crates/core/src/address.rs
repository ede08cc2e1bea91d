// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Formatting of advertised addresses

/// `host:port`, with IPv6 literals wrapped in brackets.
pub fn format_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// WebSocket address of a target, optionally with the `ws://` scheme.
pub fn format_ws_address(host: &str, port: u16, target_id: &str, include_protocol: bool) -> String {
    let scheme = if include_protocol { "ws://" } else { "" };
    format!("{scheme}{}/{target_id}", format_host_port(host, port))
}

/// Process label used as the default title and context name: `JSVM[<pid>]`.
pub fn human_readable_process_name() -> String {
    format!("JSVM[{}]", std::process::id())
}

#[cfg(test)]
#[path = "address_tests.rs"]
mod tests;
