// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bodies of the `/json/*` discovery endpoints.

use std::collections::BTreeMap;

use insp_core::{BROWSER_VERSION, PROTOCOL_VERSION};
use serde::Serialize;

/// One entry of `/json/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDescription {
    pub description: String,
    pub devtools_frontend_url: String,
    pub devtools_frontend_url_compat: String,
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub web_socket_debugger_url: String,
}

impl TargetDescription {
    /// Describe target `id` as reached through `detected_host` (`host:port`).
    pub fn new(id: &str, title: &str, url: &str, detected_host: &str) -> Self {
        let address = format!("{detected_host}/{id}");
        Self {
            description: "jsvm instance".to_string(),
            devtools_frontend_url: frontend_url(false, &address),
            devtools_frontend_url_compat: frontend_url(true, &address),
            id: id.to_string(),
            title: title.to_string(),
            kind: "node".to_string(),
            url: url.to_string(),
            web_socket_debugger_url: format!("ws://{address}"),
        }
    }
}

/// DevTools frontend URL for a WebSocket address without scheme.
pub fn frontend_url(is_compat: bool, address: &str) -> String {
    let page = if is_compat { "inspector" } else { "js_app" };
    format!("devtools://devtools/bundled/{page}.html?v8only=true&ws={address}")
}

pub fn list_body(targets: &[TargetDescription]) -> String {
    serde_json::to_string_pretty(targets).unwrap_or_else(|_| "[]".to_string())
}

pub fn version_body() -> String {
    let version = BTreeMap::from([
        ("Browser", BROWSER_VERSION),
        ("Protocol-Version", PROTOCOL_VERSION),
    ]);
    serde_json::to_string_pretty(&version).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
#[path = "endpoints_tests.rs"]
mod tests;
