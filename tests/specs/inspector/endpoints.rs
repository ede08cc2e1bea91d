//! HTTP discovery endpoint specs

use crate::prelude::*;

#[test]
fn json_version_reports_browser_and_protocol() {
    let mut host = cli()
        .args(&["--port", "0", "--run-for-ms", "3000"])
        .spawn();
    let port = host.port();

    let (status, body) = http_get(port, "/json/version");
    assert!(status.contains(" 200 "), "status: {status}");
    let version: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(version["Browser"].as_str().unwrap().starts_with("jsvm/v"));
    assert_eq!(version["Protocol-Version"], "1.1");
}

#[test]
fn json_list_describes_the_script() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("main.js");
    std::fs::write(&script, "debugger;\n").unwrap();
    let script_arg = script.display().to_string();

    let mut host = cli()
        .args(&["--port", "0", "--run-for-ms", "3000", "--script", &script_arg])
        .spawn();
    let url = host.ws_url();
    let port = host.port();

    let (_, body) = http_get(port, "/json/list");
    let list: serde_json::Value = serde_json::from_str(&body).unwrap();
    let target = &list[0];
    assert_eq!(target["type"], "node");
    assert_eq!(target["title"], script_arg.as_str());
    assert_eq!(target["webSocketDebuggerUrl"], url.as_str());
    assert!(target["url"].as_str().unwrap().starts_with("file://"));
}

#[test]
fn json_protocol_serves_schema() {
    let mut host = cli()
        .args(&["--port", "0", "--run-for-ms", "3000"])
        .spawn();
    let port = host.port();

    let (status, body) = http_get(port, "/json/protocol");
    assert!(status.contains(" 200 "), "status: {status}");
    let schema: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(schema["domains"].as_array().is_some_and(|d| !d.is_empty()));
}

#[test]
fn no_http_answers_404() {
    let mut host = cli()
        .args(&["--port", "0", "--run-for-ms", "3000", "--no-http"])
        .spawn();
    let port = host.port();

    let (status, _) = http_get(port, "/json/version");
    similar_asserts::assert_eq!(status, "HTTP/1.0 404 OK");
}
