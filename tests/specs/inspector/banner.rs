//! Listening banner and startup failure specs

use crate::prelude::*;

#[test]
fn ephemeral_port_banner_then_clean_exit() {
    let mut host = cli()
        .args(&["--port", "0", "--run-for-ms", "1000"])
        .spawn();

    let url = host.ws_url();
    assert!(url.starts_with("ws://127.0.0.1:"), "unexpected url {url}");
    assert!(!url.ends_with(":0/"), "port was not resolved: {url}");
    let target = url.rsplit('/').next().unwrap();
    assert_eq!(target.len(), 36, "target id should be a UUID: {target}");
    host.wait_for_line("For help, see: https://nodejs.org/en/docs/inspector");

    let (status, _stderr) = host.wait();
    assert!(status.success());
}

#[test]
fn no_console_suppresses_banner() {
    cli()
        .args(&["--port", "0", "--run-for-ms", "200", "--no-console"])
        .passes()
        .stderr_lacks("Debugger listening");
}

#[test]
fn taken_port_reports_failure_and_keeps_running() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port().to_string();

    cli()
        .args(&["--port", &port, "--run-for-ms", "200"])
        .passes()
        .stderr_has(&format!("Starting inspector on 127.0.0.1:{port} failed"))
        .stderr_lacks("Debugger listening");
}
