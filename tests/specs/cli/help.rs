//! CLI help output specs

use crate::prelude::*;

#[test]
fn help_shows_usage_and_flags() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("--port")
        .stdout_has("--wait")
        .stdout_has("--no-console");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}

#[test]
fn unknown_flag_fails() {
    cli()
        .args(&["--inspect-brk"])
        .fails()
        .stderr_has("unexpected argument");
}
