// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const MAX: usize = 64 * 1024;

fn parse(raw: &str) -> HttpRequest {
    let (request, consumed) = parse_request(raw.as_bytes(), MAX).unwrap().unwrap();
    assert_eq!(consumed, raw.len());
    request
}

#[test]
fn parses_get_request() {
    let request = parse("GET /json/version HTTP/1.1\r\nHost: localhost:9229\r\n\r\n");
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/json/version");
    assert_eq!(request.host(), "localhost:9229");
    assert!(!request.is_upgrade());
}

#[test]
fn incomplete_head_waits_for_more() {
    assert_eq!(
        parse_request(b"GET /json HTTP/1.1\r\nHost: x", MAX),
        Ok(None)
    );
}

#[test]
fn body_is_consumed_with_the_request() {
    let raw = "GET / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcGET";
    let (_, consumed) = parse_request(raw.as_bytes(), MAX).unwrap().unwrap();
    assert_eq!(&raw[consumed..], "GET");

    let partial = "GET / HTTP/1.1\r\nContent-Length: 3\r\n\r\na";
    assert_eq!(parse_request(partial.as_bytes(), MAX), Ok(None));
}

#[test]
fn oversized_head_is_rejected() {
    let raw = format!("GET / HTTP/1.1\r\nX: {}", "a".repeat(100));
    assert_eq!(
        parse_request(raw.as_bytes(), 32),
        Err(HttpError::HeadTooLarge { max: 32 })
    );
}

#[parameterized(
    missing_version = { "GET /\r\n\r\n" },
    extra_token = { "GET / HTTP/1.1 x\r\n\r\n" },
    bad_version = { "GET / FTP/1.0\r\n\r\n" },
)]
fn malformed_request_lines(raw: &str) {
    assert!(matches!(
        parse_request(raw.as_bytes(), MAX),
        Err(HttpError::MalformedRequestLine(_))
    ));
}

#[test]
fn malformed_header_line() {
    assert!(matches!(
        parse_request(b"GET / HTTP/1.1\r\nno-colon\r\n\r\n", MAX),
        Err(HttpError::MalformedHeader(_))
    ));
}

#[parameterized(
    overflowing = { "GET / HTTP/1.1\r\nContent-Length: 18446744073709551615\r\n\r\n" },
    over_limit = { "GET / HTTP/1.1\r\nContent-Length: 65537\r\n\r\n" },
)]
fn oversized_body_is_an_error(raw: &str) {
    assert_eq!(
        parse_request(raw.as_bytes(), MAX),
        Err(HttpError::BodyTooLarge { max: MAX })
    );
}

#[test]
fn content_length_beyond_usize_is_invalid() {
    assert!(matches!(
        parse_request(b"GET / HTTP/1.1\r\nContent-Length: 99999999999999999999999\r\n\r\n", MAX),
        Err(HttpError::InvalidContentLength(_))
    ));
}

#[test]
fn duplicate_headers_read_as_empty() {
    let request = parse("GET / HTTP/1.1\r\nHost: a\r\nhost: b\r\n\r\n");
    assert_eq!(request.host(), "");
}

#[test]
fn classifies_upgrade() {
    let request = parse(
        "GET /abc HTTP/1.1\r\nHost: 127.0.0.1:9229\r\nUpgrade: websocket\r\n\
         Connection: keep-alive, Upgrade\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n",
    );
    assert_eq!(
        classify(&request),
        Handshake::Upgrade {
            host: "127.0.0.1:9229".to_string(),
            path: "/abc".to_string(),
            ws_key: "dGhlIHNhbXBsZSBub25jZQ==".to_string(),
        }
    );
}

#[parameterized(
    post = { "POST /json HTTP/1.1\r\nHost: localhost\r\n\r\n" },
    foreign_host = { "GET /json HTTP/1.1\r\nHost: evil.example.com\r\n\r\n" },
    repeated_host = { "GET /json HTTP/1.1\r\nHost: evil.example\r\nHost: evil.example\r\n\r\n" },
    repeated_local_host = { "GET /json HTTP/1.1\r\nHost: localhost\r\nhost: localhost\r\n\r\n" },
    upgrade_without_key = { "GET /abc HTTP/1.1\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n" },
)]
fn classifies_rejections(raw: &str) {
    assert_eq!(classify(&parse(raw)), Handshake::Reject);
}

#[parameterized(
    empty = { "", true },
    localhost = { "localhost", true },
    localhost_upper_with_port = { "LOCALHOST:9229", true },
    loopback = { "127.0.0.1:9229", true },
    any_ipv4 = { "0.0.0.0:9229", false },
    zero_net = { "0.1.2.3", false },
    ipv6_loopback = { "[::1]:9229", true },
    ipv6_unspecified = { "[::]:9229", false },
    ipv6_scoped = { "[fe80::1%eth0]:9229", false },
    bare_ipv6 = { "::1", false },
    dns_name = { "example.com:9229", false },
    partial_ipv4 = { "127.1", false },
)]
fn host_allow_list(host: &str, allowed: bool) {
    assert_eq!(is_allowed_host(host), allowed);
}

#[parameterized(
    exact = { "/json", "/json", Some("") },
    with_rest = { "/json/list", "/json", Some("list") },
    case_insensitive = { "/JSON/Version", "/json", Some("Version") },
    trailing_slash = { "list/", "list", Some("") },
    longer_word = { "/jsonx", "/json", None },
    too_short = { "/js", "/json", None },
    query = { "/json?x=1", "/json", None },
)]
fn path_segment_matching(path: &str, segment: &str, expected: Option<&str>) {
    assert_eq!(match_path_segment(path, segment), expected);
}

#[test]
fn json_response_headers() {
    assert_eq!(
        json_response("{}", 200),
        "HTTP/1.0 200 OK\r\nContent-Type: application/json; charset=UTF-8\r\n\
         Cache-Control: no-cache\r\nContent-Length: 2\r\n\r\n{}"
    );
}

#[test]
fn upgrade_response_carries_accept_key() {
    let response = upgrade_response("dGhlIHNhbXBsZSBub25jZQ==");
    assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
    assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
    assert!(response.ends_with("\r\n\r\n"));
}
