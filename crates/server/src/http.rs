// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handshake parsing and fixed responses.
//!
//! Only what the inspector handshake needs: the request line, headers, the
//! `Host` allow-list and the WebSocket upgrade headers.

use std::net::{Ipv4Addr, Ipv6Addr};

use thiserror::Error;
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;

/// Written before closing a connection that is not an acceptable handshake.
pub const HANDSHAKE_FAILED_RESPONSE: &str = "HTTP/1.0 400 Bad Request\r\n\
    Content-Type: text/html; charset=UTF-8\r\n\r\n\
    WebSockets request was expected\r\n";

/// Errors from request parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HttpError {
    #[error("request head exceeds {max} bytes")]
    HeadTooLarge { max: usize },

    #[error("request head is not valid UTF-8")]
    NotUtf8,

    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),

    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    #[error("request body exceeds {max} bytes")]
    BodyTooLarge { max: usize },
}

/// A parsed request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Value of a header, matched case-insensitively.
    ///
    /// Empty when the header is absent or appears more than once.
    pub fn header(&self, name: &str) -> &str {
        let mut found = self
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str());
        match (found.next(), found.next()) {
            (Some(value), None) => value,
            _ => "",
        }
    }

    /// Number of times a header appears, matched case-insensitively.
    pub fn header_count(&self, name: &str) -> usize {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .count()
    }

    pub fn host(&self) -> &str {
        self.header("Host")
    }

    pub fn ws_key(&self) -> &str {
        self.header("Sec-WebSocket-Key")
    }

    /// `Upgrade` is present and `Connection` lists the `upgrade` token.
    pub fn is_upgrade(&self) -> bool {
        !self.header("Upgrade").is_empty()
            && self
                .header("Connection")
                .split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
    }
}

/// What a complete request asks of the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    Get { host: String, path: String },
    Upgrade { host: String, path: String, ws_key: String },
    Reject,
}

/// Decide how to treat a complete request.
pub fn classify(request: &HttpRequest) -> Handshake {
    if request.method != "GET"
        || request.header_count("Host") > 1
        || !is_allowed_host(request.host())
    {
        return Handshake::Reject;
    }
    let host = request.host().to_string();
    let path = request.path.clone();
    if !request.is_upgrade() {
        return Handshake::Get { host, path };
    }
    let ws_key = request.ws_key();
    if ws_key.is_empty() {
        return Handshake::Reject;
    }
    Handshake::Upgrade {
        host,
        path,
        ws_key: ws_key.to_string(),
    }
}

/// Parse one request from the front of `buf`.
///
/// Returns `Ok(None)` until the head (and any declared body) is complete,
/// and the number of bytes the request occupies once it is. A declared body
/// is capped at `max_head` bytes like the head.
pub fn parse_request(buf: &[u8], max_head: usize) -> Result<Option<(HttpRequest, usize)>, HttpError> {
    let Some(head_end) = find_head_end(buf) else {
        if buf.len() > max_head {
            return Err(HttpError::HeadTooLarge { max: max_head });
        }
        return Ok(None);
    };
    if head_end > max_head {
        return Err(HttpError::HeadTooLarge { max: max_head });
    }

    let head = std::str::from_utf8(&buf[..head_end]).map_err(|_| HttpError::NotUtf8)?;
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split(' ');
    let (Some(method), Some(path), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(HttpError::MalformedRequestLine(request_line.to_string()));
    };
    if method.is_empty() || path.is_empty() || !version.starts_with("HTTP/") {
        return Err(HttpError::MalformedRequestLine(request_line.to_string()));
    }

    let mut headers = Vec::new();
    for line in lines.filter(|l| !l.is_empty()) {
        let Some((name, value)) = line.split_once(':') else {
            return Err(HttpError::MalformedHeader(line.to_string()));
        };
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(HttpError::MalformedHeader(line.to_string()));
        }
        headers.push((name.to_string(), value.trim().to_string()));
    }

    let request = HttpRequest {
        method: method.to_string(),
        path: path.to_string(),
        headers,
    };

    let body_len = match request.header("Content-Length") {
        "" => 0,
        value => value
            .parse::<usize>()
            .map_err(|_| HttpError::InvalidContentLength(value.to_string()))?,
    };
    if body_len > max_head {
        return Err(HttpError::BodyTooLarge { max: max_head });
    }
    let total = head_end + 4 + body_len;
    if buf.len() < total {
        return Ok(None);
    }
    Ok(Some((request, total)))
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Whether a `Host` header value may talk to the inspector.
///
/// Accepts an empty host, `localhost`, a dotted IPv4 address outside
/// 0.0.0.0/8, or a bracketed IPv6 literal that is neither unspecified nor
/// scoped. Anything else could be a DNS-rebinding attempt.
pub fn is_allowed_host(host_with_port: &str) -> bool {
    let host = trim_port(host_with_port);
    host.is_empty() || is_ip_address(host) || host.eq_ignore_ascii_case("localhost")
}

fn trim_port(host: &str) -> &str {
    let Some(last_colon) = host.rfind(':') else {
        return host;
    };
    match host.rfind(']') {
        Some(bracket) if last_colon < bracket => host,
        _ => &host[..last_colon],
    }
}

fn is_ip_address(host: &str) -> bool {
    if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        if inner.contains('%') {
            return false;
        }
        return inner
            .parse::<Ipv6Addr>()
            .is_ok_and(|addr| !addr.is_unspecified());
    }
    host.parse::<Ipv4Addr>()
        .is_ok_and(|addr| addr.octets()[0] != 0)
}

/// Rest of `path` after a case-insensitive `segment` match.
///
/// The segment must be followed by `/` (skipped) or the end of the path.
pub fn match_path_segment<'a>(path: &'a str, segment: &str) -> Option<&'a str> {
    let head = path.get(..segment.len())?;
    if !head.eq_ignore_ascii_case(segment) {
        return None;
    }
    let rest = &path[segment.len()..];
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

/// JSON response with the fixed inspector headers.
pub fn json_response(body: &str, code: u16) -> String {
    format!(
        "HTTP/1.0 {code} OK\r\n\
         Content-Type: application/json; charset=UTF-8\r\n\
         Cache-Control: no-cache\r\n\
         Content-Length: {}\r\n\r\n{body}",
        body.len()
    )
}

/// `101 Switching Protocols` completing a WebSocket upgrade.
pub fn upgrade_response(ws_key: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        derive_accept_key(ws_key.as_bytes())
    )
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
