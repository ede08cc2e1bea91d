// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol schema served at `/json/protocol`.

use std::io::Read;

use flate2::read::ZlibDecoder;
use thiserror::Error;

/// 3-byte big-endian decompressed length followed by a zlib stream.
static PROTOCOL_BLOB: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/protocol_json.bin"));

#[derive(Debug, Error)]
pub enum ProtocolJsonError {
    #[error("protocol blob is truncated")]
    Truncated,

    #[error("failed to inflate protocol blob: {0}")]
    Inflate(#[from] std::io::Error),

    #[error("protocol blob size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("protocol blob is not UTF-8")]
    NotUtf8,
}

/// The embedded protocol schema, inflated.
pub fn protocol_json() -> Result<String, ProtocolJsonError> {
    decode(PROTOCOL_BLOB)
}

pub(crate) fn decode(blob: &[u8]) -> Result<String, ProtocolJsonError> {
    let [b0, b1, b2, ref compressed @ ..] = *blob else {
        return Err(ProtocolJsonError::Truncated);
    };
    let expected = u32::from_be_bytes([0, b0, b1, b2]) as usize;
    let mut inflated = Vec::with_capacity(expected);
    ZlibDecoder::new(compressed).read_to_end(&mut inflated)?;
    if inflated.len() != expected {
        return Err(ProtocolJsonError::SizeMismatch {
            expected,
            actual: inflated.len(),
        });
    }
    String::from_utf8(inflated).map_err(|_| ProtocolJsonError::NotUtf8)
}

#[cfg(test)]
#[path = "protocol_json_tests.rs"]
mod tests;
