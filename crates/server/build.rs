use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;

fn main() {
    if let Err(e) = generate() {
        eprintln!("build script failed: {}", e);
        std::process::exit(1);
    }
}

/// Compress the protocol schema into `OUT_DIR/protocol_json.bin`.
///
/// Layout: 3-byte big-endian decompressed length, then the zlib stream.
fn generate() -> io::Result<()> {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").map_err(io::Error::other)?;
    let schema_path = Path::new(&manifest_dir).join("protocol/inspector_protocol.json");
    println!("cargo:rerun-if-changed={}", schema_path.display());

    let schema = fs::read(&schema_path)?;
    if schema.len() >= 1 << 24 {
        return Err(io::Error::other(format!(
            "protocol schema is {} bytes, exceeds 24-bit length prefix",
            schema.len()
        )));
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&schema)?;
    let compressed = encoder.finish()?;

    let len = schema.len() as u32;
    let mut blob = Vec::with_capacity(compressed.len() + 3);
    blob.extend_from_slice(&len.to_be_bytes()[1..]);
    blob.extend_from_slice(&compressed);

    let out_dir = env::var("OUT_DIR").map_err(io::Error::other)?;
    fs::write(Path::new(&out_dir).join("protocol_json.bin"), blob)
}
