//! Payload codec
//!
//! Stored payloads are `[marker][body]`. Marker `0x00` means the body is the
//! serialized value as-is, `0x01` means it is gzip-compressed. Bodies at or
//! above the compression threshold are compressed only when that actually
//! makes them smaller.

use crate::core::traits::CacheError;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};

pub const MARKER_RAW: u8 = 0x00;
pub const MARKER_GZIP: u8 = 0x01;

/// Largest body a stored gzip payload may inflate to
pub const MAX_INFLATED_BYTES: u64 = 64 * 1024 * 1024;

/// An encoded payload and the bytes compression saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub saved: u64,
}

pub fn compress(data: &[u8]) -> Result<Vec<u8>, CacheError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| CacheError::Codec(format!("compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| CacheError::Codec(format!("compression failed: {}", e)))
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CacheError> {
    decompress_bounded(data, MAX_INFLATED_BYTES)
}

/// Inflate at most `limit` bytes; a larger stream is rejected
pub fn decompress_bounded(data: &[u8], limit: u64) -> Result<Vec<u8>, CacheError> {
    let mut out = Vec::with_capacity(data.len() * 2);
    GzDecoder::new(data)
        .take(limit.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|e| CacheError::Codec(format!("decompression failed: {}", e)))?;
    if out.len() as u64 > limit {
        return Err(CacheError::Codec(format!(
            "decompressed payload exceeds {} bytes",
            limit
        )));
    }
    Ok(out)
}

/// Frame `data` for storage
pub fn encode(data: &[u8], threshold: usize) -> Result<Encoded, CacheError> {
    if data.len() >= threshold {
        let compressed = compress(data)?;
        if compressed.len() < data.len() {
            let saved = (data.len() - compressed.len()) as u64;
            let mut bytes = Vec::with_capacity(compressed.len() + 1);
            bytes.push(MARKER_GZIP);
            bytes.extend_from_slice(&compressed);
            return Ok(Encoded { bytes, saved });
        }
    }

    let mut bytes = Vec::with_capacity(data.len() + 1);
    bytes.push(MARKER_RAW);
    bytes.extend_from_slice(data);
    Ok(Encoded { bytes, saved: 0 })
}

/// Undo [`encode`]
pub fn decode(payload: &[u8]) -> Result<Vec<u8>, CacheError> {
    match payload.split_first() {
        Some((&MARKER_RAW, body)) => Ok(body.to_vec()),
        Some((&MARKER_GZIP, body)) => decompress(body),
        Some((marker, _)) => Err(CacheError::Codec(format!(
            "unknown payload marker 0x{:02x}",
            marker
        ))),
        None => Err(CacheError::Codec("empty payload".to_string())),
    }
}
