//! zlib compression of the stream payload.
//!
//! The payload after the envelope is deflated as one unit. The envelope
//! carries the level and the inflated length, so neither is stored here.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::util::{Error, Result};

/// Compress `data` at zlib `level` (clamped to 1..=9).
pub fn compress(data: &[u8], level: i32) -> Result<Vec<u8>> {
    let level = level.clamp(1, 9) as u32;
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(level));
    encoder
        .write_all(data)
        .map_err(|e| Error::Compression(e.to_string()))?;
    encoder.finish().map_err(|e| Error::Compression(e.to_string()))
}

/// Inflate `data`, which must expand to exactly `expected_len` bytes.
pub fn decompress(data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    // The length comes from the stream, so cap the up-front reservation.
    let mut out = Vec::with_capacity(expected_len.min(64 * 1024 * 1024));
    // One byte past the declared length is enough to detect an overrun.
    ZlibDecoder::new(data)
        .take(expected_len as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| Error::Compression(e.to_string()))?;
    if out.len() != expected_len {
        return Err(Error::Compression(format!(
            "inflated {} bytes, envelope declares {}",
            out.len(),
            expected_len
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_decompress() {
        let original = b"Group Geode Geometry StateSet ".repeat(100);
        let compressed = compress(&original, 6).unwrap();
        assert!(compressed.len() < original.len());
        assert_eq!(decompress(&compressed, original.len()).unwrap(), original);
    }

    #[test]
    fn test_length_mismatch() {
        let compressed = compress(b"abcdef", 9).unwrap();
        let err = decompress(&compressed, 5).unwrap_err();
        assert!(matches!(err, Error::Compression(_)));
    }

    #[test]
    fn test_inflation_stops_past_declared_length() {
        let original = vec![0u8; 4 * 1024 * 1024];
        let compressed = compress(&original, 9).unwrap();
        let err = decompress(&compressed, 1024).unwrap_err();
        match err {
            Error::Compression(msg) => assert!(msg.contains("inflated 1025 bytes"), "{msg}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_garbage_input() {
        let err = decompress(&[1, 2, 3, 4, 5], 5).unwrap_err();
        assert!(matches!(err, Error::Compression(_)));
    }

    #[test]
    fn test_empty_payload() {
        let compressed = compress(&[], 1).unwrap();
        assert!(decompress(&compressed, 0).unwrap().is_empty());
    }
}
