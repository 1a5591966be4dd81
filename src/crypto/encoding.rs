//! Text encoding for the opaque envelope fields.
//!
//! Binary values are stored as standard base64 broken into 64-character
//! lines, each terminated by `\n` (the same layout `openssl base64`
//! writes). Decoding ignores any ASCII whitespace.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::errors::{EnvelopeError, Result};

/// Maximum characters per line of an encoded block.
const LINE_WIDTH: usize = 64;

/// Encode `data` as a line-wrapped base64 block.
pub fn encode_block(data: &[u8]) -> String {
    let encoded = BASE64.encode(data);
    let mut block = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH + 1);

    // base64 output is pure ASCII, so byte chunks are valid UTF-8.
    for line in encoded.as_bytes().chunks(LINE_WIDTH) {
        block.push_str(std::str::from_utf8(line).unwrap_or_default());
        block.push('\n');
    }
    block
}

/// Decode a block produced by `encode_block` (or any whitespace-wrapped base64).
pub fn decode_block(block: &str) -> Result<Vec<u8>> {
    let compact: String = block.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64
        .decode(compact)
        .map_err(|e| EnvelopeError::Cipher(format!("invalid base64 block: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_block_is_one_line() {
        assert_eq!(encode_block(b"hello"), "aGVsbG8=\n");
    }

    #[test]
    fn long_block_wraps_at_64_columns() {
        let block = encode_block(&[0x5a; 100]);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 64);
        assert_eq!(lines[1].len(), 64);
        assert!(block.ends_with('\n'));
        assert_eq!(decode_block(&block).unwrap(), vec![0x5a; 100]);
    }

    #[test]
    fn exact_multiple_of_line_width_has_single_trailing_newline() {
        // 48 bytes -> exactly 64 base64 characters.
        let block = encode_block(&[1u8; 48]);
        assert_eq!(block.len(), 65);
        assert!(!block.ends_with("\n\n"));
    }

    #[test]
    fn decode_ignores_whitespace() {
        assert_eq!(decode_block("  aGVs\r\nbG8=\n\n").unwrap(), b"hello");
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_block("not*base64").unwrap_err();
        assert!(matches!(err, EnvelopeError::Cipher(_)));
    }
}
