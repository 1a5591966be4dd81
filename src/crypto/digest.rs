//! Integrity digest over the stored envelope fields.
//!
//! The digest is SHA-256 over the exact concatenation of the field values
//! as they appear in the document (encrypted and base64 encoded, trailing
//! newlines included), rendered as 64 lowercase hex characters.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::errors::{EnvelopeError, Result};

/// Hex SHA-256 over `ordered_values`, concatenated with no separator.
pub fn digest<I, T>(ordered_values: I) -> String
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for value in ordered_values {
        hasher.update(value.as_ref());
    }
    hex::encode(hasher.finalize())
}

/// Compare an unwrapped digest with a freshly computed one in constant time.
pub fn verify(unwrapped: &[u8], computed: &str) -> Result<()> {
    if unwrapped.ct_eq(computed.as_bytes()).into() {
        Ok(())
    } else {
        Err(EnvelopeError::Integrity)
    }
}
