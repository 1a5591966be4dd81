//! Fresh secrets for new envelopes, drawn from the operating system RNG.
//!
//! Two kinds of secret are produced:
//! - a 128-character printable passphrase (the "key material"), and
//! - a salt of `len` random bytes, hex encoded.
//!
//! Any failure to read from the OS RNG is returned as
//! `EnvelopeError::Randomness`; callers never fall back to a weaker source.

use rand::rngs::OsRng;
use rand::TryRngCore;
use zeroize::Zeroizing;

use crate::errors::{EnvelopeError, Result};

/// Length of the generated key material in characters.
pub const KEY_MATERIAL_LEN: usize = 128;

/// Characters the key material is drawn from.
const ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!#%+,-./:=?@^_~";

/// Generate a new 128-character passphrase.
///
/// Every character is drawn uniformly from `ALPHABET` by rejection
/// sampling random bytes, so no symbol is favoured by modulo bias.
pub fn generate_key_material() -> Result<Zeroizing<String>> {
    // Largest multiple of the alphabet size that fits in a byte.
    let limit = 256 - (256 % ALPHABET.len());

    let mut material = Zeroizing::new(String::with_capacity(KEY_MATERIAL_LEN));
    let mut pool = Zeroizing::new([0u8; 64]);

    while material.len() < KEY_MATERIAL_LEN {
        fill_random(pool.as_mut_slice())?;
        for &byte in pool.iter() {
            if usize::from(byte) >= limit {
                continue;
            }
            material.push(char::from(ALPHABET[usize::from(byte) % ALPHABET.len()]));
            if material.len() == KEY_MATERIAL_LEN {
                break;
            }
        }
    }

    Ok(material)
}

/// Generate `len` random salt bytes, returned as `2 * len` lowercase hex characters.
pub fn generate_salt(len: usize) -> Result<Zeroizing<String>> {
    let mut salt = Zeroizing::new(vec![0u8; len]);
    fill_random(&mut salt)?;
    Ok(Zeroizing::new(hex::encode(salt.as_slice())))
}

fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| EnvelopeError::Randomness(e.to_string()))
}
