//! Cryptographic building blocks for envelopes.
//!
//! This module provides:
//! - OS-backed generation of key material and salts (`random`)
//! - Line-wrapped base64 text blocks (`encoding`)
//! - PBKDF2 + AES-CBC payload encryption (`symmetric`)
//! - RSA-OAEP wrapping behind the `KeyWrap` / `KeyUnwrap` traits (`asymmetric`)
//! - The SHA-256 integrity digest (`digest`)
//! - RSA key loading and generation (`keys`)

pub mod asymmetric;
pub mod digest;
pub mod encoding;
pub mod keys;
pub mod random;
pub mod symmetric;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{CipherConfig, KeyWrapConfig, KeyWrap, ...};
pub use asymmetric::{unwrap_block, wrap_block, KeyUnwrap, KeyWrap, KeyWrapConfig, OaepDigest};
pub use keys::{generate_key_pair, load_private_key, load_public_key};
pub use symmetric::{CipherConfig, SymmetricAlgorithm};
