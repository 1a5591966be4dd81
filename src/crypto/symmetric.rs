//! Passphrase-based AES-CBC encryption of the envelope payload.
//!
//! The key and IV are both derived with PBKDF2-HMAC-SHA256 from the
//! envelope's key material and salt:
//!
//! ```text
//! PBKDF2(passphrase, salt, iterations) -> [ key (16/24/32 bytes) | iv (16 bytes) ]
//! ```
//!
//! This is the derivation `openssl enc -pbkdf2 -md sha256 -S <salt>` uses,
//! so payloads are interchangeable with that tool. Plaintext is padded
//! with PKCS#7 and may be arbitrary bytes.

use std::fmt;
use std::str::FromStr;

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use super::encoding::{decode_block, encode_block};
use crate::errors::{EnvelopeError, Result};

/// CBC initialisation vector length (the AES block size).
const IV_LEN: usize = 16;

/// Lowest PBKDF2 iteration count accepted in a cipher config.
pub const MIN_ITERATIONS: u32 = 1_000;

/// Accepted salt lengths in bytes.
const SALT_LEN_RANGE: std::ops::RangeInclusive<usize> = 8..=64;

/// Block cipher used for the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymmetricAlgorithm {
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
}

impl SymmetricAlgorithm {
    /// Key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            Self::Aes128Cbc => 16,
            Self::Aes192Cbc => 24,
            Self::Aes256Cbc => 32,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Aes128Cbc => "aes-128-cbc",
            Self::Aes192Cbc => "aes-192-cbc",
            Self::Aes256Cbc => "aes-256-cbc",
        }
    }
}

impl FromStr for SymmetricAlgorithm {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "aes-128-cbc" => Ok(Self::Aes128Cbc),
            "aes-192-cbc" => Ok(Self::Aes192Cbc),
            "aes-256-cbc" => Ok(Self::Aes256Cbc),
            other => Err(EnvelopeError::Config(format!(
                "unsupported cipher '{other}' (expected aes-128-cbc, aes-192-cbc or aes-256-cbc)"
            ))),
        }
    }
}

/// Parameters of the symmetric layer, stored in the envelope as
/// `cipher_config`.
///
/// Rendered (and parsed) as openssl-style arguments:
/// `-aes-256-cbc -pbkdf2 -md sha256 -iter 600000 -saltlen 16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherConfig {
    pub algorithm: SymmetricAlgorithm,
    /// PBKDF2 iteration count (default: 600 000).
    pub iterations: u32,
    /// Salt length in bytes (default: 16).
    pub salt_len: usize,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            algorithm: SymmetricAlgorithm::Aes256Cbc,
            iterations: 600_000,
            salt_len: 16,
        }
    }
}

impl CipherConfig {
    /// Reject parameters that are too weak or out of range.
    pub fn validate(&self) -> Result<()> {
        if self.iterations < MIN_ITERATIONS {
            return Err(EnvelopeError::Config(format!(
                "PBKDF2 iterations must be at least {MIN_ITERATIONS} (got {})",
                self.iterations
            )));
        }
        if !SALT_LEN_RANGE.contains(&self.salt_len) {
            return Err(EnvelopeError::Config(format!(
                "salt length must be between {} and {} bytes (got {})",
                SALT_LEN_RANGE.start(),
                SALT_LEN_RANGE.end(),
                self.salt_len
            )));
        }
        Ok(())
    }
}

impl fmt::Display for CipherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "-{} -pbkdf2 -md sha256 -iter {} -saltlen {}",
            self.algorithm.name(),
            self.iterations,
            self.salt_len
        )
    }
}

impl FromStr for CipherConfig {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self> {
        let mut algorithm = None;
        let mut pbkdf2 = false;
        let mut md = None;
        let mut iterations = None;
        let mut salt_len = None;

        let mut tokens = s.split_whitespace();
        while let Some(token) = tokens.next() {
            match token {
                "-pbkdf2" => pbkdf2 = true,
                "-md" => md = Some(expect_value(&mut tokens, token)?),
                "-iter" => iterations = Some(parse_number(&mut tokens, token)?),
                "-saltlen" => salt_len = Some(parse_number(&mut tokens, token)?),
                other => match other.strip_prefix('-') {
                    Some(name) if algorithm.is_none() => algorithm = Some(name.parse()?),
                    _ => {
                        return Err(EnvelopeError::Config(format!(
                            "unexpected token '{other}' in cipher config"
                        )))
                    }
                },
            }
        }

        if !pbkdf2 {
            return Err(EnvelopeError::Config(
                "cipher config must use -pbkdf2 key derivation".into(),
            ));
        }
        if let Some(md) = md {
            if md != "sha256" {
                return Err(EnvelopeError::Config(format!(
                    "unsupported PBKDF2 digest '{md}' (only sha256)"
                )));
            }
        }

        let defaults = Self::default();
        let config = Self {
            algorithm: algorithm.ok_or_else(|| {
                EnvelopeError::Config("cipher config does not name a cipher".into())
            })?,
            iterations: match iterations {
                Some(n) => u32::try_from(n).map_err(|_| {
                    EnvelopeError::Config(format!("iteration count {n} is too large"))
                })?,
                None => defaults.iterations,
            },
            salt_len: salt_len.unwrap_or(defaults.salt_len),
        };
        config.validate()?;
        Ok(config)
    }
}

fn expect_value<'a>(tokens: &mut impl Iterator<Item = &'a str>, flag: &str) -> Result<&'a str> {
    tokens
        .next()
        .ok_or_else(|| EnvelopeError::Config(format!("{flag} expects a value")))
}

fn parse_number<'a>(tokens: &mut impl Iterator<Item = &'a str>, flag: &str) -> Result<usize> {
    let value = expect_value(tokens, flag)?;
    value
        .parse()
        .map_err(|_| EnvelopeError::Config(format!("{flag} expects a number, got '{value}'")))
}

/// Key and IV derived from a passphrase, wiped from memory on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DerivedKey {
    algorithm_key_len: usize,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey").finish_non_exhaustive()
    }
}

impl DerivedKey {
    pub fn key(&self) -> &[u8] {
        &self.bytes[..self.algorithm_key_len]
    }

    pub fn iv(&self) -> &[u8] {
        &self.bytes[self.algorithm_key_len..]
    }
}

/// Derive the cipher key and IV from `passphrase` and raw `salt` bytes.
///
/// The same inputs always produce the same key.
pub fn derive_key(passphrase: &[u8], salt: &[u8], config: &CipherConfig) -> Result<DerivedKey> {
    config.validate()?;
    if salt.len() != config.salt_len {
        return Err(EnvelopeError::Cipher(format!(
            "salt is {} bytes but the cipher config requires {}",
            salt.len(),
            config.salt_len
        )));
    }

    let key_len = config.algorithm.key_len();
    let mut bytes = vec![0u8; key_len + IV_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase, salt, config.iterations, &mut bytes);

    Ok(DerivedKey {
        algorithm_key_len: key_len,
        bytes,
    })
}

/// Encrypt `plaintext` and return it as a base64 block.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey, config: &CipherConfig) -> Result<String> {
    let ciphertext = match config.algorithm {
        SymmetricAlgorithm::Aes128Cbc => cbc_encrypt::<aes::Aes128>(key, plaintext)?,
        SymmetricAlgorithm::Aes192Cbc => cbc_encrypt::<aes::Aes192>(key, plaintext)?,
        SymmetricAlgorithm::Aes256Cbc => cbc_encrypt::<aes::Aes256>(key, plaintext)?,
    };
    Ok(encode_block(&ciphertext))
}

/// Decrypt a base64 block produced by `encrypt`.
///
/// A wrong key and corrupted ciphertext are reported identically.
pub fn decrypt(block: &str, key: &DerivedKey, config: &CipherConfig) -> Result<Vec<u8>> {
    let ciphertext = decode_block(block)?;
    match config.algorithm {
        SymmetricAlgorithm::Aes128Cbc => cbc_decrypt::<aes::Aes128>(key, &ciphertext),
        SymmetricAlgorithm::Aes192Cbc => cbc_decrypt::<aes::Aes192>(key, &ciphertext),
        SymmetricAlgorithm::Aes256Cbc => cbc_decrypt::<aes::Aes256>(key, &ciphertext),
    }
}

fn cbc_encrypt<C>(key: &DerivedKey, plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let cipher = cbc::Encryptor::<C>::new_from_slices(key.key(), key.iv())
        .map_err(|e| EnvelopeError::Cipher(format!("invalid key length: {e}")))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn cbc_decrypt<C>(key: &DerivedKey, ciphertext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let cipher = cbc::Decryptor::<C>::new_from_slices(key.key(), key.iv())
        .map_err(|e| EnvelopeError::Cipher(format!("invalid key length: {e}")))?;
    cipher.decrypt_padded_vec_mut::<Pkcs7>(ciphertext).map_err(|_| {
        EnvelopeError::Cipher("payload decryption failed — wrong key or corrupted data".into())
    })
}

/// Hex-decode an unwrapped salt, checking it matches the configured length.
pub fn decode_salt(salt_hex: &[u8], config: &CipherConfig) -> Result<Zeroizing<Vec<u8>>> {
    if salt_hex.len() != config.salt_len * 2 {
        return Err(EnvelopeError::Cipher(format!(
            "salt is {} hex characters but the cipher config requires {}",
            salt_hex.len(),
            config.salt_len * 2
        )));
    }
    hex::decode(salt_hex)
        .map(Zeroizing::new)
        .map_err(|_| EnvelopeError::Cipher("salt is not valid hex".into()))
}
