//! RSA-OAEP wrapping of short secrets (salt, key material, digest).
//!
//! The protocol only talks to the `KeyWrap` / `KeyUnwrap` capabilities,
//! so a different key custody backend (an HSM, a remote KMS) can stand in
//! for the local RSA keys implemented here.

use std::fmt;
use std::str::FromStr;

use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::encoding::{decode_block, encode_block};
use crate::errors::{EnvelopeError, Result};

/// Hash function used inside OAEP padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OaepDigest {
    Sha1,
    Sha256,
}

impl OaepDigest {
    /// Output length of the hash in bytes.
    pub fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

impl FromStr for OaepDigest {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(EnvelopeError::Config(format!(
                "unsupported OAEP digest '{other}' (expected sha1 or sha256)"
            ))),
        }
    }
}

/// Parameters of the asymmetric layer, stored in the envelope as
/// `key_wrap_config`.
///
/// Rendered as `openssl pkeyutl` options, e.g.
/// `-pkeyopt rsa_padding_mode:oaep -pkeyopt rsa_oaep_md:sha256 -pkeyopt rsa_mgf1_md:sha256`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyWrapConfig {
    /// Digest for the OAEP label hash.
    pub oaep_digest: OaepDigest,
    /// Digest for the MGF1 mask generation function.
    pub mgf1_digest: OaepDigest,
}

impl Default for KeyWrapConfig {
    fn default() -> Self {
        Self::with_digest(OaepDigest::Sha256)
    }
}

impl KeyWrapConfig {
    /// OAEP with the same digest for the label hash and MGF1.
    pub fn with_digest(digest: OaepDigest) -> Self {
        Self {
            oaep_digest: digest,
            mgf1_digest: digest,
        }
    }

    fn padding(&self) -> Oaep {
        match (self.oaep_digest, self.mgf1_digest) {
            (OaepDigest::Sha1, OaepDigest::Sha1) => Oaep::new::<Sha1>(),
            (OaepDigest::Sha256, OaepDigest::Sha256) => Oaep::new::<Sha256>(),
            (OaepDigest::Sha1, OaepDigest::Sha256) => Oaep::new_with_mgf_hash::<Sha1, Sha256>(),
            (OaepDigest::Sha256, OaepDigest::Sha1) => Oaep::new_with_mgf_hash::<Sha256, Sha1>(),
        }
    }

    /// Largest input OAEP can wrap under a modulus of `modulus_len` bytes.
    pub fn max_input_len(&self, modulus_len: usize) -> usize {
        modulus_len.saturating_sub(2 * self.oaep_digest.output_len() + 2)
    }
}

impl fmt::Display for KeyWrapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "-pkeyopt rsa_padding_mode:oaep -pkeyopt rsa_oaep_md:{} -pkeyopt rsa_mgf1_md:{}",
            self.oaep_digest.name(),
            self.mgf1_digest.name()
        )
    }
}

impl FromStr for KeyWrapConfig {
    type Err = EnvelopeError;

    /// Missing digests follow openssl: OAEP defaults to sha1 and MGF1
    /// defaults to the OAEP digest.
    fn from_str(s: &str) -> Result<Self> {
        let mut oaep = false;
        let mut oaep_digest = None;
        let mut mgf1_digest = None;

        let mut tokens = s.split_whitespace();
        while let Some(token) = tokens.next() {
            if token != "-pkeyopt" {
                return Err(EnvelopeError::Config(format!(
                    "unexpected token '{token}' in key wrap config"
                )));
            }
            let option = tokens
                .next()
                .ok_or_else(|| EnvelopeError::Config("-pkeyopt expects a value".into()))?;
            let (name, value) = option.split_once(':').ok_or_else(|| {
                EnvelopeError::Config(format!("malformed key wrap option '{option}'"))
            })?;

            match name {
                "rsa_padding_mode" if value == "oaep" => oaep = true,
                "rsa_padding_mode" => {
                    return Err(EnvelopeError::Config(format!(
                        "unsupported padding mode '{value}' (only oaep)"
                    )))
                }
                "rsa_oaep_md" => oaep_digest = Some(value.parse()?),
                "rsa_mgf1_md" => mgf1_digest = Some(value.parse()?),
                other => {
                    return Err(EnvelopeError::Config(format!(
                        "unknown key wrap option '{other}'"
                    )))
                }
            }
        }

        if !oaep {
            return Err(EnvelopeError::Config(
                "key wrap config must select rsa_padding_mode:oaep".into(),
            ));
        }

        let oaep_digest = oaep_digest.unwrap_or(OaepDigest::Sha1);
        Ok(Self {
            oaep_digest,
            mgf1_digest: mgf1_digest.unwrap_or(oaep_digest),
        })
    }
}

/// Capability to wrap bytes for a key holder.
pub trait KeyWrap {
    /// Encrypt `data` under this key with the given scheme.
    fn wrap_bytes(&self, scheme: &KeyWrapConfig, data: &[u8]) -> Result<Vec<u8>>;

    /// Stable identifier of the key pair this key belongs to.
    fn key_id(&self) -> String;
}

/// Capability to recover bytes wrapped by the matching `KeyWrap`.
pub trait KeyUnwrap {
    fn unwrap_bytes(&self, scheme: &KeyWrapConfig, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// Stable identifier of the key pair this key belongs to.
    fn key_id(&self) -> String;
}

impl KeyWrap for RsaPublicKey {
    fn wrap_bytes(&self, scheme: &KeyWrapConfig, data: &[u8]) -> Result<Vec<u8>> {
        let limit = scheme.max_input_len(self.size());
        if data.len() > limit {
            return Err(EnvelopeError::Cipher(format!(
                "cannot wrap {} bytes: a {}-bit key with OAEP-{} holds at most {limit}",
                data.len(),
                self.size() * 8,
                scheme.oaep_digest.name()
            )));
        }

        self.encrypt(&mut OsRng, scheme.padding(), data)
            .map_err(|e| EnvelopeError::Cipher(format!("RSA-OAEP wrap failed: {e}")))
    }

    fn key_id(&self) -> String {
        rsa_key_id(self)
    }
}

impl KeyUnwrap for RsaPrivateKey {
    fn unwrap_bytes(&self, scheme: &KeyWrapConfig, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.decrypt(scheme.padding(), wrapped)
            .map(Zeroizing::new)
            .map_err(|_| {
                EnvelopeError::Cipher("RSA-OAEP unwrap failed — wrong key or corrupted data".into())
            })
    }

    fn key_id(&self) -> String {
        rsa_key_id(self)
    }
}

/// Hex SHA-256 over the big-endian modulus and public exponent.
fn rsa_key_id(key: &impl PublicKeyParts) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.n().to_bytes_be());
    hasher.update(key.e().to_bytes_be());
    hex::encode(hasher.finalize())
}

/// Wrap `data` and return it as a base64 block.
pub fn wrap_block<K: KeyWrap + ?Sized>(data: &[u8], key: &K, scheme: &KeyWrapConfig) -> Result<String> {
    Ok(encode_block(&key.wrap_bytes(scheme, data)?))
}

/// Decode a base64 block and unwrap it.
pub fn unwrap_block<K: KeyUnwrap + ?Sized>(
    block: &str,
    key: &K,
    scheme: &KeyWrapConfig,
) -> Result<Zeroizing<Vec<u8>>> {
    let wrapped = decode_block(block)?;
    key.unwrap_bytes(scheme, &wrapped)
}
