//! Envelope document format.
//!
//! An envelope is a YAML mapping with six keys, written in this order:
//!
//! ```text
//! cipher_config: '-aes-256-cbc -pbkdf2 -md sha256 -iter 600000 -saltlen 16'
//! key_wrap_config: '-pkeyopt rsa_padding_mode:oaep -pkeyopt rsa_oaep_md:sha256 -pkeyopt rsa_mgf1_md:sha256'
//! salt: |
//!   <RSA-OAEP wrapped hex salt, base64>
//! key_material: |
//!   <RSA-OAEP wrapped passphrase, base64>
//! payload: |
//!   <AES-CBC ciphertext, base64>
//! integrity_digest: |
//!   <RSA-OAEP wrapped SHA-256 hex digest of the five fields above, base64>
//! ```
//!
//! The digest covers the field *values* exactly as stored, so the opaque
//! fields keep their line breaks and trailing newline through a parse.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::crypto::encoding::decode_block;
use crate::crypto::symmetric::CipherConfig;
use crate::crypto::KeyWrapConfig;
use crate::errors::{EnvelopeError, Result};

/// A complete envelope document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    pub cipher_config: String,
    pub key_wrap_config: String,
    pub salt: String,
    pub key_material: String,
    pub payload: String,
    pub integrity_digest: String,
}

/// The five fields covered by the integrity digest, in digest order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeBody {
    pub cipher_config: String,
    pub key_wrap_config: String,
    pub salt: String,
    pub key_material: String,
    pub payload: String,
}

impl EnvelopeBody {
    /// Field values in the order the digest consumes them.
    pub fn hashed_values(&self) -> [&str; 5] {
        [
            self.cipher_config.as_str(),
            self.key_wrap_config.as_str(),
            self.salt.as_str(),
            self.key_material.as_str(),
            self.payload.as_str(),
        ]
    }
}

/// The document holding only the wrapped digest, merged over a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestSection {
    pub integrity_digest: String,
}

impl Envelope {
    /// Split off the digested fields.
    pub fn body(&self) -> EnvelopeBody {
        EnvelopeBody {
            cipher_config: self.cipher_config.clone(),
            key_wrap_config: self.key_wrap_config.clone(),
            salt: self.salt.clone(),
            key_material: self.key_material.clone(),
            payload: self.payload.clone(),
        }
    }
}

/// Parse an envelope document.
///
/// Keys may appear in any order; unknown or missing keys are rejected.
pub fn parse(text: &str) -> Result<Envelope> {
    serde_yaml::from_str(text).map_err(|e| EnvelopeError::Parse(e.to_string()))
}

/// Serialize an envelope with its fields in canonical order.
pub fn serialize(envelope: &Envelope) -> Result<String> {
    serde_yaml::to_string(envelope).map_err(|e| EnvelopeError::Serialization(e.to_string()))
}

/// Convert any serializable document section into a YAML mapping.
pub fn to_mapping<T: Serialize>(section: &T) -> Result<Mapping> {
    match serde_yaml::to_value(section) {
        Ok(Value::Mapping(mapping)) => Ok(mapping),
        Ok(_) => Err(EnvelopeError::Serialization(
            "envelope section is not a mapping".into(),
        )),
        Err(e) => Err(EnvelopeError::Serialization(e.to_string())),
    }
}

/// Union two partial documents, `overlay` winning on conflicting keys.
///
/// The result must form a complete envelope.
pub fn merge(base: Mapping, overlay: Mapping) -> Result<Envelope> {
    let mut merged = base;
    for (key, value) in overlay {
        merged.insert(key, value);
    }
    serde_yaml::from_value(Value::Mapping(merged)).map_err(|e| EnvelopeError::Parse(e.to_string()))
}

/// Combine a body with its wrapped digest into the final envelope.
pub fn seal(body: &EnvelopeBody, integrity_digest: String) -> Result<Envelope> {
    merge(to_mapping(body)?, to_mapping(&DigestSection { integrity_digest })?)
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Read and parse an envelope file.
pub fn read_envelope(path: &Path) -> Result<Envelope> {
    let text = fs::read_to_string(path)?;
    parse(&text).map_err(|e| match e {
        EnvelopeError::Parse(msg) => EnvelopeError::Parse(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Write an envelope file **atomically**.
///
/// The document is written to a temp file in the same directory and then
/// renamed over `path`, so readers never observe a half-written envelope.
pub fn write_envelope(path: &Path, envelope: &Envelope) -> Result<()> {
    let text = serialize(envelope)?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, text)?;
    fs::rename(&tmp_path, path)?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

/// Key-free facts about an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeSummary {
    pub cipher_config: String,
    pub key_wrap_config: String,
    /// RSA modulus size implied by the wrapped blocks.
    pub wrapping_key_bits: usize,
    /// Size of the symmetric ciphertext in bytes.
    pub payload_bytes: usize,
    /// Whether both config fields parse as supported parameters.
    pub configs_supported: bool,
}

/// Summarize an envelope without unwrapping anything.
///
/// RSA ciphertext is always exactly the modulus size, so the wrapped
/// blocks reveal which key size protects the envelope.
pub fn inspect(envelope: &Envelope) -> Result<EnvelopeSummary> {
    let mut sizes = Vec::with_capacity(3);
    for (name, block) in [
        ("salt", &envelope.salt),
        ("key_material", &envelope.key_material),
        ("integrity_digest", &envelope.integrity_digest),
    ] {
        let bytes = decode_block(block)
            .map_err(|_| EnvelopeError::Parse(format!("{name} is not a base64 block")))?;
        sizes.push(bytes.len());
    }
    if sizes.iter().any(|&len| len != sizes[0]) {
        return Err(EnvelopeError::Parse(format!(
            "wrapped blocks disagree on key size ({} / {} / {} bytes)",
            sizes[0], sizes[1], sizes[2]
        )));
    }

    let payload_bytes = decode_block(&envelope.payload)
        .map_err(|_| EnvelopeError::Parse("payload is not a base64 block".into()))?
        .len();

    let configs_supported = envelope.cipher_config.parse::<CipherConfig>().is_ok()
        && envelope.key_wrap_config.parse::<KeyWrapConfig>().is_ok();

    Ok(EnvelopeSummary {
        cipher_config: envelope.cipher_config.clone(),
        key_wrap_config: envelope.key_wrap_config.clone(),
        wrapping_key_bits: sizes[0] * 8,
        payload_bytes,
        configs_supported,
    })
}
