//! The envelope operations: `encrypt`, `decrypt` and `rotate_key`.
//!
//! Sealing is two-pass: the five digested fields are built first, then
//! the digest over exactly those values is wrapped and merged in. Nothing
//! is returned until every field exists, so a failure never yields a
//! partial envelope.
//!
//! Opening always checks the integrity digest before any secret is
//! unwrapped, and a mismatch is final.

use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::format::{self, Envelope, EnvelopeBody};
use crate::config::EnvelopeConfig;
use crate::crypto::asymmetric::{unwrap_block, wrap_block, KeyUnwrap, KeyWrap, KeyWrapConfig};
use crate::crypto::symmetric::{self, CipherConfig, DerivedKey};
use crate::crypto::{digest, random};
use crate::errors::{EnvelopeError, Result};

/// Plaintext envelope fields a caller may override on decrypt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum ConfigField {
    #[value(name = "cipher_config")]
    Cipher,
    #[value(name = "key_wrap_config")]
    KeyWrap,
}

impl ConfigField {
    pub fn name(self) -> &'static str {
        match self {
            Self::Cipher => "cipher_config",
            Self::KeyWrap => "key_wrap_config",
        }
    }
}

/// An existing envelope being updated in place, with the private key
/// that can open it.
#[derive(Clone, Copy)]
pub struct PreviousEnvelope<'a> {
    pub envelope: &'a Envelope,
    pub private_key: &'a dyn KeyUnwrap,
}

/// Unwrapped secrets of one envelope. Both are ASCII text: the salt as
/// hex, the key material as the raw passphrase.
struct Secrets {
    salt_hex: Zeroizing<Vec<u8>>,
    key_material: Zeroizing<Vec<u8>>,
}

/// Secrets taken over from a previous envelope.
struct Reused {
    secrets: Secrets,
    /// The previous wrapped `(salt, key_material)` blocks, when they are
    /// still valid for the new public key.
    wrapped: Option<(String, String)>,
}

/// Encrypt `plaintext` into a new envelope for `public_key`.
///
/// With `previous`, an envelope that passes its integrity check under the
/// supplied private key donates its salt and key material, so successive
/// versions of the same envelope share one symmetric key. If the previous
/// envelope cannot be opened, fresh secrets are generated instead.
pub fn encrypt<W: KeyWrap + ?Sized>(
    plaintext: &[u8],
    public_key: &W,
    previous: Option<PreviousEnvelope<'_>>,
    config: &EnvelopeConfig,
) -> Result<Envelope> {
    config.cipher.validate()?;
    let cipher_config = config.cipher.to_string();
    let key_wrap_config = config.key_wrap.to_string();

    let reused = match previous {
        Some(prev) => match try_reuse(&prev, public_key, &key_wrap_config, config) {
            Ok(reused) => {
                debug!(
                    rewrap = reused.wrapped.is_none(),
                    "reusing key material from previous envelope"
                );
                Some(reused)
            }
            Err(e) => {
                warn!(error = %e, "previous envelope not reusable; generating fresh key material");
                None
            }
        },
        None => None,
    };

    let (secrets, wrapped) = match reused {
        Some(Reused { secrets, wrapped }) => (secrets, wrapped),
        None => (fresh_secrets(&config.cipher)?, None),
    };

    let key = derive(&secrets, &config.cipher)?;
    let payload = symmetric::encrypt(plaintext, &key, &config.cipher)?;

    let (salt, key_material) = match wrapped {
        Some(blocks) => blocks,
        None => (
            wrap_block(&secrets.salt_hex, public_key, &config.key_wrap)?,
            wrap_block(&secrets.key_material, public_key, &config.key_wrap)?,
        ),
    };

    debug!(key_id = %public_key.key_id(), bytes = plaintext.len(), "sealing envelope");
    seal_body(
        EnvelopeBody {
            cipher_config,
            key_wrap_config,
            salt,
            key_material,
            payload,
        },
        public_key,
        &config.key_wrap,
    )
}

/// Verify and decrypt an envelope, returning the original bytes.
///
/// Fields named in `skip_fields` are not read from the envelope; the
/// matching value from `config` is used for both the integrity check and
/// decryption.
pub fn decrypt<U: KeyUnwrap + ?Sized>(
    envelope: &Envelope,
    private_key: &U,
    skip_fields: &[ConfigField],
    config: &EnvelopeConfig,
) -> Result<Vec<u8>> {
    let (cipher_config, key_wrap_config) = resolve_fields(envelope, skip_fields, config);
    let scheme = verify_integrity(envelope, private_key, &cipher_config, &key_wrap_config)?;

    let cipher: CipherConfig = cipher_config.parse()?;
    let secrets = unwrap_secrets(envelope, private_key, &scheme)?;
    let key = derive(&secrets, &cipher)?;

    debug!(key_id = %private_key.key_id(), "opening envelope");
    symmetric::decrypt(&envelope.payload, &key, &cipher)
}

/// Re-wrap an envelope's salt and key material for `new_public_key`.
///
/// The payload and both config fields are carried over byte for byte;
/// only `salt`, `key_material` and `integrity_digest` change.
pub fn rotate_key<U: KeyUnwrap + ?Sized, W: KeyWrap + ?Sized>(
    envelope: &Envelope,
    old_private_key: &U,
    new_public_key: &W,
) -> Result<Envelope> {
    let scheme = verify_integrity(
        envelope,
        old_private_key,
        &envelope.cipher_config,
        &envelope.key_wrap_config,
    )?;
    let secrets = unwrap_secrets(envelope, old_private_key, &scheme)?;

    debug!(
        from = %old_private_key.key_id(),
        to = %new_public_key.key_id(),
        "rotating envelope key"
    );
    seal_body(
        EnvelopeBody {
            cipher_config: envelope.cipher_config.clone(),
            key_wrap_config: envelope.key_wrap_config.clone(),
            salt: wrap_block(&secrets.salt_hex, new_public_key, &scheme)?,
            key_material: wrap_block(&secrets.key_material, new_public_key, &scheme)?,
            payload: envelope.payload.clone(),
        },
        new_public_key,
        &scheme,
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Pick the stored or overriding text of each config field.
fn resolve_fields(
    envelope: &Envelope,
    skip_fields: &[ConfigField],
    config: &EnvelopeConfig,
) -> (String, String) {
    let cipher_config = if skip_fields.contains(&ConfigField::Cipher) {
        config.cipher.to_string()
    } else {
        envelope.cipher_config.clone()
    };
    let key_wrap_config = if skip_fields.contains(&ConfigField::KeyWrap) {
        config.key_wrap.to_string()
    } else {
        envelope.key_wrap_config.clone()
    };
    (cipher_config, key_wrap_config)
}

/// Check the envelope's digest against the given config texts.
///
/// Returns the parsed key wrap scheme for unwrapping the remaining fields.
fn verify_integrity<U: KeyUnwrap + ?Sized>(
    envelope: &Envelope,
    private_key: &U,
    cipher_config: &str,
    key_wrap_config: &str,
) -> Result<KeyWrapConfig> {
    // The key wrap config is covered by the digest: text that no longer
    // parses has been altered.
    let scheme: KeyWrapConfig = key_wrap_config.parse().map_err(|e| {
        debug!(error = %e, "key_wrap_config does not parse");
        EnvelopeError::Integrity
    })?;

    let unwrapped = unwrap_block(&envelope.integrity_digest, private_key, &scheme)?;
    let computed = digest::digest([
        cipher_config,
        key_wrap_config,
        envelope.salt.as_str(),
        envelope.key_material.as_str(),
        envelope.payload.as_str(),
    ]);
    digest::verify(&unwrapped, &computed)?;

    Ok(scheme)
}

fn unwrap_secrets<U: KeyUnwrap + ?Sized>(
    envelope: &Envelope,
    private_key: &U,
    scheme: &KeyWrapConfig,
) -> Result<Secrets> {
    Ok(Secrets {
        salt_hex: unwrap_block(&envelope.salt, private_key, scheme)?,
        key_material: unwrap_block(&envelope.key_material, private_key, scheme)?,
    })
}

fn fresh_secrets(cipher: &CipherConfig) -> Result<Secrets> {
    let salt = random::generate_salt(cipher.salt_len)?;
    let key_material = random::generate_key_material()?;
    Ok(Secrets {
        salt_hex: Zeroizing::new(salt.as_bytes().to_vec()),
        key_material: Zeroizing::new(key_material.as_bytes().to_vec()),
    })
}

fn try_reuse<W: KeyWrap + ?Sized>(
    previous: &PreviousEnvelope<'_>,
    public_key: &W,
    key_wrap_config: &str,
    config: &EnvelopeConfig,
) -> Result<Reused> {
    let old = previous.envelope;
    let scheme = verify_integrity(
        old,
        previous.private_key,
        &old.cipher_config,
        &old.key_wrap_config,
    )?;
    let secrets = unwrap_secrets(old, previous.private_key, &scheme)?;

    // The reused salt must fit the cipher config of the new envelope.
    symmetric::decode_salt(&secrets.salt_hex, &config.cipher)?;

    let same_wrapping = previous.private_key.key_id() == public_key.key_id()
        && old.key_wrap_config == key_wrap_config;
    let wrapped = same_wrapping.then(|| (old.salt.clone(), old.key_material.clone()));

    Ok(Reused { secrets, wrapped })
}

fn derive(secrets: &Secrets, cipher: &CipherConfig) -> Result<DerivedKey> {
    let salt = symmetric::decode_salt(&secrets.salt_hex, cipher)?;
    symmetric::derive_key(&secrets.key_material, &salt, cipher)
}

fn seal_body<W: KeyWrap + ?Sized>(
    body: EnvelopeBody,
    public_key: &W,
    scheme: &KeyWrapConfig,
) -> Result<Envelope> {
    let computed = digest::digest(body.hashed_values());
    let integrity_digest = wrap_block(computed.as_bytes(), public_key, scheme)?;
    format::seal(&body, integrity_digest)
}
