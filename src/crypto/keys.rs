//! Loading and generating the RSA key pairs that protect envelopes.
//!
//! Keys are PEM files in either PKCS#8 / SPKI form (`PRIVATE KEY`,
//! `PUBLIC KEY`) or legacy PKCS#1 form (`RSA PRIVATE KEY`,
//! `RSA PUBLIC KEY`). Moduli under 2048 bits are refused.

use std::fs;
use std::path::{Path, PathBuf};

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::errors::{EnvelopeError, Result};

/// Smallest modulus accepted for wrapping, in bits.
pub const MIN_KEY_BITS: usize = 2048;

/// Key sizes offered by `generate_key_pair`.
pub const SUPPORTED_KEY_BITS: [usize; 3] = [2048, 3072, 4096];

/// Load an RSA public key from a PEM file.
pub fn load_public_key(path: &Path) -> Result<RsaPublicKey> {
    let pem = read_key_file(path, "public")?;
    parse_public_key(&pem).map_err(|e| with_path(e, path))
}

/// Load an RSA private key from a PEM file.
pub fn load_private_key(path: &Path) -> Result<RsaPrivateKey> {
    let pem = read_key_file(path, "private")?;
    parse_private_key(&pem).map_err(|e| with_path(e, path))
}

/// Parse a PEM-encoded RSA public key (SPKI or PKCS#1).
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey> {
    let key = RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|_| EnvelopeError::Key("not a PEM-encoded RSA public key".into()))?;
    check_key_size(&key)?;
    Ok(key)
}

/// Parse a PEM-encoded RSA private key (PKCS#8 or PKCS#1).
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey> {
    let key = RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|_| EnvelopeError::Key("not a PEM-encoded RSA private key".into()))?;
    check_key_size(&key)?;
    Ok(key)
}

fn read_key_file(path: &Path, kind: &str) -> Result<Zeroizing<String>> {
    if !path.exists() {
        return Err(EnvelopeError::Key(format!(
            "{kind} key not found at {}",
            path.display()
        )));
    }

    fs::read_to_string(path).map(Zeroizing::new).map_err(|e| {
        EnvelopeError::Key(format!("failed to read {kind} key {}: {e}", path.display()))
    })
}

fn with_path(err: EnvelopeError, path: &Path) -> EnvelopeError {
    match err {
        EnvelopeError::Key(msg) => EnvelopeError::Key(format!("{}: {msg}", path.display())),
        other => other,
    }
}

fn check_key_size(key: &impl PublicKeyParts) -> Result<()> {
    let bits = key.n().bits();
    if bits < MIN_KEY_BITS {
        return Err(EnvelopeError::Key(format!(
            "RSA key is {bits} bits; at least {MIN_KEY_BITS} are required"
        )));
    }
    Ok(())
}

/// Generate a new RSA key pair of `bits` bits.
pub fn generate_key_pair(bits: usize) -> Result<(RsaPrivateKey, RsaPublicKey)> {
    if !SUPPORTED_KEY_BITS.contains(&bits) {
        return Err(EnvelopeError::Key(format!(
            "unsupported key size {bits} (expected 2048, 3072 or 4096)"
        )));
    }

    let private = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| EnvelopeError::Key(format!("key generation failed: {e}")))?;
    let public = RsaPublicKey::from(&private);
    Ok((private, public))
}

/// Paths of a key pair written by `write_key_pair`.
#[derive(Debug, Clone)]
pub struct KeyPairPaths {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
}

/// Generate a key pair and write it as `<name>.pem` / `<name>.pub.pem` in `dir`.
///
/// Refuses to overwrite existing files. On Unix the private key is
/// written owner-only (0600).
pub fn write_key_pair(dir: &Path, name: &str, bits: usize) -> Result<KeyPairPaths> {
    let paths = KeyPairPaths {
        private_key: dir.join(format!("{name}.pem")),
        public_key: dir.join(format!("{name}.pub.pem")),
    };
    for path in [&paths.private_key, &paths.public_key] {
        if path.exists() {
            return Err(EnvelopeError::Key(format!(
                "refusing to overwrite existing key at {}",
                path.display()
            )));
        }
    }

    let (private, public) = generate_key_pair(bits)?;
    let private_pem = private
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| EnvelopeError::Key(format!("failed to encode private key: {e}")))?;
    let public_pem = public
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| EnvelopeError::Key(format!("failed to encode public key: {e}")))?;

    fs::create_dir_all(dir)?;
    fs::write(&paths.private_key, private_pem.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(&paths.private_key, perms).map_err(|e| {
            EnvelopeError::Key(format!("failed to set private key permissions: {e}"))
        })?;
    }

    fs::write(&paths.public_key, public_pem)?;

    Ok(paths)
}
