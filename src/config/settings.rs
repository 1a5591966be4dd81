use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::EnvelopeConfig;
use crate::crypto::{CipherConfig, KeyWrapConfig};
use crate::errors::{EnvelopeError, Result};

/// Project-level configuration, loaded from `.envelope.toml`.
///
/// Every field has a sensible default so the tool works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Payload cipher: aes-128-cbc, aes-192-cbc or aes-256-cbc.
    #[serde(default = "default_cipher")]
    pub cipher: String,

    /// PBKDF2 iteration count (default: 600 000).
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Salt length in bytes (default: 16).
    #[serde(default = "default_salt_len")]
    pub salt_len: usize,

    /// Digest used for OAEP and MGF1: sha1 or sha256.
    #[serde(default = "default_oaep_digest")]
    pub oaep_digest: String,

    /// Public key used to seal envelopes.
    #[serde(default = "default_public_key")]
    pub public_key: PathBuf,

    /// Private key used to open envelopes.
    #[serde(default = "default_private_key")]
    pub private_key: PathBuf,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_cipher() -> String {
    "aes-256-cbc".to_string()
}

fn default_pbkdf2_iterations() -> u32 {
    600_000
}

fn default_salt_len() -> usize {
    16
}

fn default_oaep_digest() -> String {
    "sha256".to_string()
}

fn default_public_key() -> PathBuf {
    PathBuf::from("public.pem")
}

fn default_private_key() -> PathBuf {
    PathBuf::from("private.pem")
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            cipher: default_cipher(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
            salt_len: default_salt_len(),
            oaep_digest: default_oaep_digest(),
            public_key: default_public_key(),
            private_key: default_private_key(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".envelope.toml";

    /// Load settings from `<project_dir>/.envelope.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            EnvelopeError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Convert the cipher settings into an `EnvelopeConfig`.
    pub fn envelope_config(&self) -> Result<EnvelopeConfig> {
        let cipher = CipherConfig {
            algorithm: self.cipher.parse()?,
            iterations: self.pbkdf2_iterations,
            salt_len: self.salt_len,
        };
        cipher.validate()?;

        Ok(EnvelopeConfig {
            cipher,
            key_wrap: KeyWrapConfig::with_digest(self.oaep_digest.parse()?),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────
