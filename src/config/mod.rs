//! Configuration: the `.envelope.toml` settings file and the explicit
//! `EnvelopeConfig` handed to every protocol operation.

pub mod settings;

pub use settings::Settings;

use crate::crypto::{CipherConfig, KeyWrapConfig};

/// Cipher parameters for new envelopes and for field overrides.
///
/// `cipher` and `key_wrap` are written into every envelope this config
/// seals, and replace the stored values of any field a decrypt call
/// skips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvelopeConfig {
    pub cipher: CipherConfig,
    pub key_wrap: KeyWrapConfig,
}
