//! `envelope keygen` — generate an RSA key pair for sealing envelopes.

use std::path::Path;

use crate::cli::output;
use crate::crypto::keys::{write_key_pair, SUPPORTED_KEY_BITS};
use crate::errors::{EnvelopeError, Result};

/// Execute the `keygen` command.
pub fn execute(bits: usize, out_dir: &Path, name: &str) -> Result<()> {
    if !SUPPORTED_KEY_BITS.contains(&bits) {
        return Err(EnvelopeError::CommandFailed(format!(
            "unsupported key size {bits}; choose 2048, 3072 or 4096"
        )));
    }
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(EnvelopeError::CommandFailed(format!(
            "invalid key name '{name}'"
        )));
    }

    output::info(&format!("Generating a {bits}-bit RSA key pair..."));
    let paths = write_key_pair(out_dir, name, bits)?;

    output::success(&format!("Private key: {}", paths.private_key.display()));
    output::success(&format!("Public key:  {}", paths.public_key.display()));
    output::tip("Share the public key with anyone who seals envelopes for you.");
    output::tip("Never commit the private key.");

    Ok(())
}
