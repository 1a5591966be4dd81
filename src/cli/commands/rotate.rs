//! `envelope rotate-key` — move envelopes to a new RSA key pair.
//!
//! Every file is verified and re-wrapped in memory before any is written,
//! so one bad envelope leaves the whole batch untouched. Each file is then
//! replaced atomically.

use std::path::{Path, PathBuf};

use crate::cli::output;
use crate::cli::{load_context, warn_if_missing, Cli};
use crate::crypto::{load_private_key, load_public_key, KeyUnwrap, KeyWrap};
use crate::envelope::{self, read_envelope, write_envelope, Envelope};
use crate::errors::{EnvelopeError, Result};

/// Execute the `rotate-key` command.
pub fn execute(cli: &Cli, new_public_key: &Path, files: &[PathBuf]) -> Result<()> {
    let ctx = load_context(cli)?;
    let old_key_path = ctx.private_key_path(cli);
    warn_if_missing(new_public_key, "new public key");

    let old_private_key = load_private_key(&old_key_path)?;
    let new_public = load_public_key(new_public_key)?;

    if KeyUnwrap::key_id(&old_private_key) == KeyWrap::key_id(&new_public) {
        output::warning("the new public key belongs to the current key pair");
    }

    // 1. Rotate everything in memory.
    let mut rotated: Vec<(&PathBuf, Envelope)> = Vec::with_capacity(files.len());
    for path in files {
        let current = read_envelope(path)?;
        let next = envelope::rotate_key(&current, &old_private_key, &new_public).map_err(|e| {
            EnvelopeError::CommandFailed(format!(
                "{}: {e} (no files were changed)",
                path.display()
            ))
        })?;
        rotated.push((path, next));
    }

    // 2. Write each file back.
    for (path, next) in &rotated {
        write_envelope(path, next)?;
        output::success(&format!("Rotated {}", path.display()));
    }

    output::tip("Keep the old private key until every copy of these envelopes is rotated.");
    Ok(())
}
