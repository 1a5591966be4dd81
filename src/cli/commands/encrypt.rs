//! `envelope encrypt` — seal plaintext into a new envelope.
//!
//! With `--update`, the envelope already at `--output` is opened with the
//! private key first so the new version keeps its salt and key material.

use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{load_context, read_input, Cli};
use crate::crypto::{load_private_key, load_public_key};
use crate::envelope::{self, read_envelope, serialize, write_envelope, PreviousEnvelope};
use crate::errors::Result;

/// Execute the `encrypt` command.
pub fn execute(
    cli: &Cli,
    input: Option<&Path>,
    output_path: Option<&Path>,
    update: bool,
) -> Result<()> {
    let ctx = load_context(cli)?;
    let public_key_path = ctx.public_key_path(cli);

    // Load the previous version before reading stdin, so key errors
    // surface without consuming input.
    let previous = match output_path {
        Some(path) if update && path.exists() => {
            let private_key = load_private_key(&ctx.private_key_path(cli))?;
            Some((read_envelope(path)?, private_key))
        }
        Some(path) if update => {
            output::warning(&format!(
                "{} does not exist yet; creating a new envelope",
                path.display()
            ));
            None
        }
        _ => None,
    };

    let public_key = load_public_key(&public_key_path)?;
    let plaintext = Zeroizing::new(read_input(input)?);

    let envelope = envelope::encrypt(
        &plaintext,
        &public_key,
        previous.as_ref().map(|(envelope, private_key)| PreviousEnvelope {
            envelope,
            private_key,
        }),
        &ctx.config,
    )?;

    match output_path {
        Some(path) => {
            write_envelope(path, &envelope)?;
            let verb = if previous.is_some() { "Updated" } else { "Encrypted" };
            output::success(&format!(
                "{verb} {} ({} bytes of plaintext)",
                path.display(),
                plaintext.len()
            ));
        }
        None => print!("{}", serialize(&envelope)?),
    }

    Ok(())
}
