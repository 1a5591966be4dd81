//! `envelope decrypt` — verify an envelope and recover its plaintext.

use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{load_context, read_input, write_output, Cli};
use crate::crypto::load_private_key;
use crate::envelope::{self, ConfigField};
use crate::errors::{EnvelopeError, Result};

/// Execute the `decrypt` command.
pub fn execute(
    cli: &Cli,
    input: Option<&Path>,
    output_path: Option<&Path>,
    skip_fields: &[ConfigField],
) -> Result<()> {
    let ctx = load_context(cli)?;
    let private_key_path = ctx.private_key_path(cli);

    for field in skip_fields {
        tracing::debug!(field = field.name(), "using configured value instead of stored field");
    }

    let private_key = load_private_key(&private_key_path)?;

    let raw = read_input(input)?;
    let text = String::from_utf8(raw)
        .map_err(|_| EnvelopeError::Parse("envelope is not valid UTF-8".into()))?;
    let envelope = envelope::parse(&text)?;

    let plaintext = Zeroizing::new(envelope::decrypt(
        &envelope,
        &private_key,
        skip_fields,
        &ctx.config,
    )?);

    write_output(output_path, &plaintext)?;

    if let Some(path) = output_path {
        output::success(&format!(
            "Decrypted {} bytes to {}",
            plaintext.len(),
            path.display()
        ));
    }

    Ok(())
}
