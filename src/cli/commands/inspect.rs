//! `envelope inspect` — show envelope parameters without any key.

use std::path::Path;

use crate::cli::output;
use crate::envelope::{inspect, read_envelope};
use crate::errors::Result;

/// Execute the `inspect` command.
pub fn execute(file: &Path) -> Result<()> {
    let envelope = read_envelope(file)?;
    let summary = inspect(&envelope)?;
    output::print_summary(&summary);
    Ok(())
}
