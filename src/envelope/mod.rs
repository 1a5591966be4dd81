//! Envelope module — the sealed document and the operations on it.
//!
//! This module provides:
//! - The `Envelope` document, YAML codec, merge and file I/O (`format`)
//! - `encrypt`, `decrypt` and `rotate_key` (`protocol`)

pub mod format;
pub mod protocol;

// Re-export the most commonly used items.
pub use format::{inspect, parse, read_envelope, serialize, write_envelope, Envelope, EnvelopeSummary};
pub use protocol::{decrypt, encrypt, rotate_key, ConfigField, PreviousEnvelope};
