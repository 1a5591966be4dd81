use thiserror::Error;

/// All errors that can occur while sealing, opening, or rotating an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    // --- Document errors ---
    #[error("Malformed envelope: {0}")]
    Parse(String),

    // --- Key errors ---
    #[error("Key error: {0}")]
    Key(String),

    // --- Crypto errors ---
    #[error("Cipher error: {0}")]
    Cipher(String),

    #[error("Integrity check failed — envelope is corrupted or was tampered with")]
    Integrity,

    #[error("Random number generator failed: {0}")]
    Randomness(String),

    // --- Config errors ---
    #[error("Config error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Convenience type alias for envelope results.
pub type Result<T> = std::result::Result<T, EnvelopeError>;
